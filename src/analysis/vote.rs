//! Plurality voting with a stable tie-break
//!
//! Keys keep the order in which they first entered the tally. When several
//! keys share the maximum count the earliest one wins, so seeding a tally
//! with an enumeration order makes that order the tie-break.

/// Insertion-ordered vote counter
#[derive(Debug, Clone)]
pub struct Tally<T> {
    entries: Vec<(T, usize)>,
}

impl<T: Copy + PartialEq> Tally<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Tally whose tie-break order is fixed up front
    pub fn seeded(order: impl IntoIterator<Item = T>) -> Self {
        Self {
            entries: order.into_iter().map(|key| (key, 0)).collect(),
        }
    }

    pub fn add(&mut self, key: T) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key, 1)),
        }
    }

    pub fn count(&self, key: T) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Key with the highest count and that count. `None` when nothing was voted.
    pub fn winner(&self) -> Option<(T, usize)> {
        let mut best: Option<(T, usize)> = None;
        for &(key, count) in &self.entries {
            if count == 0 {
                continue;
            }
            match best {
                Some((_, top)) if count <= top => {}
                _ => best = Some((key, count)),
            }
        }
        best
    }
}

impl<T: Copy + PartialEq> Default for Tally<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + PartialEq> FromIterator<T> for Tally<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

impl<T: Copy + PartialEq> Extend<T> for Tally<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for key in iter {
            self.add(key);
        }
    }
}
