//! Independent prediction heuristics
//!
//! Each heuristic looks at the recent tail of the log and may propose one
//! candidate. The calibration constants below are fixed per heuristic.

use crate::types::{sequence_text, CandidatePrediction, Color, EntryDelay, HeuristicKind, Pattern};

/// Colors most heuristics look at
pub const RECENT_WINDOW: usize = 15;

/// Last `n` items of a slice (all of it when shorter)
pub fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Snapshot a heuristic evaluates against
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    /// Full color history, oldest first
    pub history: &'a [Color],
    /// Patterns mined from the same history
    pub patterns: &'a [Pattern],
}

impl<'a> AnalysisContext<'a> {
    pub fn new(history: &'a [Color], patterns: &'a [Pattern]) -> Self {
        Self { history, patterns }
    }

    pub fn recent(&self) -> &'a [Color] {
        tail(self.history, RECENT_WINDOW)
    }
}

/// A single prediction rule
pub trait Heuristic: Send + Sync {
    fn kind(&self) -> HeuristicKind;

    /// Propose a candidate, or abstain
    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<CandidatePrediction>;
}

fn candidate(
    kind: HeuristicKind,
    color: Color,
    confidence: f64,
    entry_delay: EntryDelay,
    reason: String,
) -> CandidatePrediction {
    CandidatePrediction {
        color,
        confidence,
        source: kind,
        reason,
        entry_delay,
    }
}

/// Match the tail against mined patterns, longest prefix first
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSequence;

impl PatternSequence {
    const MAX_PREFIX: usize = 5;
    const MIN_PREFIX: usize = 3;
    const MIN_ACCURACY: f64 = 70.0;
}

impl Heuristic for PatternSequence {
    fn kind(&self) -> HeuristicKind {
        HeuristicKind::PatternSequence
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<CandidatePrediction> {
        let recent = ctx.recent();

        for len in (Self::MIN_PREFIX..=Self::MAX_PREFIX).rev() {
            if recent.len() < len {
                continue;
            }
            let suffix = tail(recent, len);

            // patterns are ordered by accuracy, so the first hit is the best one
            let Some(pattern) = ctx
                .patterns
                .iter()
                .find(|p| p.sequence.as_slice() == suffix && p.accuracy > Self::MIN_ACCURACY)
            else {
                continue;
            };

            let entry_delay = if pattern.accuracy > 85.0 {
                EntryDelay::Immediate
            } else if pattern.accuracy > 75.0 {
                EntryDelay::WaitOne
            } else {
                EntryDelay::WaitTwo
            };

            return Some(candidate(
                self.kind(),
                pattern.next,
                pattern.accuracy,
                entry_delay,
                format!(
                    "Pattern {} seen {} times, followed by {} {:.1}% of the time",
                    pattern.text(),
                    pattern.occurrences,
                    pattern.next,
                    pattern.accuracy
                ),
            ));
        }

        None
    }
}

/// Predict a color missing from the last ten rounds
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyGap;

impl FrequencyGap {
    const WINDOW: usize = 10;
    const MIN_SAMPLES: usize = 8;
    const CONFIDENCE: f64 = 78.0;
}

impl Heuristic for FrequencyGap {
    fn kind(&self) -> HeuristicKind {
        HeuristicKind::FrequencyGap
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<CandidatePrediction> {
        let window = tail(ctx.recent(), Self::WINDOW);
        if window.len() < Self::MIN_SAMPLES {
            return None;
        }

        // a monochrome window leaves two colors absent; the first in ALL order wins
        let absent = Color::ALL
            .into_iter()
            .find(|color| !window.contains(color))?;

        Some(candidate(
            self.kind(),
            absent,
            Self::CONFIDENCE,
            EntryDelay::Immediate,
            format!("{} has not appeared in the last {} rounds", absent, window.len()),
        ))
    }
}

/// Bet against a long run of red or black
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakReversal;

impl StreakReversal {
    const MIN_RUN: usize = 4;
}

impl Heuristic for StreakReversal {
    fn kind(&self) -> HeuristicKind {
        HeuristicKind::StreakReversal
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<CandidatePrediction> {
        let recent = ctx.recent();
        let last = *recent.last()?;
        // white runs never reverse into anything
        let reversal = last.opposite()?;

        let run = recent.iter().rev().take_while(|&&c| c == last).count();
        if run < Self::MIN_RUN {
            return None;
        }

        let confidence = (65 + 4 * run).min(88) as f64;
        let entry_delay = if run >= 6 {
            EntryDelay::Immediate
        } else {
            EntryDelay::WaitOne
        };

        Some(candidate(
            self.kind(),
            reversal,
            confidence,
            entry_delay,
            format!("{} streak of {} rounds, expecting {}", last, run, reversal),
        ))
    }
}

/// Predict white after a long drought
///
/// Unlike the other rules this one looks at the whole log, since the
/// drought threshold is longer than the recent window.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteGap;

impl WhiteGap {
    const MIN_GAP: usize = 40;
}

impl Heuristic for WhiteGap {
    fn kind(&self) -> HeuristicKind {
        HeuristicKind::WhiteGap
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<CandidatePrediction> {
        let gap = ctx
            .history
            .iter()
            .rev()
            .position(|c| c.is_rare())
            .unwrap_or(ctx.history.len());

        if gap < Self::MIN_GAP {
            return None;
        }

        let confidence = (60 + 2 * (gap - Self::MIN_GAP)).min(85) as f64;
        let entry_delay = if gap >= 60 {
            EntryDelay::Immediate
        } else {
            EntryDelay::WaitOne
        };

        Some(candidate(
            self.kind(),
            Color::White,
            confidence,
            entry_delay,
            format!("No white for {} rounds", gap),
        ))
    }
}

/// Continue a strictly alternating tail
#[derive(Debug, Clone, Copy, Default)]
pub struct Alternating;

impl Alternating {
    const WINDOW: usize = 6;
    const MIN_SAMPLES: usize = 4;
    const CONFIDENCE: f64 = 72.0;
}

impl Heuristic for Alternating {
    fn kind(&self) -> HeuristicKind {
        HeuristicKind::Alternating
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<CandidatePrediction> {
        let window = tail(ctx.recent(), Self::WINDOW);
        if window.len() < Self::MIN_SAMPLES {
            return None;
        }

        if !window.windows(2).all(|pair| pair[0] != pair[1]) {
            return None;
        }

        let next = window[window.len() - 2];

        Some(candidate(
            self.kind(),
            next,
            Self::CONFIDENCE,
            EntryDelay::Immediate,
            format!(
                "Alternation {} over {} rounds continues with {}",
                sequence_text(window),
                window.len(),
                next
            ),
        ))
    }
}

/// The ordered set of heuristics run on every pass
pub struct HeuristicSet {
    heuristics: Vec<Box<dyn Heuristic>>,
}

impl HeuristicSet {
    pub fn new() -> Self {
        Self { heuristics: Vec::new() }
    }

    /// All five built-in rules
    pub fn standard() -> Self {
        let mut set = Self::new();
        set.add(Box::new(PatternSequence));
        set.add(Box::new(FrequencyGap));
        set.add(Box::new(StreakReversal));
        set.add(Box::new(WhiteGap));
        set.add(Box::new(Alternating));
        set
    }

    pub fn add(&mut self, heuristic: Box<dyn Heuristic>) {
        self.heuristics.push(heuristic);
    }

    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }

    /// Run every heuristic and rank the candidates by confidence, highest first
    pub fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Vec<CandidatePrediction> {
        let mut candidates: Vec<CandidatePrediction> = self
            .heuristics
            .iter()
            .filter_map(|h| {
                let candidate = h.evaluate(ctx);
                if let Some(c) = &candidate {
                    tracing::debug!(
                        "{} -> {} @ {:.1} ({})",
                        h.kind(),
                        c.color,
                        c.confidence,
                        c.reason
                    );
                }
                candidate
            })
            .collect();

        // stable: equal confidence keeps evaluation order
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        candidates
    }
}

impl Default for HeuristicSet {
    fn default() -> Self {
        Self::standard()
    }
}
