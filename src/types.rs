//! Core data types shared across the engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Color of a single round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    /// The rare color (~2% of rounds), always rolled as 0
    White,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Red, Color::Black, Color::White];

    pub fn is_rare(self) -> bool {
        self == Color::White
    }

    /// The other even-odds color. White has no opposite.
    pub fn opposite(self) -> Option<Color> {
        match self {
            Color::Red => Some(Color::Black),
            Color::Black => Some(Color::Red),
            Color::White => None,
        }
    }

    /// Color implied by a roll value (0 = white, 1..=7 red, 8..=14 black)
    pub fn from_roll(roll: u8) -> Option<Color> {
        match roll {
            0 => Some(Color::White),
            1..=7 => Some(Color::Red),
            8..=14 => Some(Color::Black),
            _ => None,
        }
    }

    /// Numeric code used by the upstream feed
    pub fn code(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Red => 1,
            Color::Black => 2,
        }
    }

    pub fn from_code(code: u64) -> Option<Color> {
        match code {
            0 => Some(Color::White),
            1 => Some(Color::Red),
            2 => Some(Color::Black),
            _ => None,
        }
    }

    /// Single-letter form used in pattern text
    pub fn symbol(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Black => 'B',
            Color::White => 'W',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" | "r" => Ok(Color::Red),
            "black" | "b" => Ok(Color::Black),
            "white" | "w" => Ok(Color::White),
            other => Err(format!("unknown color '{}'", other)),
        }
    }
}

/// Render a color sequence as compact text, e.g. `R-B-R`
pub fn sequence_text(colors: &[Color]) -> String {
    colors
        .iter()
        .map(|c| c.symbol().to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// One observed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub color: Color,
    pub roll: u8,
    pub timestamp: DateTime<Utc>,
    /// Set when a bet signal was settled against this round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_scored: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_correct: Option<bool>,
}

impl Outcome {
    pub fn new(id: impl Into<String>, color: Color, roll: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            color,
            roll,
            timestamp,
            was_scored: None,
            was_correct: None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.was_scored == Some(true)
    }
}

/// A mined recurring color sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub sequence: Vec<Color>,
    pub occurrences: usize,
    /// Share of occurrences followed by `next`, 0-100
    pub accuracy: f64,
    pub next: Color,
    pub last_seen: DateTime<Utc>,
}

impl Pattern {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn text(&self) -> String {
        sequence_text(&self.sequence)
    }
}

/// How many rounds to skip before acting on a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDelay {
    Immediate,
    WaitOne,
    WaitTwo,
}

impl EntryDelay {
    /// Enumeration order, also the tie-break order for delay votes
    pub const ALL: [EntryDelay; 3] = [EntryDelay::Immediate, EntryDelay::WaitOne, EntryDelay::WaitTwo];

    pub fn rounds(self) -> u8 {
        match self {
            EntryDelay::Immediate => 0,
            EntryDelay::WaitOne => 1,
            EntryDelay::WaitTwo => 2,
        }
    }

    pub fn from_rounds(rounds: u8) -> Option<Self> {
        match rounds {
            0 => Some(EntryDelay::Immediate),
            1 => Some(EntryDelay::WaitOne),
            2 => Some(EntryDelay::WaitTwo),
            _ => None,
        }
    }
}

impl fmt::Display for EntryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDelay::Immediate => write!(f, "immediate"),
            EntryDelay::WaitOne => write!(f, "wait 1 round"),
            EntryDelay::WaitTwo => write!(f, "wait 2 rounds"),
        }
    }
}

/// Which heuristic produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    PatternSequence,
    FrequencyGap,
    StreakReversal,
    WhiteGap,
    Alternating,
}

impl HeuristicKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HeuristicKind::PatternSequence => "pattern_sequence",
            HeuristicKind::FrequencyGap => "frequency_gap",
            HeuristicKind::StreakReversal => "streak_reversal",
            HeuristicKind::WhiteGap => "white_gap",
            HeuristicKind::Alternating => "alternating",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pattern_sequence" => Some(HeuristicKind::PatternSequence),
            "frequency_gap" => Some(HeuristicKind::FrequencyGap),
            "streak_reversal" => Some(HeuristicKind::StreakReversal),
            "white_gap" => Some(HeuristicKind::WhiteGap),
            "alternating" => Some(HeuristicKind::Alternating),
            _ => None,
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeuristicKind::PatternSequence => "Pattern Sequence",
            HeuristicKind::FrequencyGap => "Frequency Gap",
            HeuristicKind::StreakReversal => "Streak Reversal",
            HeuristicKind::WhiteGap => "White Gap",
            HeuristicKind::Alternating => "Alternating Pattern",
        };
        write!(f, "{}", name)
    }
}

/// One heuristic's proposal for the next round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePrediction {
    pub color: Color,
    /// 0-100
    pub confidence: f64,
    pub source: HeuristicKind,
    pub reason: String,
    pub entry_delay: EntryDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    Bet,
    Wait,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Bet => write!(f, "BET"),
            SignalAction::Wait => write!(f, "WAIT"),
        }
    }
}

/// Strategy label attached to a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrategy {
    InsufficientData,
    HighConfidence,
    MediumConfidence,
    LowConfidence,
}

impl fmt::Display for SignalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalStrategy::InsufficientData => "Insufficient Data",
            SignalStrategy::HighConfidence => "High Confidence",
            SignalStrategy::MediumConfidence => "Medium Confidence",
            SignalStrategy::LowConfidence => "Low Confidence",
        };
        write!(f, "{}", label)
    }
}

/// The aggregated decision of one analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    /// Present only when `action` is `Bet`
    pub color: Option<Color>,
    pub confidence: f64,
    pub strategy: SignalStrategy,
    pub reason: String,
    pub entry_delay: EntryDelay,
    pub wait_rounds: u8,
    /// Heuristic behind the top candidate
    pub source: Option<HeuristicKind>,
    /// Number of candidates agreeing with the target color
    pub consensus: usize,
}

impl Signal {
    pub fn insufficient_data() -> Self {
        Self {
            action: SignalAction::Wait,
            color: None,
            confidence: 0.0,
            strategy: SignalStrategy::InsufficientData,
            reason: "Not enough history for any heuristic".to_string(),
            entry_delay: EntryDelay::Immediate,
            wait_rounds: 0,
            source: None,
            consensus: 0,
        }
    }

    /// Color to bet on, if this signal is actionable
    pub fn bet_color(&self) -> Option<Color> {
        match self.action {
            SignalAction::Bet => self.color,
            SignalAction::Wait => None,
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::insufficient_data()
    }
}

/// A past signal reconciled against the round that followed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub outcome_id: String,
    pub predicted: Color,
    pub actual: Color,
    pub confidence: f64,
    pub source: Option<HeuristicKind>,
    pub correct: bool,
    pub entry_delay: EntryDelay,
    pub settled_at: DateTime<Utc>,
}

/// Cumulative scoring counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    pub total: u64,
    pub correct: u64,
    /// correct / total * 100
    pub accuracy: f64,
    pub greens: u64,
    pub reds: u64,
    pub streak: u64,
    pub best_streak: u64,
    pub profit: Decimal,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            total: 0,
            correct: 0,
            accuracy: 0.0,
            greens: 0,
            reds: 0,
            streak: 0,
            best_streak: 0,
            profit: Decimal::ZERO,
        }
    }
}
