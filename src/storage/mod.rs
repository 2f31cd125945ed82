//! Data storage and persistence

pub mod memory;


pub use memory::MemoryStore;

use crate::error::{PredictorError, Result};
use crate::types::{Color, EntryDelay, HeuristicKind, Outcome, Pattern, RunningStats, Settlement};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Persistence collaborator of the engine
#[async_trait]
pub trait OutcomeStore: Send + Sync {
    /// Outcome log, oldest first
    async fn load_outcomes(&self) -> Result<Vec<Outcome>>;

    /// Upsert outcomes by id (new rounds are appended, tags are updated)
    async fn save_outcomes(&self, outcomes: &[Outcome]) -> Result<()>;

    async fn load_patterns(&self) -> Result<Vec<Pattern>>;

    /// Replace the stored pattern set
    async fn save_patterns(&self, patterns: &[Pattern]) -> Result<()>;

    async fn load_stats(&self) -> Result<Option<RunningStats>>;

    async fn save_stats(&self, stats: &RunningStats) -> Result<()>;

    async fn append_settlement(&self, settlement: &Settlement) -> Result<()>;

    /// Settlements, oldest first
    async fn load_settlements(&self) -> Result<Vec<Settlement>>;
}

/// SQLite-backed store
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite database (creates if not exists)
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path.as_ref().display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Private in-memory database (single connection so every query sees it)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outcomes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                color TEXT NOT NULL,
                roll INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                was_scored INTEGER,
                was_correct INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patterns (
                rank INTEGER PRIMARY KEY,
                sequence TEXT NOT NULL,
                occurrences INTEGER NOT NULL,
                accuracy REAL NOT NULL,
                next_color TEXT NOT NULL,
                last_seen TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total INTEGER NOT NULL,
                correct INTEGER NOT NULL,
                accuracy REAL NOT NULL,
                greens INTEGER NOT NULL,
                reds INTEGER NOT NULL,
                streak INTEGER NOT NULL,
                best_streak INTEGER NOT NULL,
                profit TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settlements (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                outcome_id TEXT NOT NULL,
                predicted TEXT NOT NULL,
                actual TEXT NOT NULL,
                confidence REAL NOT NULL,
                source TEXT,
                correct INTEGER NOT NULL,
                wait_rounds INTEGER NOT NULL,
                settled_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl OutcomeStore for Database {
    async fn load_outcomes(&self) -> Result<Vec<Outcome>> {
        let rows = sqlx::query_as::<_, OutcomeRow>(
            r#"
            SELECT id, color, roll, timestamp, was_scored, was_correct
            FROM outcomes
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Outcome::try_from).collect()
    }

    async fn save_outcomes(&self, outcomes: &[Outcome]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for outcome in outcomes {
            sqlx::query(
                r#"
                INSERT INTO outcomes (id, color, roll, timestamp, was_scored, was_correct)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    was_scored = excluded.was_scored,
                    was_correct = excluded.was_correct
                "#,
            )
            .bind(&outcome.id)
            .bind(outcome.color.to_string())
            .bind(i64::from(outcome.roll))
            .bind(outcome.timestamp.to_rfc3339())
            .bind(outcome.was_scored)
            .bind(outcome.was_correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_patterns(&self) -> Result<Vec<Pattern>> {
        let rows = sqlx::query_as::<_, PatternRow>(
            r#"
            SELECT sequence, occurrences, accuracy, next_color, last_seen
            FROM patterns
            ORDER BY rank ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Pattern::try_from).collect()
    }

    async fn save_patterns(&self, patterns: &[Pattern]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM patterns").execute(&mut *tx).await?;

        for (rank, pattern) in patterns.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO patterns (rank, sequence, occurrences, accuracy, next_color, last_seen)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(rank as i64)
            .bind(serde_json::to_string(&pattern.sequence)?)
            .bind(pattern.occurrences as i64)
            .bind(pattern.accuracy)
            .bind(pattern.next.to_string())
            .bind(pattern.last_seen.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_stats(&self) -> Result<Option<RunningStats>> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT total, correct, accuracy, greens, reds, streak, best_streak, profit
            FROM stats
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(RunningStats::try_from).transpose()
    }

    async fn save_stats(&self, stats: &RunningStats) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO stats
            (id, total, correct, accuracy, greens, reds, streak, best_streak, profit)
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(stats.total as i64)
        .bind(stats.correct as i64)
        .bind(stats.accuracy)
        .bind(stats.greens as i64)
        .bind(stats.reds as i64)
        .bind(stats.streak as i64)
        .bind(stats.best_streak as i64)
        .bind(stats.profit.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_settlement(&self, settlement: &Settlement) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settlements
            (outcome_id, predicted, actual, confidence, source, correct, wait_rounds, settled_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&settlement.outcome_id)
        .bind(settlement.predicted.to_string())
        .bind(settlement.actual.to_string())
        .bind(settlement.confidence)
        .bind(settlement.source.map(|s| s.as_str()))
        .bind(settlement.correct)
        .bind(i64::from(settlement.entry_delay.rounds()))
        .bind(settlement.settled_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_settlements(&self) -> Result<Vec<Settlement>> {
        let rows = sqlx::query_as::<_, SettlementRow>(
            r#"
            SELECT outcome_id, predicted, actual, confidence, source, correct, wait_rounds, settled_at
            FROM settlements
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Settlement::try_from).collect()
    }
}

fn parse_color(value: &str) -> Result<Color> {
    value.parse().map_err(PredictorError::Storage)
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PredictorError::Storage(format!("bad timestamp '{}': {}", value, e)))
}

fn to_u64(value: i64, column: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| PredictorError::Storage(format!("negative {}: {}", column, value)))
}

#[derive(Debug, sqlx::FromRow)]
struct OutcomeRow {
    id: String,
    color: String,
    roll: i64,
    timestamp: String,
    was_scored: Option<bool>,
    was_correct: Option<bool>,
}

impl TryFrom<OutcomeRow> for Outcome {
    type Error = PredictorError;

    fn try_from(row: OutcomeRow) -> Result<Self> {
        let roll = u8::try_from(row.roll)
            .map_err(|_| PredictorError::Storage(format!("bad roll {} for {}", row.roll, row.id)))?;

        Ok(Outcome {
            color: parse_color(&row.color)?,
            roll,
            timestamp: parse_time(&row.timestamp)?,
            was_scored: row.was_scored,
            was_correct: row.was_correct,
            id: row.id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PatternRow {
    sequence: String,
    occurrences: i64,
    accuracy: f64,
    next_color: String,
    last_seen: String,
}

impl TryFrom<PatternRow> for Pattern {
    type Error = PredictorError;

    fn try_from(row: PatternRow) -> Result<Self> {
        Ok(Pattern {
            sequence: serde_json::from_str(&row.sequence)?,
            occurrences: to_u64(row.occurrences, "occurrences")? as usize,
            accuracy: row.accuracy,
            next: parse_color(&row.next_color)?,
            last_seen: parse_time(&row.last_seen)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total: i64,
    correct: i64,
    accuracy: f64,
    greens: i64,
    reds: i64,
    streak: i64,
    best_streak: i64,
    profit: String,
}

impl TryFrom<StatsRow> for RunningStats {
    type Error = PredictorError;

    fn try_from(row: StatsRow) -> Result<Self> {
        Ok(RunningStats {
            total: to_u64(row.total, "total")?,
            correct: to_u64(row.correct, "correct")?,
            accuracy: row.accuracy,
            greens: to_u64(row.greens, "greens")?,
            reds: to_u64(row.reds, "reds")?,
            streak: to_u64(row.streak, "streak")?,
            best_streak: to_u64(row.best_streak, "best_streak")?,
            profit: row
                .profit
                .parse()
                .map_err(|e| PredictorError::Storage(format!("bad profit '{}': {}", row.profit, e)))?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettlementRow {
    outcome_id: String,
    predicted: String,
    actual: String,
    confidence: f64,
    source: Option<String>,
    correct: bool,
    wait_rounds: i64,
    settled_at: String,
}

impl TryFrom<SettlementRow> for Settlement {
    type Error = PredictorError;

    fn try_from(row: SettlementRow) -> Result<Self> {
        let entry_delay = u8::try_from(row.wait_rounds)
            .ok()
            .and_then(EntryDelay::from_rounds)
            .ok_or_else(|| PredictorError::Storage(format!("bad wait_rounds {}", row.wait_rounds)))?;

        Ok(Settlement {
            predicted: parse_color(&row.predicted)?,
            actual: parse_color(&row.actual)?,
            confidence: row.confidence,
            source: row.source.as_deref().and_then(HeuristicKind::parse),
            correct: row.correct,
            entry_delay,
            settled_at: parse_time(&row.settled_at)?,
            outcome_id: row.outcome_id,
        })
    }
}
