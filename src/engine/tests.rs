//! Tests for engine module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::data::Anomaly;
    use crate::storage::MemoryStore;
    use crate::testing::OutcomeGenerator;
    use crate::types::{Color, HeuristicKind, SignalAction, SignalStrategy};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    /// Store whose every call fails
    struct FailingStore;

    fn unavailable<T>() -> Result<T> {
        Err(PredictorError::Storage("disk on fire".to_string()))
    }

    #[async_trait]
    impl OutcomeStore for FailingStore {
        async fn load_outcomes(&self) -> Result<Vec<Outcome>> {
            unavailable()
        }
        async fn save_outcomes(&self, _: &[Outcome]) -> Result<()> {
            unavailable()
        }
        async fn load_patterns(&self) -> Result<Vec<Pattern>> {
            unavailable()
        }
        async fn save_patterns(&self, _: &[Pattern]) -> Result<()> {
            unavailable()
        }
        async fn load_stats(&self) -> Result<Option<RunningStats>> {
            unavailable()
        }
        async fn save_stats(&self, _: &RunningStats) -> Result<()> {
            unavailable()
        }
        async fn append_settlement(&self, _: &Settlement) -> Result<()> {
            unavailable()
        }
        async fn load_settlements(&self) -> Result<Vec<Settlement>> {
            unavailable()
        }
    }

    fn engine_with(store: Arc<dyn OutcomeStore>) -> Engine {
        Engine::new(&Config::default(), store)
    }

    /// Engine whose log ends in a six-round red streak, analyzed
    async fn primed(store: Arc<dyn OutcomeStore>, gen: &mut OutcomeGenerator) -> Engine {
        let mut engine = engine_with(store);
        for raw in gen.raw_from_text("RRRRRR") {
            engine.record(raw).await.unwrap();
        }
        engine.analyze().await;
        engine
    }

    #[tokio::test]
    async fn test_new_engine_waits() {
        let engine = engine_with(Arc::new(MemoryStore::new()));
        assert!(engine.history().is_empty());
        assert_eq!(engine.signal().strategy, SignalStrategy::InsufficientData);
        assert_eq!(engine.stats().total, 0);
    }

    #[tokio::test]
    async fn test_unscored_when_no_prior_bet() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());
        let mut gen = OutcomeGenerator::new();

        let recorded = engine.record(gen.raw(Color::Red)).await.unwrap();

        assert!(recorded.settlement.is_none());
        assert!(recorded.outcome.was_scored.is_none());
        assert_eq!(engine.history().len(), 1);
        assert_eq!(store.outcome_count(), 1);
        assert!(store.load_stats().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_streak_signal_is_scored_by_next_round() {
        let store = Arc::new(MemoryStore::new());
        let mut gen = OutcomeGenerator::new();
        let mut engine = primed(store.clone(), &mut gen).await;

        let signal = engine.signal().clone();
        assert_eq!(signal.action, SignalAction::Bet);
        assert_eq!(signal.color, Some(Color::Black));
        assert_eq!(signal.confidence, 88.0);
        assert_eq!(signal.source, Some(HeuristicKind::StreakReversal));

        let recorded = engine.record(gen.raw(Color::Black)).await.unwrap();
        let settlement = recorded.settlement.unwrap();
        assert!(settlement.correct);
        assert_eq!(settlement.predicted, Color::Black);
        assert_eq!(recorded.outcome.was_correct, Some(true));
        assert_eq!(engine.history().last().unwrap().was_scored, Some(true));

        let stats = engine.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.profit, dec!(1.00));

        // persisted alongside the tagged outcome
        assert_eq!(store.load_stats().await.unwrap().unwrap().total, 1);
        assert_eq!(store.load_settlements().await.unwrap().len(), 1);
        let saved = store.load_outcomes().await.unwrap();
        assert_eq!(saved.len(), 7);
        assert_eq!(saved[6].was_correct, Some(true));
    }

    #[tokio::test]
    async fn test_losing_round_then_new_signal() {
        let mut gen = OutcomeGenerator::new();
        let mut engine = primed(Arc::new(MemoryStore::new()), &mut gen).await;

        engine.ingest(gen.raw(Color::Red)).await.unwrap();
        assert_eq!(engine.stats().reds, 1);

        // seven reds now: the new signal still says black, at the capped confidence
        assert_eq!(engine.signal().color, Some(Color::Black));
        assert_eq!(engine.signal().confidence, 88.0);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let mut engine = engine_with(Arc::new(MemoryStore::new()));
        let mut gen = OutcomeGenerator::new();
        let raw = gen.raw(Color::Black);

        engine.record(raw.clone()).await.unwrap();
        let err = engine.record(raw).await.unwrap_err();

        assert!(err.is_duplicate());
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_order_rejected() {
        let mut engine = engine_with(Arc::new(MemoryStore::new()));
        let mut gen = OutcomeGenerator::new();
        let older = gen.outcome(Color::Red);
        let newer = gen.outcome(Color::Black);

        engine.append(newer).await.unwrap();
        let err = engine.append(older).await.unwrap_err();

        assert!(matches!(err, PredictorError::OutOfOrder { .. }));
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_same_timestamp_accepted() {
        let mut engine = engine_with(Arc::new(MemoryStore::new()));
        let mut gen = OutcomeGenerator::new();
        let first = gen.outcome(Color::Red);
        let mut second = gen.outcome(Color::Red);
        second.timestamp = first.timestamp;

        engine.append(first).await.unwrap();
        engine.append(second).await.unwrap();
        assert_eq!(engine.history().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_round_not_appended() {
        let mut engine = engine_with(Arc::new(MemoryStore::new()));
        let mut gen = OutcomeGenerator::new();
        let mut raw = gen.raw(Color::Red);
        raw.color = Value::from(7);

        let err = engine.record(raw).await.unwrap_err();
        assert!(matches!(err, PredictorError::InvalidOutcome(_)));
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_store_failures_are_not_fatal() {
        let mut gen = OutcomeGenerator::new();
        let store: Arc<dyn OutcomeStore> = Arc::new(FailingStore);
        let mut engine = engine_with(store.clone());
        engine.restore().await;
        assert!(engine.history().is_empty());

        let mut engine = primed(store, &mut gen).await;
        let recorded = engine.ingest(gen.raw(Color::Black)).await.unwrap();

        assert!(recorded.settlement.unwrap().correct);
        assert_eq!(engine.history().len(), 7);
        assert_eq!(engine.stats().total, 1);
    }

    #[tokio::test]
    async fn test_restore_from_store() {
        let mut gen = OutcomeGenerator::new();
        let store = Arc::new(MemoryStore::new());
        {
            let mut engine = primed(store.clone(), &mut gen).await;
            engine.ingest(gen.raw(Color::Black)).await.unwrap();
        }

        let mut engine = engine_with(store.clone());
        engine.restore().await;

        assert_eq!(engine.history().len(), 7);
        assert_eq!(engine.stats().total, 1);
        assert_eq!(engine.recent_settlements().count(), 1);

        // ids from the restored log are still known
        let replay = engine.history()[0].clone();
        assert!(engine.append(replay).await.unwrap_err().is_duplicate());

        // the signal itself is not persisted
        assert_eq!(engine.signal().strategy, SignalStrategy::InsufficientData);
    }

    #[tokio::test]
    async fn test_inspect_feed_window() {
        let mut engine = engine_with(Arc::new(MemoryStore::new()));
        let mut gen = OutcomeGenerator::new();
        let text = format!("{}{}", "R".repeat(16), "BRBRBRBR");
        for outcome in gen.from_text(&text) {
            engine.append(outcome).await.unwrap();
        }

        let full = engine.inspect_feed(100);
        assert_eq!(full.samples, 24);
        assert!(full
            .anomalies
            .iter()
            .any(|a| matches!(a, Anomaly::LongRun { length: 16, .. })));

        let tail = engine.inspect_feed(8);
        assert_eq!(tail.samples, 8);
        assert!(tail.is_clean());
    }

    #[tokio::test]
    async fn test_analyze_persists_patterns() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());
        let mut gen = OutcomeGenerator::new();
        for outcome in gen.from_text(&"RRB".repeat(8)) {
            engine.append(outcome).await.unwrap();
        }

        engine.analyze().await;

        assert!(!engine.patterns().is_empty());
        assert_eq!(store.load_patterns().await.unwrap(), engine.patterns());
    }
}
