//! Tests for monitor module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::client::MockOutcomeSource;
    use crate::config::Config;
    use crate::error::PredictorError;
    use crate::storage::MemoryStore;
    use crate::testing::OutcomeGenerator;
    use crate::types::Color;
    use serde_json::Value;

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            poll_interval_secs: 1,
            analysis_delay_ms: 0,
            backfill_limit: 50,
            anomaly_every: 1,
            anomaly_window: 100,
        }
    }

    fn monitor_with(source: MockOutcomeSource) -> LiveMonitor {
        let engine = Engine::new(&Config::default(), Arc::new(MemoryStore::new()));
        LiveMonitor::new(Arc::new(Mutex::new(engine)), Arc::new(source), fast_config())
    }

    #[tokio::test]
    async fn test_backfill_records_history() {
        let mut gen = OutcomeGenerator::new();
        let rounds = gen.raw_from_text("RRRRRR");

        let mut source = MockOutcomeSource::new();
        source.expect_name().return_const("mock");
        source.expect_check_availability().returning(|| true);
        source
            .expect_fetch_history()
            .withf(|limit| *limit == 50)
            .times(1)
            .returning(move |_| Ok(rounds.clone()));

        let monitor = monitor_with(source);
        assert_eq!(monitor.backfill().await, 6);

        let engine = monitor.engine();
        let engine = engine.lock().await;
        assert_eq!(engine.history().len(), 6);
        // analyzed once after the backfill
        assert_eq!(engine.signal().color, Some(Color::Black));
        assert_eq!(monitor.stats().backfilled, 6);
    }

    #[tokio::test]
    async fn test_backfill_skips_unavailable_source() {
        let mut source = MockOutcomeSource::new();
        source.expect_name().return_const("mock");
        source.expect_check_availability().returning(|| false);
        source.expect_fetch_history().never();

        let monitor = monitor_with(source);
        assert_eq!(monitor.backfill().await, 0);
    }

    #[tokio::test]
    async fn test_backfill_counts_rejections() {
        let mut gen = OutcomeGenerator::new();
        let mut rounds = gen.raw_from_text("RBR");
        rounds.push(rounds[0].clone());
        let mut bad = gen.raw(Color::Black);
        bad.roll = Value::from(3);
        rounds.push(bad);

        let mut source = MockOutcomeSource::new();
        source.expect_name().return_const("mock");
        source.expect_check_availability().returning(|| true);
        source.expect_fetch_history().returning(move |_| Ok(rounds.clone()));

        let monitor = monitor_with(source);
        assert_eq!(monitor.backfill().await, 3);
        // duplicates are expected while polling and not counted
        assert_eq!(monitor.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_poll_once_ingests_new_round_once() {
        let mut gen = OutcomeGenerator::new();
        let raw = gen.raw(Color::Red);

        let mut source = MockOutcomeSource::new();
        source.expect_name().return_const("mock");
        source.expect_fetch_latest().returning(move || Ok(Some(raw.clone())));

        let monitor = monitor_with(source);
        let recorded = monitor.poll_once().await.unwrap();
        assert_eq!(recorded.outcome.color, Color::Red);

        assert!(monitor.poll_once().await.is_none());
        let stats = monitor.stats();
        assert_eq!(stats.ingested, 1);
        assert_eq!(stats.rejected, 0);
    }

    #[tokio::test]
    async fn test_poll_once_survives_source_errors() {
        let mut source = MockOutcomeSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch_latest()
            .returning(|| Err(PredictorError::SourceUnavailable("timeout".to_string())));

        let monitor = monitor_with(source);
        assert!(monitor.poll_once().await.is_none());
        assert!(monitor.poll_once().await.is_none());
        assert_eq!(monitor.stats().fetch_failures, 2);
        assert!(monitor.engine().lock().await.history().is_empty());
    }

    #[tokio::test]
    async fn test_poll_once_nothing_new() {
        let mut source = MockOutcomeSource::new();
        source.expect_name().return_const("mock");
        source.expect_fetch_latest().returning(|| Ok(None));

        let monitor = monitor_with(source);
        assert!(monitor.poll_once().await.is_none());
        assert_eq!(monitor.stats(), MonitorStats::default());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut gen = OutcomeGenerator::new();
        let rounds = gen.raw_from_text("RBW");

        let mut source = MockOutcomeSource::new();
        source.expect_name().return_const("mock");
        source.expect_check_availability().returning(|| true);
        source.expect_fetch_history().returning(move |_| Ok(rounds.clone()));
        source.expect_fetch_latest().returning(|| Ok(None));

        let monitor = Arc::new(monitor_with(source));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn({
            let monitor = Arc::clone(&monitor);
            async move { monitor.run(rx).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats.backfilled, 3);
        assert_eq!(stats.ingested, 0);
    }
}
