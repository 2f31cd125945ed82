//! HTTP round feed
//!
//! Both endpoints answer newest first, either as a bare array or as a page
//! object with a `records` array.

use super::OutcomeSource;
use crate::config::SourceConfig;
use crate::data::RawOutcome;
use crate::error::{PredictorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Round feed over the game's public REST API
pub struct HttpSource {
    http: Client,
    recent_url: String,
    history_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RoundsResponse {
    List(Vec<RawOutcome>),
    Page { records: Vec<RawOutcome> },
}

impl RoundsResponse {
    /// Rounds oldest first
    pub(crate) fn into_chronological(self) -> Vec<RawOutcome> {
        let mut rounds = match self {
            RoundsResponse::List(rounds) => rounds,
            RoundsResponse::Page { records } => records,
        };
        rounds.reverse();
        rounds
    }
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            recent_url: format!("{}/{}", base, config.recent_path.trim_start_matches('/')),
            history_url: format!("{}/{}", base, config.history_path.trim_start_matches('/')),
        })
    }

    async fn get_rounds(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<RawOutcome>> {
        let resp = self.http.get(url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PredictorError::Api(format!("{} returned {}", url, status)));
        }

        let body: RoundsResponse = resp.json().await?;
        Ok(body.into_chronological())
    }
}

#[async_trait]
impl OutcomeSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawOutcome>> {
        let mut rounds = self
            .get_rounds(&self.history_url, &[("limit", limit.to_string())])
            .await?;

        if rounds.len() > limit {
            rounds.drain(..rounds.len() - limit);
        }

        tracing::debug!("Fetched {} historical rounds", rounds.len());
        Ok(rounds)
    }

    async fn fetch_latest(&self) -> Result<Option<RawOutcome>> {
        let rounds = self.get_rounds(&self.recent_url, &[]).await?;
        Ok(rounds.into_iter().last())
    }

    async fn check_availability(&self) -> bool {
        match self.http.get(&self.recent_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!("Round feed unreachable: {}", e);
                false
            }
        }
    }
}
