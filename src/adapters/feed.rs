//! Round outcome feed
//!
//! Polls an HTTP endpoint that returns the most recent round.

use crate::config::FeedConfig;
use crate::domain::RoundResult;
use crate::error::{Result, SignalError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Source of round results
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutcomeFeed: Send + Sync {
    /// Latest round, or `None` on any transient failure
    async fn poll(&self) -> Option<RoundResult>;
}

/// HTTP implementation of [`OutcomeFeed`]
#[derive(Clone)]
pub struct HttpOutcomeFeed {
    client: Client,
    url: String,
}

impl HttpOutcomeFeed {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the latest round
    pub async fn fetch(&self) -> Result<RoundResult> {
        debug!("Polling feed: {}", self.url);

        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SignalError::FeedUnavailable(format!("HTTP {}", status)));
        }

        let text = resp.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        parse_latest(&body)
    }
}

#[async_trait]
impl OutcomeFeed for HttpOutcomeFeed {
    async fn poll(&self) -> Option<RoundResult> {
        match self.fetch().await {
            Ok(round) => Some(round),
            Err(SignalError::Http(e)) if e.is_timeout() => {
                warn!("Feed request timed out");
                None
            }
            Err(e) if e.is_transient() => {
                warn!("Feed poll failed: {}", e);
                None
            }
            Err(e) => {
                error!("Feed poll failed: {}", e);
                None
            }
        }
    }
}

/// Extract round id and outcome label from a feed payload.
///
/// Accepts `{"data": {"id": .., "result": {"outcome": ..}}}` as well as the
/// unwrapped inner object.
pub fn parse_latest(body: &Value) -> Result<RoundResult> {
    let Some(top) = body.as_object() else {
        return Err(SignalError::InvalidFeedPayload(
            "payload is not an object".to_string(),
        ));
    };

    let data = match top.get("data") {
        Some(Value::Object(inner)) => inner,
        _ => top,
    };

    let round_id = match data.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(SignalError::InvalidFeedPayload(
                "missing round id".to_string(),
            ))
        }
    };

    let outcome_label = data
        .get("result")
        .and_then(|result| result.get("outcome"))
        .and_then(Value::as_str)
        .filter(|label| !label.is_empty())
        .ok_or_else(|| {
            SignalError::InvalidFeedPayload(format!("missing outcome for round {}", round_id))
        })?;

    Ok(RoundResult::new(round_id, outcome_label))
}
