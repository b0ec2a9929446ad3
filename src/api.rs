use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::DATA_API_BASE;
use crate::types::ActivityRecord;

/// Backoff applied when the data API rate-limits a request. The call then
/// reports an empty batch and the next cycle re-covers the window.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(5);

/// Client for the data API's activity feed.
#[derive(Debug, Clone)]
pub struct ActivityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ActivityClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: DATA_API_BASE.to_string(),
            api_key,
        }
    }

    /// Fetch the most recent trade activity for one wallet, newest first.
    ///
    /// Rate limiting (HTTP 429) is absorbed: a bounded backoff sleep, then
    /// an empty batch. A non-array body decodes to an empty batch, and
    /// records that fail to decode are skipped one by one rather than
    /// failing the call.
    pub async fn recent_activity(&self, address: &str, limit: u32) -> Result<Vec<ActivityRecord>> {
        let url = format!("{}/activity", self.base_url);
        let limit = limit.to_string();
        let mut request = self.http.get(&url).query(&[
            ("user", address),
            ("limit", limit.as_str()),
            ("type", "TRADE"),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.context("activity request failed")?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(
                "Data API rate limit hit, backing off {}s",
                RATE_LIMIT_BACKOFF.as_secs()
            );
            tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
            return Ok(Vec::new());
        }

        let body: Value = response
            .error_for_status()
            .context("activity request returned error status")?
            .json()
            .await
            .context("activity response was not valid JSON")?;

        Ok(decode_batch(body))
    }
}

/// Decode an activity response body, skipping rows that fail to parse.
fn decode_batch(body: Value) -> Vec<ActivityRecord> {
    let Value::Array(rows) = body else {
        warn!("Activity response was not an array, treating as empty");
        return Vec::new();
    };
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<ActivityRecord>(row) {
            Ok(record) => records.push(record),
            Err(e) => debug!("Skipping undecodable activity record: {e}"),
        }
    }
    records
}
