use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::GAMMA_API_BASE;
use crate::types::{ActivityRecord, non_empty};

/// Label used when a record carries no market information at all.
const UNKNOWN_MARKET: &str = "Unknown market";

/// Resolves asset (CLOB token) ids to market questions via the Gamma API,
/// caching successful lookups for the process lifetime.
#[derive(Debug)]
pub struct MarketResolver {
    http: reqwest::Client,
    base_url: String,
    cache: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct GammaMarket {
    #[serde(default)]
    question: String,
}

impl MarketResolver {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: GAMMA_API_BASE.to_string(),
            cache: HashMap::new(),
        }
    }

    /// Display label for a record's market: title, else slug, else the
    /// resolved asset name.
    pub async fn display_label(&mut self, record: &ActivityRecord) -> String {
        if let Some(title) = non_empty(record.title.as_deref()) {
            return title.to_string();
        }
        if let Some(slug) = non_empty(record.slug.as_deref()) {
            return slug.to_string();
        }
        match non_empty(record.asset.as_deref()) {
            Some(asset) => self.resolve(asset.to_string()).await,
            None => UNKNOWN_MARKET.to_string(),
        }
    }

    /// Resolve an asset id to its market question, falling back to the id
    /// itself. Only successes are cached, so a transient Gamma failure does
    /// not pin the fallback for the rest of the process.
    pub async fn resolve(&mut self, asset_id: String) -> String {
        if let Some(question) = self.cache.get(&asset_id) {
            return question.clone();
        }
        match self.fetch_question(&asset_id).await {
            Some(question) => {
                self.cache.insert(asset_id, question.clone());
                question
            }
            None => asset_id,
        }
    }

    async fn fetch_question(&self, asset_id: &str) -> Option<String> {
        let url = format!("{}/markets", self.base_url);
        let response = match self
            .http
            .get(&url)
            .query(&[("clob_token_ids", asset_id)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Market lookup failed for asset {asset_id}: {e}");
                return None;
            }
        };

        let markets: Vec<GammaMarket> = match response.error_for_status() {
            Ok(response) => match response.json().await {
                Ok(markets) => markets,
                Err(e) => {
                    warn!("Market lookup for asset {asset_id} returned bad JSON: {e}");
                    return None;
                }
            },
            Err(e) => {
                warn!("Market lookup for asset {asset_id} failed: {e}");
                return None;
            }
        };

        match markets.into_iter().next() {
            Some(market) if !market.question.is_empty() => Some(market.question),
            _ => {
                debug!("No Gamma market found for asset {asset_id}");
                None
            }
        }
    }
}
