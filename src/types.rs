use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One trade event from the data API's `/activity` endpoint.
///
/// The feed is loose about field presence and numeric encodings, so every
/// field is optional. Identifiers may arrive as strings or numbers and are
/// captured as their display form; `size` and `price` are display values
/// only and are never parsed numerically.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityRecord {
    #[serde(deserialize_with = "de_scalar_string")]
    pub transaction_hash: Option<String>,
    #[serde(deserialize_with = "de_scalar_string")]
    pub id: Option<String>,
    /// Epoch timestamp, seconds or milliseconds (see `engine::normalize_timestamp`).
    #[serde(deserialize_with = "de_epoch")]
    pub timestamp: Option<i64>,
    pub side: Option<String>,
    /// CLOB token id of the traded outcome.
    pub asset: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub outcome: Option<String>,
    #[serde(deserialize_with = "de_scalar_string")]
    pub size: Option<String>,
    #[serde(deserialize_with = "de_scalar_string")]
    pub price: Option<String>,
}

impl ActivityRecord {
    /// Identifier used for cursor tracking: transaction hash, falling back
    /// to the record id. Empty strings count as absent.
    pub fn tx_id(&self) -> Option<&str> {
        non_empty(self.transaction_hash.as_deref()).or_else(|| non_empty(self.id.as_deref()))
    }

    pub fn trade_side(&self) -> TradeSide {
        TradeSide::classify(self.side.as_deref())
    }
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Trade direction as reported by the API. Anything other than BUY/SELL is
/// carried through verbatim so the dedup state machine can still compare it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
    Other(String),
}

impl TradeSide {
    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("BUY") => Self::Buy,
            Some(s) if s.eq_ignore_ascii_case("SELL") => Self::Sell,
            Some(s) => Self::Other(s.to_string()),
            None => Self::Other("UNKNOWN".to_string()),
        }
    }

    /// Action label used in notification messages.
    pub fn action_label(&self) -> String {
        match self {
            Self::Buy => "BOUGHT 🟢".to_string(),
            Self::Sell => "SOLD 🔴".to_string(),
            Self::Other(raw) => format!("{raw} ⚪"),
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Accept any JSON scalar as its display string; null and structured values
/// become `None`.
fn de_scalar_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Accept an epoch timestamp as a number or a numeric string; anything
/// unparsable becomes `None` (and the record is later treated as not fresh).
fn de_epoch<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(|f| f as i64)),
        _ => None,
    })
}
