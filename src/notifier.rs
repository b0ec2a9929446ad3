use serde_json::json;
use tracing::{debug, warn};

use crate::types::ActivityRecord;
use crate::{PROFILE_URL_BASE, TELEGRAM_API_BASE};

/// Telegram delivery client.
///
/// Missing credentials turn `send` into a no-op (surfaced once at startup);
/// delivery failures are logged and never retried.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    credentials: Option<Credentials>,
}

#[derive(Debug, Clone)]
struct Credentials {
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(http: reqwest::Client, bot_token: Option<String>, chat_id: Option<String>) -> Self {
        let credentials = match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(Credentials { bot_token, chat_id }),
            _ => {
                warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID missing — notifications disabled");
                None
            }
        };
        Self { http, credentials }
    }

    /// Deliver one pre-formatted HTML message.
    pub async fn send(&self, message: &str) {
        let Some(credentials) = &self.credentials else {
            debug!("Notification skipped, Telegram not configured");
            return;
        };

        let url = format!(
            "{}/bot{}/sendMessage",
            TELEGRAM_API_BASE, credentials.bot_token
        );
        let payload = json!({
            "chat_id": credentials.chat_id,
            "text": message,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        match self.http.post(&url).json(&payload).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!("Telegram sendMessage returned {}", response.status());
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to send Telegram message: {e}"),
        }
    }
}

/// Escape a value for embedding in a Telegram HTML message. Every
/// API-sourced or operator-sourced field goes through this before
/// formatting.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the notification message for one trade.
pub fn format_trade(
    record: &ActivityRecord,
    wallet_name: &str,
    address: &str,
    market_label: &str,
) -> String {
    let action = record.trade_side().action_label();
    let size = record.size.as_deref().unwrap_or("?");
    let price = record.price.as_deref().unwrap_or("?");

    let mut message = format!(
        "👤 <b>Wallet:</b> {}\n\
         📝 <b>Action:</b> {}\n\
         💰 <b>Amount:</b> {} @ {}\n\
         📊 <b>Market:</b> {}",
        escape_html(wallet_name),
        escape_html(&action),
        escape_html(size),
        escape_html(price),
        escape_html(market_label),
    );
    if let Some(outcome) = record.outcome.as_deref().filter(|o| !o.is_empty()) {
        message.push_str(&format!(" ({})", escape_html(outcome)));
    }
    message.push_str(&format!(
        "\n🔗 <a href='{PROFILE_URL_BASE}/{address}'>Profile</a>"
    ));
    message
}
