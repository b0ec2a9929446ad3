pub mod api;
pub mod config;
pub mod engine;
pub mod markets;
pub mod notifier;
pub mod state;
pub mod store;
pub mod types;

/// Polymarket data API base URL (public; an API key is attached as a bearer
/// token when configured)
pub const DATA_API_BASE: &str = "https://data-api.polymarket.com";

/// Gamma API base URL (market metadata lookups)
pub const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Public profile page base URL, linked from every notification
pub const PROFILE_URL_BASE: &str = "https://polymarket.com/profile";
