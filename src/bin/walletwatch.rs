use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};

use polymarket_walletwatch::api::ActivityClient;
use polymarket_walletwatch::config::{AppConfig, CONFIG_PATH, PLACEHOLDER_WALLET, Secrets};
use polymarket_walletwatch::engine::{detect_new, is_fresh};
use polymarket_walletwatch::markets::MarketResolver;
use polymarket_walletwatch::notifier::{self, Notifier};
use polymarket_walletwatch::state::NotifyState;
use polymarket_walletwatch::store::CursorStore;

/// File backing the per-wallet cursor map.
const CURSOR_STORE_PATH: &str = "state.json";

/// Timeout applied to every outbound HTTP request.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "walletwatch", about = "Polymarket wallet activity watcher")]
struct Args {
    /// Config file path
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

/// Mutable state owned by the poll loop. Every process-lifetime cache lives
/// here rather than in globals: the market-name cache, the per-wallet
/// toggle state, and the persisted cursors.
struct WatchContext {
    activity: ActivityClient,
    resolver: MarketResolver,
    notifier: Notifier,
    cursors: CursorStore,
    notify_state: NotifyState,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load_or_init(&args.config);
    let secrets = Secrets::from_env();

    info!(
        "Starting walletwatch — {} wallet(s), poll={}s, staleness={}s",
        config.wallets.len(),
        config.settings.poll_interval_secs,
        config.settings.staleness_threshold_secs,
    );

    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

    let mut ctx = WatchContext {
        activity: ActivityClient::new(http.clone(), secrets.poly_api_key),
        resolver: MarketResolver::new(http.clone()),
        notifier: Notifier::new(http, secrets.telegram_bot_token, secrets.telegram_chat_id),
        cursors: CursorStore::load(CURSOR_STORE_PATH),
        notify_state: NotifyState::new(),
    };

    let poll_duration = Duration::from_secs(config.settings.poll_interval_secs);

    loop {
        poll_cycle(&mut ctx, &config).await;

        if args.once {
            info!("Single cycle complete, exiting");
            break;
        }

        debug!(
            "Cycle complete, sleeping {}s",
            config.settings.poll_interval_secs
        );
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = tokio::time::sleep(poll_duration) => {}
        }
    }

    Ok(())
}

/// One full cycle over all configured wallets, strictly sequentially. A
/// wallet's failure never blocks the remaining wallets.
async fn poll_cycle(ctx: &mut WatchContext, config: &AppConfig) {
    let wallet_delay = Duration::from_secs(config.settings.wallet_delay_secs);

    for (address, name) in &config.wallets {
        if address.as_str() == PLACEHOLDER_WALLET {
            warn!("Wallet list still contains the placeholder address, edit your config");
            continue;
        }

        debug!("Checking {name} ({address})");
        if let Err(e) = poll_wallet(ctx, config, address, name).await {
            warn!("Cycle failed for {name}: {e:#}");
        }

        tokio::time::sleep(wallet_delay).await;
    }
}

/// Fetch, detect, filter, and notify for a single wallet, then commit the
/// advanced cursor.
async fn poll_wallet(
    ctx: &mut WatchContext,
    config: &AppConfig,
    address: &str,
    name: &str,
) -> Result<()> {
    let batch = match ctx
        .activity
        .recent_activity(address, config.settings.page_limit)
        .await
    {
        Ok(batch) => batch,
        Err(e) => {
            // Transient fetch failures read as "no new data this cycle";
            // the next cycle catches up.
            warn!("Activity fetch failed for {name}: {e:#}");
            Vec::new()
        }
    };

    let cursor = ctx.cursors.get(address).map(str::to_string);
    let detection = detect_new(&batch, cursor.as_deref());

    if cursor.is_none() {
        if detection.next_cursor.is_some() {
            info!("First observation for {name}, setting baseline without notifying");
        }
    } else {
        let now = chrono::Utc::now().timestamp();
        let threshold = config.settings.staleness_threshold_secs;

        for record in &detection.new_records {
            if !is_fresh(record, now, threshold) {
                debug!("Dropping stale record for {name}");
                continue;
            }

            let market_label = ctx.resolver.display_label(record).await;
            let side = record.trade_side();
            if ctx.notify_state.should_notify(address, &market_label, &side) {
                let message = notifier::format_trade(record, name, address, &market_label);
                ctx.notifier.send(&message).await;
                info!("Notified: {name} {side} on \"{market_label}\"");
            } else {
                debug!("Suppressed repeat {side} by {name} on \"{market_label}\"");
            }
        }
    }

    if let Some(next) = &detection.next_cursor {
        if cursor.as_deref() != Some(next.as_str()) {
            ctx.cursors.set(address, next)?;
        }
    }

    Ok(())
}
