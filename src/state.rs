use std::collections::HashMap;

use crate::types::TradeSide;

/// Per-wallet memory of the last notified trade side per market.
///
/// Consecutive same-side actions on the same market collapse into a single
/// notification; a side reversal always re-notifies. The map lives only for
/// the process lifetime — after a restart the first action per market
/// notifies again, and the persisted cursor keeps that bounded to genuinely
/// new records.
#[derive(Debug, Default)]
pub struct NotifyState {
    last_side: HashMap<String, HashMap<String, TradeSide>>,
}

impl NotifyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether an action on `(wallet, market_key)` warrants a
    /// notification, recording the side when it does.
    ///
    /// The side is recorded on the notify decision itself, before delivery
    /// is attempted, so a failed send does not re-trigger on the next
    /// same-side record.
    pub fn should_notify(&mut self, wallet: &str, market_key: &str, side: &TradeSide) -> bool {
        let markets = self.last_side.entry(wallet.to_string()).or_default();
        match markets.get(market_key) {
            Some(last) if last == side => false,
            _ => {
                markets.insert(market_key.to_string(), side.clone());
                true
            }
        }
    }
}
