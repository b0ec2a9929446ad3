//! Probe: raw /activity response shape
//!
//! Hits GET https://data-api.polymarket.com/activity?user=<addr>&type=TRADE
//! and documents the field inventory, cursor-id coverage
//! (transactionHash vs the id fallback), and side distribution — the
//! contract the change detector relies on.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;

use polymarket_walletwatch::DATA_API_BASE;

#[derive(Parser)]
#[command(name = "probe_activity", about = "Dump the raw activity feed for one wallet")]
struct Args {
    /// Wallet address to probe
    #[arg(long)]
    address: String,

    /// Page size
    #[arg(long, default_value_t = 25)]
    limit: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();
    let url = format!("{DATA_API_BASE}/activity");

    let body: Value = client
        .get(&url)
        .query(&[
            ("user", args.address.as_str()),
            ("limit", &args.limit.to_string()),
            ("type", "TRADE"),
        ])
        .send()
        .await?
        .json()
        .await?;

    let Some(rows) = body.as_array() else {
        println!("Response is not an array:");
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    };

    println!("=== /activity probe: {} row(s) ===", rows.len());

    if let Some(first) = rows.first() {
        println!("\nSample row (first):");
        println!("{}", serde_json::to_string_pretty(first)?);
        if let Some(obj) = first.as_object() {
            println!("\nFields present:");
            for key in obj.keys() {
                println!("  - {key}");
            }
        }
    }

    let mut with_hash = 0;
    let mut with_id_only = 0;
    let mut with_neither = 0;
    let mut sides: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        let hash = row
            .get("transactionHash")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let id = row.get("id").filter(|v| !v.is_null());
        match (hash, id) {
            (Some(_), _) => with_hash += 1,
            (None, Some(_)) => with_id_only += 1,
            (None, None) => with_neither += 1,
        }
        let side = row.get("side").and_then(Value::as_str).unwrap_or("<missing>");
        *sides.entry(side.to_string()).or_default() += 1;
    }

    println!("\nCursor id coverage:");
    println!("  transactionHash present: {with_hash}");
    println!("  id fallback only: {with_id_only}");
    println!("  no usable id: {with_neither}");

    println!("\nSide distribution:");
    for (side, count) in &sides {
        println!("  {side}: {count}");
    }

    Ok(())
}
