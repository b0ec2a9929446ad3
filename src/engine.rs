use crate::types::ActivityRecord;

/// Millisecond-epoch cutoff: timestamps above this are taken to be in
/// milliseconds and divided down to seconds.
pub const MS_EPOCH_CUTOFF: i64 = 1_000_000_000_000;

/// Outcome of one change-detection pass over a polled batch.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Genuinely new records, oldest first — the order notifications go out in.
    pub new_records: Vec<ActivityRecord>,
    /// Cursor to persist after this wallet's cycle. Advances past every
    /// examined record, not just every record notified on.
    pub next_cursor: Option<String>,
}

/// Diff a newest-first batch against the wallet's persisted cursor.
///
/// With no cursor (first observation), nothing is reported as new and the
/// newest usable id becomes the baseline — history is never retroactively
/// notified. Records with no derivable id are skipped entirely: they are
/// never reported as new and never act as cursor boundaries.
pub fn detect_new(batch: &[ActivityRecord], cursor: Option<&str>) -> Detection {
    let newest_id = batch.iter().find_map(|r| r.tx_id()).map(str::to_string);
    let next_cursor = newest_id.or_else(|| cursor.map(str::to_string));

    let Some(cursor) = cursor else {
        return Detection {
            new_records: Vec::new(),
            next_cursor,
        };
    };

    let mut new_records = Vec::new();
    for record in batch {
        let Some(id) = record.tx_id() else { continue };
        if id == cursor {
            break;
        }
        new_records.push(record.clone());
    }
    new_records.reverse();

    Detection {
        new_records,
        next_cursor,
    }
}

/// Normalize an epoch timestamp to seconds.
///
/// The upstream feed mixes second and millisecond epochs; magnitudes beyond
/// `MS_EPOCH_CUTOFF` are treated as milliseconds. This heuristic is part of
/// the API contract here, not a guess to be revisited per record.
pub fn normalize_timestamp(ts: i64) -> i64 {
    if ts > MS_EPOCH_CUTOFF { ts / 1000 } else { ts }
}

/// A record is fresh iff its normalized timestamp is within
/// `threshold_secs` of `now_secs`. Records without a usable timestamp are
/// never fresh — silence beats spamming on bad data.
///
/// Applied only to records the detector already classified as new; cursor
/// advancement never depends on freshness.
pub fn is_fresh(record: &ActivityRecord, now_secs: i64, threshold_secs: i64) -> bool {
    match record.timestamp {
        Some(ts) => now_secs - normalize_timestamp(ts) <= threshold_secs,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(tx: Option<&str>, timestamp: Option<i64>) -> ActivityRecord {
        let mut row = json!({"side": "BUY", "asset": "a1"});
        if let Some(tx) = tx {
            row["transactionHash"] = json!(tx);
        }
        if let Some(ts) = timestamp {
            row["timestamp"] = json!(ts);
        }
        serde_json::from_value(row).expect("valid test record")
    }

    fn batch(ids: &[&str]) -> Vec<ActivityRecord> {
        ids.iter()
            .map(|id| record(Some(id), Some(1_700_000_000)))
            .collect()
    }

    fn ids(records: &[ActivityRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.tx_id()).collect()
    }

    // ── detect_new ─────────────────────────────────────────────────

    #[test]
    fn empty_batch_leaves_cursor_unchanged() {
        let d = detect_new(&[], Some("T1"));
        assert!(d.new_records.is_empty());
        assert_eq!(d.next_cursor.as_deref(), Some("T1"));

        let d = detect_new(&[], None);
        assert!(d.new_records.is_empty());
        assert_eq!(d.next_cursor, None);
    }

    #[test]
    fn first_observation_sets_baseline_without_records() {
        let d = detect_new(&batch(&["T3", "T2", "T1"]), None);
        assert!(d.new_records.is_empty());
        assert_eq!(d.next_cursor.as_deref(), Some("T3"));
    }

    #[test]
    fn new_records_returned_oldest_first() {
        let d = detect_new(&batch(&["T3", "T2", "T1"]), Some("T1"));
        assert_eq!(ids(&d.new_records), vec!["T2", "T3"]);
        assert_eq!(d.next_cursor.as_deref(), Some("T3"));
    }

    #[test]
    fn cursor_at_newest_yields_nothing() {
        let d = detect_new(&batch(&["T3", "T2", "T1"]), Some("T3"));
        assert!(d.new_records.is_empty());
        assert_eq!(d.next_cursor.as_deref(), Some("T3"));
    }

    #[test]
    fn cursor_missing_from_batch_returns_whole_batch() {
        let d = detect_new(&batch(&["T3", "T2", "T1"]), Some("T0"));
        assert_eq!(ids(&d.new_records), vec!["T1", "T2", "T3"]);
        assert_eq!(d.next_cursor.as_deref(), Some("T3"));
    }

    #[test]
    fn records_without_ids_are_skipped() {
        let batch = vec![
            record(None, Some(1_700_000_000)),
            record(Some("T2"), Some(1_700_000_000)),
            record(None, Some(1_700_000_000)),
            record(Some("T1"), Some(1_700_000_000)),
        ];
        let d = detect_new(&batch, Some("T1"));
        assert_eq!(ids(&d.new_records), vec!["T2"]);
        // The unusable leading record cannot become the cursor.
        assert_eq!(d.next_cursor.as_deref(), Some("T2"));
    }

    #[test]
    fn batch_of_unusable_records_keeps_cursor() {
        let batch = vec![record(None, None), record(None, None)];
        let d = detect_new(&batch, Some("T1"));
        assert!(d.new_records.is_empty());
        assert_eq!(d.next_cursor.as_deref(), Some("T1"));

        let d = detect_new(&batch, None);
        assert!(d.new_records.is_empty());
        assert_eq!(d.next_cursor, None);
    }

    #[test]
    fn cursor_advances_past_stale_records() {
        // Staleness is applied downstream of detection; an old record still
        // moves the cursor so it is not re-examined every cycle.
        let batch = vec![
            record(Some("T9"), Some(1_000)),
            record(Some("T1"), Some(1_700_000_000)),
        ];
        let d = detect_new(&batch, Some("T1"));
        assert_eq!(ids(&d.new_records), vec!["T9"]);
        assert_eq!(d.next_cursor.as_deref(), Some("T9"));
    }

    #[test]
    fn id_fallback_acts_as_cursor_boundary() {
        let id_only = |id: i64| {
            serde_json::from_value::<ActivityRecord>(json!({
                "id": id,
                "side": "SELL",
                "timestamp": 1_700_000_000
            }))
            .expect("valid test record")
        };
        let batch = vec![id_only(9002), id_only(9001)];
        let d = detect_new(&batch, Some("9001"));
        assert_eq!(ids(&d.new_records), vec!["9002"]);
        assert_eq!(d.next_cursor.as_deref(), Some("9002"));
    }

    // ── freshness ──────────────────────────────────────────────────

    #[test]
    fn normalize_passes_seconds_through() {
        assert_eq!(normalize_timestamp(1_700_000_000), 1_700_000_000);
        assert_eq!(normalize_timestamp(0), 0);
    }

    #[test]
    fn normalize_divides_milliseconds() {
        assert_eq!(normalize_timestamp(1_700_000_500_000), 1_700_000_500);
    }

    #[test]
    fn fresh_boundary_is_inclusive() {
        let r = record(Some("T1"), Some(1_700_000_000));
        assert!(is_fresh(&r, 1_700_000_000 + 3600, 3600));
        assert!(!is_fresh(&r, 1_700_000_000 + 3601, 3600));
    }

    #[test]
    fn missing_timestamp_is_never_fresh() {
        let r = record(Some("T1"), None);
        assert!(!is_fresh(&r, 1_700_000_000, i64::MAX));
    }

    #[test]
    fn millisecond_timestamp_normalized_before_check() {
        // 1_700_000_500_000 ms ≈ 1_700_000_500 s, slightly ahead of "now".
        let r = record(Some("T1"), Some(1_700_000_500_000));
        assert!(is_fresh(&r, 1_700_000_000, 3600));
    }

    #[test]
    fn stale_record_excluded_for_any_threshold() {
        let r = record(Some("T1"), Some(1_700_000_000));
        for threshold in [0, 60, 3600, 86_400] {
            assert!(!is_fresh(&r, 1_700_000_000 + threshold + 1, threshold));
        }
    }
}
