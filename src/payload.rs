//! Composite tracking payload embedded per row (later rendered as a QR code)
//!
//! The payload is a fixed, exhaustive list of tagged segments:
//!
//! ```text
//! ALC|EVT:101|DT:2025-03-20 19:00:00|V:Duke|H:UNC|M:Spread|OD:-110|P:|WIN:55.00%|EDGE:3.1|PICK:Duke -3|WAGER:$100
//! ```
//!
//! A field the sheet does not have still renders as an empty `|TAG:` segment.

use crate::format::{format_money, format_percent};
use crate::types::RowRecord;

pub const PAYLOAD_PREFIX: &str = "ALC";

/// Labels the key column may carry, in lookup order
const EVENT_COLUMNS: [&str; 3] = ["Event #", "Event#", "Event"];

/// Columns resolved once per sheet and reused for every row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PayloadColumns {
    pub key: Option<String>,
    pub pick: Option<String>,
    pub wager: Option<String>,
}

impl PayloadColumns {
    pub fn resolve(columns: &[String], wager_index: Option<usize>) -> Self {
        Self {
            key: columns.first().cloned(),
            pick: resolve_pick_column(columns),
            wager: resolve_wager_column(columns, wager_index),
        }
    }
}

/// `Market.1` if present, else the second `market*` column, else the only one
pub fn resolve_pick_column(columns: &[String]) -> Option<String> {
    if columns.iter().any(|c| c == "Market.1") {
        return Some("Market.1".to_string());
    }
    let markets: Vec<&String> = columns
        .iter()
        .filter(|c| c.to_lowercase().starts_with("market"))
        .collect();
    match markets.as_slice() {
        [] => None,
        [only] => Some((*only).clone()),
        [_, second, ..] => Some((*second).clone()),
    }
}

/// A column named `Wager`, else the column at the configured position
pub fn resolve_wager_column(columns: &[String], wager_index: Option<usize>) -> Option<String> {
    if let Some(named) = columns.iter().find(|c| c.as_str() == "Wager") {
        return Some(named.clone());
    }
    wager_index.and_then(|idx| columns.get(idx).cloned())
}

/// Build the pipe-delimited payload for one row
pub fn build_payload(row: &RowRecord, columns: &PayloadColumns) -> String {
    let event = EVENT_COLUMNS
        .iter()
        .map(|name| row.text(name))
        .find(|value| !value.is_empty())
        .or_else(|| columns.key.as_deref().map(|key| row.text(key)))
        .unwrap_or_default();
    let pick = columns
        .pick
        .as_deref()
        .map(|c| row.text(c))
        .unwrap_or_default();
    let wager = columns
        .wager
        .as_deref()
        .map(|c| format_money(&row.text(c)))
        .unwrap_or_default();

    let segments = [
        ("EVT", event),
        ("DT", row.text("Date and Time")),
        ("V", row.text("Visitor")),
        ("H", row.text("Home")),
        ("M", row.text("Market")),
        ("OD", row.text("Odds")),
        ("P", row.text("Prop")),
        ("WIN", format_percent(&row.text("Win%"))),
        ("EDGE", row.text("Edge")),
        ("PICK", pick),
        ("WAGER", wager),
    ];

    let mut payload = String::from(PAYLOAD_PREFIX);
    for (tag, value) in segments {
        payload.push('|');
        payload.push_str(tag);
        payload.push(':');
        payload.push_str(&value);
    }
    payload
}
