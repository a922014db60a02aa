//! Header row location and column label resolution

use crate::excel::CellSource;
use crate::types::{column_key, CellValue, ColumnSpan};
use std::collections::{HashMap, HashSet};

/// Key-column labels that mark the header row (compared lowercased, no spaces)
const HEADER_TOKENS: [&str; 2] = ["event#", "event"];

/// Find the 1-based header row by scanning the key column.
///
/// Falls back to row 1 when no token is found within `scan_rows`.
pub fn find_header_row(source: &dyn CellSource, key_col: usize, scan_rows: usize) -> usize {
    for row in 0..scan_rows {
        if let CellValue::Text(text) = source.cell(row, key_col) {
            if HEADER_TOKENS.contains(&column_key(&text).as_str()) {
                return row + 1;
            }
        }
    }
    tracing::debug!("no header token in first {} rows, using row 1", scan_rows);
    1
}

/// Read the labels on `header_row` across the span; blanks become `Col<N>`
pub fn read_headers(source: &dyn CellSource, header_row: usize, span: ColumnSpan) -> Vec<String> {
    span.indices()
        .map(|col| {
            let label = source.cell(header_row - 1, col).text();
            if label.is_empty() {
                format!("Col{}", col + 1)
            } else {
                label
            }
        })
        .collect()
}

/// Disambiguate repeated labels as `Name`, `Name.1`, `Name.2`, ...
///
/// A generated suffix never reuses a name that appears literally in `labels`.
pub fn make_unique(labels: &[String]) -> Vec<String> {
    let literals: HashSet<&str> = labels.iter().map(String::as_str).collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::with_capacity(labels.len());

    for label in labels {
        let base = if label.is_empty() { "Col" } else { label.as_str() };
        let name = if used.contains(base) {
            let count = counts.entry(base).or_insert(0);
            loop {
                *count += 1;
                let candidate = format!("{}.{}", base, count);
                if !used.contains(&candidate) && !literals.contains(candidate.as_str()) {
                    break candidate;
                }
            }
        } else {
            base.to_string()
        };
        used.insert(name.clone());
        out.push(name);
    }

    out
}
