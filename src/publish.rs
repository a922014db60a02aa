//! Publish pipeline: extract → normalize → payload → write → sync

use crate::config::PublishConfig;
use crate::error::SheetResult;
use crate::excel::SheetExtractor;
use crate::format::{format_money, format_percent};
use crate::payload::{build_payload, PayloadColumns};
use crate::sync::{GitSync, SyncOutcome};
use crate::types::{column_key, CellValue, SheetExtract};
use crate::writer::{publish_timestamp, write_csv, write_timestamp};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Summary of one publish run
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub header_row: usize,
    pub columns: Vec<String>,
    pub rows: usize,
    pub truncated: bool,
    pub skipped: usize,
    pub payload: Option<PayloadColumns>,
    pub output: PathBuf,
    /// Sidecar path and the stamp written to it
    pub timestamp: Option<(PathBuf, String)>,
    pub sync: Option<SyncOutcome>,
    pub elapsed: Duration,
}

/// Run the whole pipeline for one workbook
pub fn publish(config: &PublishConfig) -> SheetResult<PublishReport> {
    let started = Instant::now();
    config.validate()?;

    info!("excel: {}", config.workbook.display());
    info!("sheet: {}", config.sheet);
    let extract = SheetExtractor::new(&config.workbook).extract(config)?;

    let mut report = emit(extract, config)?;
    report.elapsed = started.elapsed();
    info!("done in {:.2}s", report.elapsed.as_secs_f64());
    Ok(report)
}

/// Normalize, derive payloads, write the artifact, and sync if configured
pub fn emit(mut extract: SheetExtract, config: &PublishConfig) -> SheetResult<PublishReport> {
    let started = Instant::now();
    // Fail on a bad zone before anything is written
    let stamp = publish_timestamp(&config.timezone)?;

    normalize(&mut extract, config);
    let payload = if config.payload {
        Some(attach_payloads(&mut extract, config))
    } else {
        None
    };

    write_csv(&config.output, &extract, config.bom)?;
    info!("saved: {}", config.output.display());

    let mut synced_files = vec![config.output.clone()];
    let timestamp = if config.write_timestamp {
        write_timestamp(&config.timestamp_path, &stamp)?;
        synced_files.push(config.timestamp_path.clone());
        Some((config.timestamp_path.clone(), stamp.clone()))
    } else {
        None
    };

    let sync = if config.sync {
        let outcome = GitSync::new(&config.repo_dir)
            .publish(&synced_files, &format!("Publish {}", stamp))?;
        Some(outcome)
    } else {
        None
    };

    Ok(PublishReport {
        header_row: extract.header_row,
        rows: extract.row_count(),
        columns: extract.columns,
        truncated: extract.truncated,
        skipped: extract.skipped,
        payload,
        output: config.output.clone(),
        timestamp,
        sync,
        elapsed: started.elapsed(),
    })
}

/// Rewrite configured percent and money columns in place
pub fn normalize(extract: &mut SheetExtract, config: &PublishConfig) {
    let percent = matching_columns(&extract.columns, &config.percent_columns);
    let money = matching_columns(&extract.columns, &config.money_columns);

    for row in &mut extract.rows {
        for col in &percent {
            let formatted = format_percent(&row.text(col));
            row.set(col, CellValue::Text(formatted));
        }
        for col in &money {
            let formatted = format_money(&row.text(col));
            row.set(col, CellValue::Text(formatted));
        }
    }
}

/// Add the payload column to every row and return the resolved inputs
pub fn attach_payloads(extract: &mut SheetExtract, config: &PublishConfig) -> PayloadColumns {
    let resolved = PayloadColumns::resolve(&extract.columns, config.wager_index);
    info!(
        "pick column: {}",
        resolved.pick.as_deref().unwrap_or("(none)")
    );
    info!(
        "wager column: {}",
        resolved.wager.as_deref().unwrap_or("(none)")
    );

    for row in &mut extract.rows {
        let payload = build_payload(row, &resolved);
        row.set(&config.payload_column, CellValue::Text(payload));
    }
    extract.add_column(&config.payload_column);
    resolved
}

/// Extract columns whose loose key matches one of `wanted`
fn matching_columns(columns: &[String], wanted: &[String]) -> Vec<String> {
    let keys: Vec<String> = wanted.iter().map(|w| column_key(w)).collect();
    columns
        .iter()
        .filter(|c| keys.contains(&column_key(c)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowRecord;
    use std::fs;
    use tempfile::TempDir;

    fn extract() -> SheetExtract {
        let columns = vec![
            "Event #".to_string(),
            "Market".to_string(),
            "Win %".to_string(),
            "Market.1".to_string(),
            "Wager".to_string(),
        ];
        let mut row = RowRecord::new();
        row.push("Event #", CellValue::Int(5));
        row.push("Market", CellValue::Text("Total".into()));
        row.push("Win %", CellValue::Float(0.612));
        row.push("Market.1", CellValue::Text("Over 141.5".into()));
        row.push("Wager", CellValue::Float(42.4));
        SheetExtract {
            header_row: 1,
            columns,
            rows: vec![row],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_matches_loosely() {
        let mut ex = extract();
        normalize(&mut ex, &PublishConfig::default());
        assert_eq!(ex.rows[0].text("Win %"), "61.20%");
        assert_eq!(ex.rows[0].text("Wager"), "$42");
        assert_eq!(ex.rows[0].text("Market"), "Total");
    }

    #[test]
    fn test_attach_payloads_adds_column_once() {
        let mut ex = extract();
        let config = PublishConfig::default();
        let resolved = attach_payloads(&mut ex, &config);
        attach_payloads(&mut ex, &config);

        assert_eq!(resolved.wager.as_deref(), Some("Wager"));
        assert_eq!(
            ex.columns.iter().filter(|c| c.as_str() == "QR Code").count(),
            1
        );
        assert!(ex.rows[0].text("QR Code").starts_with("ALC|EVT:5|"));
        assert!(ex.rows[0].text("QR Code").ends_with("|WAGER:$42"));
    }

    #[test]
    fn test_emit_writes_artifact_without_sync() {
        let dir = TempDir::new().unwrap();
        let config = PublishConfig {
            output: dir.path().join("data/latest.csv"),
            timestamp_path: dir.path().join("data/updated_at.txt"),
            ..Default::default()
        };

        let report = emit(extract(), &config).unwrap();

        assert_eq!(report.rows, 1);
        assert!(report.sync.is_none());
        assert!(config.output.exists());
        let (path, stamp) = report.timestamp.unwrap();
        assert_eq!(fs::read_to_string(path).unwrap().trim(), stamp);
    }

    #[test]
    fn test_emit_keeps_every_repeated_column() {
        use crate::excel::{extract_rows, GridSource};
        use crate::types::ColumnSpan;

        let dir = TempDir::new().unwrap();
        let grid = GridSource::from_text(&[
            &["Event #", "Market", "Market.1", "Market"],
            &["1", "Spread", "Duke -3", "Total"],
        ]);
        let config = PublishConfig {
            columns: ColumnSpan::parse("A:D").unwrap(),
            output: dir.path().join("latest.csv"),
            write_timestamp: false,
            payload: false,
            ..Default::default()
        };

        emit(extract_rows(&grid, &config), &config).unwrap();

        assert_eq!(
            fs::read_to_string(&config.output).unwrap(),
            "Event #,Market,Market.1,Market.2\n1,Spread,Duke -3,Total\n"
        );
    }

    #[test]
    fn test_emit_rejects_unknown_zone_before_writing() {
        let dir = TempDir::new().unwrap();
        let config = PublishConfig {
            output: dir.path().join("latest.csv"),
            timezone: "Nowhere/Special".to_string(),
            ..Default::default()
        };
        assert!(emit(extract(), &config).is_err());
        assert!(!config.output.exists());
    }
}
