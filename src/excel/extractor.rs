//! Workbook sheet → row records

use crate::config::PublishConfig;
use crate::error::{SheetError, SheetResult};
use crate::excel::headers::{find_header_row, make_unique, read_headers};
use crate::excel::CellSource;
use crate::types::{RowRecord, SheetExtract};
use calamine::{open_workbook_auto, Reader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Log progress every this many rows read
const PROGRESS_EVERY: usize = 250;

/// Reads the configured region of one worksheet
pub struct SheetExtractor {
    path: PathBuf,
}

impl SheetExtractor {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Open the workbook and extract the configured sheet
    pub fn extract(&self, config: &PublishConfig) -> SheetResult<SheetExtract> {
        info!("loading workbook {}", self.path.display());
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            SheetError::Workbook(format!("Failed to open {}: {}", self.path.display(), e))
        })?;

        let sheet_names = workbook.sheet_names().to_vec();
        if !sheet_names.iter().any(|name| name == &config.sheet) {
            return Err(SheetError::SheetNotFound {
                sheet: config.sheet.clone(),
                available: sheet_names,
            });
        }

        let range = workbook.worksheet_range(&config.sheet).map_err(|e| {
            SheetError::Workbook(format!("Failed to read sheet {}: {}", config.sheet, e))
        })?;
        debug!(
            "sheet {} spans {:?}..{:?}",
            config.sheet,
            range.start(),
            range.end()
        );

        Ok(extract_rows(&range, config))
    }
}

/// Locate headers, then read rows until a blank key cell or the row cap
pub fn extract_rows(source: &dyn CellSource, config: &PublishConfig) -> SheetExtract {
    let span = config.columns;
    let key_col = span.first;

    let header_row = find_header_row(source, key_col, config.header_scan_rows);
    info!("header_row={}", header_row);

    let columns = make_unique(&read_headers(source, header_row, span));
    info!("columns: {:?}", columns);

    let mut extract = SheetExtract {
        header_row,
        columns,
        ..Default::default()
    };

    // header_row is 1-based, so it is also the 0-based index of the first data row
    let start = header_row;
    let mut hit_blank = false;

    for offset in 0..config.max_rows {
        let row_idx = start + offset;
        let key = source.cell(row_idx, key_col);
        if key.is_blank() {
            info!("stop at row {} (blank key cell)", row_idx + 1);
            hit_blank = true;
            break;
        }
        if config.numeric_keys_only && !key.is_numeric() {
            debug!("skip row {} (non-numeric key {:?})", row_idx + 1, key.text());
            extract.skipped += 1;
            continue;
        }

        let mut record = RowRecord::new();
        for (name, col) in extract.columns.iter().zip(span.indices()) {
            record.push(name.clone(), source.cell(row_idx, col));
        }
        extract.rows.push(record);

        if extract.rows.len() % PROGRESS_EVERY == 0 {
            info!("read {} rows...", extract.rows.len());
        }
    }

    if !hit_blank {
        let next = start + config.max_rows;
        extract.truncated = !source.cell(next, key_col).is_blank();
        if extract.truncated {
            info!(
                "row cap of {} reached; rows from {} on were not read",
                config.max_rows,
                next + 1
            );
        }
    }

    info!("total rows read: {}", extract.rows.len());
    extract
}
