//! Worksheet reading
//!
//! - `headers`: header row detection and label deduplication
//! - `extractor`: bounded row extraction from a workbook sheet
//!
//! Extraction works against the `CellSource` trait so the same logic runs on
//! a calamine range or an in-memory grid.

mod extractor;
mod headers;

pub use extractor::{extract_rows, SheetExtractor};
pub use headers::{find_header_row, make_unique, read_headers};

use crate::types::CellValue;
use calamine::{Data, Range};

/// Random access to worksheet cells by 0-based absolute (row, column)
pub trait CellSource {
    fn cell(&self, row: usize, col: usize) -> CellValue;
}

impl CellSource for Range<Data> {
    fn cell(&self, row: usize, col: usize) -> CellValue {
        match self.get_value((row as u32, col as u32)) {
            Some(data) => convert_cell(data),
            None => CellValue::Empty,
        }
    }
}

/// Detach a calamine cell from the reader
pub fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::DateTime(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
    }
}

/// In-memory worksheet, row-major
#[derive(Debug, Clone, Default)]
pub struct GridSource {
    rows: Vec<Vec<CellValue>>,
}

impl GridSource {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Build from text cells; `""` becomes an empty cell
    pub fn from_text(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|s| {
                            if s.is_empty() {
                                CellValue::Empty
                            } else {
                                CellValue::Text(s.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

impl CellSource for GridSource {
    fn cell(&self, row: usize, col: usize) -> CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }
}
