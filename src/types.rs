use crate::error::{SheetError, SheetResult};
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Column span
//==============================================================================

/// Inclusive, 0-based range of worksheet columns (`A:K` → 0..=10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnSpan {
    pub first: usize,
    pub last: usize,
}

impl ColumnSpan {
    pub fn new(first: usize, last: usize) -> SheetResult<Self> {
        if first > last {
            return Err(SheetError::InvalidColumns(format!(
                "{} comes after {}",
                column_letter(first),
                column_letter(last)
            )));
        }
        Ok(Self { first, last })
    }

    /// Parse `"A:K"` (or a single letter, `"C"`)
    pub fn parse(span: &str) -> SheetResult<Self> {
        let span = span.trim();
        let parts: Vec<&str> = span.split(':').collect();
        match parts.as_slice() {
            [single] => {
                let idx = column_index(single)?;
                Self::new(idx, idx)
            }
            [first, last] => Self::new(column_index(first)?, column_index(last)?),
            _ => Err(SheetError::InvalidColumns(format!(
                "Expected format 'A:K', got '{}'",
                span
            ))),
        }
    }

    pub fn width(&self) -> usize {
        self.last - self.first + 1
    }

    /// Worksheet column indices covered by the span
    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

impl Default for ColumnSpan {
    fn default() -> Self {
        // A..K
        Self { first: 0, last: 10 }
    }
}

impl fmt::Display for ColumnSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", column_letter(self.first), column_letter(self.last))
    }
}

impl TryFrom<String> for ColumnSpan {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColumnSpan> for String {
    fn from(span: ColumnSpan) -> Self {
        span.to_string()
    }
}

/// Convert column letters to a 0-based index (A=0, Z=25, AA=26)
pub fn column_index(letters: &str) -> SheetResult<usize> {
    let letters = letters.trim().to_uppercase();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(SheetError::InvalidColumns(format!(
            "Invalid column letters '{}'",
            letters
        )));
    }
    let mut result: usize = 0;
    for c in letters.chars() {
        result = result
            .checked_mul(26)
            .and_then(|r| r.checked_add(c as usize - 'A' as usize + 1))
            .ok_or_else(|| {
                SheetError::InvalidColumns(format!("Column '{}' is out of range", letters))
            })?;
    }
    Ok(result - 1)
}

/// Convert a 0-based column index to letters (0→A, 25→Z, 26→AA)
pub fn column_letter(n: usize) -> String {
    let mut result = String::new();
    let mut num = n;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

/// Lowercased name with whitespace removed, for loose column matching
pub fn column_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

//==============================================================================
// Extracted rows
//==============================================================================

/// A single worksheet value, detached from the reader
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Already rendered as `YYYY-MM-DD HH:MM:SS`
    DateTime(String),
    Error(String),
}

impl CellValue {
    /// Trimmed display form written to the CSV
    pub fn text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{:.0}", f)
                } else {
                    f.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(s) => s.clone(),
            CellValue::Error(e) => format!("#ERROR: {}", e),
        }
    }

    /// Blank for the purposes of the key-column stop rule
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            CellValue::Int(_) | CellValue::Float(_) => true,
            CellValue::Text(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        }
    }
}

/// One worksheet row keyed by the resolved column names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowRecord {
    values: Vec<(String, CellValue)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: CellValue) {
        self.values.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Text form of a column, empty when the column is absent
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(CellValue::text).unwrap_or_default()
    }

    /// Replace (or append) a column value
    pub fn set(&mut self, column: &str, value: CellValue) {
        match self.values.iter_mut().find(|(name, _)| name == column) {
            Some(slot) => slot.1 = value,
            None => self.values.push((column.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows read from one worksheet region
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetExtract {
    /// 1-based worksheet row holding the labels
    pub header_row: usize,
    pub columns: Vec<String>,
    pub rows: Vec<RowRecord>,
    /// The row cap stopped the read before a blank key cell
    pub truncated: bool,
    /// Rows skipped because their key was not numeric (strict mode)
    pub skipped: usize,
}

impl SheetExtract {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Append a derived column to the column set (no-op if already present)
    pub fn add_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }
}
