//! Display table: CSV parsing, placeholder column removal, percent and numeric
//! coercion, QR projection

use crate::config::ViewerConfig;
use crate::error::SheetResult;
use crate::format::parse_number;
use crate::types::column_key;
use regex::Regex;
use std::sync::LazyLock;

/// Payload column names tried after the configured one
const QR_FALLBACK_COLUMNS: [&str; 4] = ["QR", "QR Text", "QR Payload", "qr_text"];

/// Auto-generated column names (`Unnamed: 3`, `Col7`) that carry no data
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Unnamed: ?\d+.*|Col\d+)$").expect("placeholder pattern compiles")
});

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCell {
    Text(String),
    Number(f64),
    /// Fraction in the 0–1 range, rendered ×100
    Percent(f64),
    /// Image URL
    Image(String),
    Missing,
}

impl DisplayCell {
    pub fn display(&self) -> String {
        match self {
            DisplayCell::Text(s) => s.clone(),
            DisplayCell::Number(n) => format_number(*n),
            DisplayCell::Percent(p) => format!("{:.2}%", p * 100.0),
            DisplayCell::Image(url) => url.clone(),
            DisplayCell::Missing => String::new(),
        }
    }
}

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<DisplayCell>>,
}

impl DisplayTable {
    /// Parse CSV text (BOM tolerated) into text cells; short rows are padded
    pub fn from_csv(text: &str) -> SheetResult<Self> {
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Vec<DisplayCell> = (0..columns.len())
                .map(|i| match record.get(i) {
                    Some(v) if !v.is_empty() => DisplayCell::Text(v.to_string()),
                    _ => DisplayCell::Missing,
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &DisplayCell> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    fn remove_column(&mut self, idx: usize) -> (String, Vec<DisplayCell>) {
        let name = self.columns.remove(idx);
        let values = self
            .rows
            .iter_mut()
            .map(|row| {
                if idx < row.len() {
                    row.remove(idx)
                } else {
                    DisplayCell::Missing
                }
            })
            .collect();
        (name, values)
    }

    fn push_column(&mut self, name: String, values: Vec<DisplayCell>) {
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Apply every display normalization configured for the viewer
    pub fn normalize(mut self, config: &ViewerConfig) -> Self {
        self.drop_placeholder_columns();
        self.coerce_percent_columns(&config.percent_columns);
        self.coerce_numeric_columns(&config.numeric_columns);
        if config.qr {
            self.project_qr(config);
        }
        self
    }

    pub fn drop_placeholder_columns(&mut self) {
        let mut idx = 0;
        while idx < self.columns.len() {
            if PLACEHOLDER.is_match(&self.columns[idx]) {
                self.remove_column(idx);
            } else {
                idx += 1;
            }
        }
    }

    /// Coerce matching columns to fractions.
    ///
    /// Cells written with a trailing `%` are always divided by 100. The rest
    /// are rescaled only when their median exceeds 1.
    pub fn coerce_percent_columns(&mut self, names: &[String]) {
        for idx in self.matching_columns(names) {
            let values: Vec<Option<PercentCell>> =
                self.column_values(idx).map(percent_cell).collect();

            let bare: Vec<f64> = values
                .iter()
                .flatten()
                .filter_map(|v| match v {
                    PercentCell::Bare(n) => Some(*n),
                    PercentCell::Fraction(_) => None,
                })
                .collect();
            let scale = match median(&bare) {
                Some(m) if m > 1.0 => 100.0,
                _ => 1.0,
            };

            for (row, value) in self.rows.iter_mut().zip(values) {
                if let Some(cell) = row.get_mut(idx) {
                    *cell = match value {
                        Some(PercentCell::Fraction(f)) => DisplayCell::Percent(f),
                        Some(PercentCell::Bare(v)) => DisplayCell::Percent(v / scale),
                        None => DisplayCell::Missing,
                    };
                }
            }
        }
    }

    /// Coerce matching columns to plain numbers
    pub fn coerce_numeric_columns(&mut self, names: &[String]) {
        for idx in self.matching_columns(names) {
            for row in &mut self.rows {
                if let Some(cell) = row.get_mut(idx) {
                    *cell = match cell_number(cell) {
                        Some(v) => DisplayCell::Number(v),
                        None => DisplayCell::Missing,
                    };
                }
            }
        }
    }

    /// Replace the payload column with QR image URLs, moved last
    pub fn project_qr(&mut self, config: &ViewerConfig) {
        let source = std::iter::once(config.qr_source_column.as_str())
            .chain(QR_FALLBACK_COLUMNS)
            .find_map(|name| self.column_index(name));
        let Some(idx) = source else {
            return;
        };

        let (_, payloads) = self.remove_column(idx);
        let images = payloads
            .into_iter()
            .map(|cell| match cell {
                DisplayCell::Text(payload) if !payload.trim().is_empty() => {
                    DisplayCell::Image(qr_url(&config.qr_endpoint, config.qr_size, &payload))
                }
                _ => DisplayCell::Missing,
            })
            .collect();
        self.push_column(config.qr_column.clone(), images);
    }

    fn matching_columns(&self, names: &[String]) -> Vec<usize> {
        let keys: Vec<String> = names.iter().map(|n| column_key(n)).collect();
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| keys.contains(&column_key(c)))
            .map(|(i, _)| i)
            .collect()
    }
}

/// URL of a rendered QR image for `payload`
pub fn qr_url(endpoint: &str, size: u32, payload: &str) -> String {
    format!(
        "{}?size={}x{}&data={}",
        endpoint,
        size,
        size,
        urlencoding::encode(payload)
    )
}

/// Median of the values, averaging the middle pair for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// A percent-column cell before scaling
enum PercentCell {
    /// Already a fraction (`61.2%` or a coerced cell)
    Fraction(f64),
    /// A plain number whose scale is decided by the column median
    Bare(f64),
}

fn percent_cell(cell: &DisplayCell) -> Option<PercentCell> {
    match cell {
        DisplayCell::Percent(f) => Some(PercentCell::Fraction(*f)),
        DisplayCell::Text(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',').collect();
            let cleaned = cleaned.trim();
            match cleaned.strip_suffix('%') {
                Some(stripped) => parse_number(stripped).map(|v| PercentCell::Fraction(v / 100.0)),
                None => parse_number(cleaned).map(PercentCell::Bare),
            }
        }
        _ => cell_number(cell).map(PercentCell::Bare),
    }
}

fn cell_number(cell: &DisplayCell) -> Option<f64> {
    match cell {
        DisplayCell::Number(n) | DisplayCell::Percent(n) => Some(*n),
        DisplayCell::Text(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',').collect();
            parse_number(&cleaned)
        }
        DisplayCell::Image(_) | DisplayCell::Missing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn column(table: &DisplayTable, name: &str) -> Vec<String> {
        let idx = table.column_index(name).unwrap();
        table.column_values(idx).map(DisplayCell::display).collect()
    }

    #[test]
    fn test_from_csv_pads_and_strips_bom() {
        let table = DisplayTable::from_csv("\u{feff}a,b,c\n1,,3\n4\n").unwrap();
        assert_eq!(table.columns, names(&["a", "b", "c"]));
        assert_eq!(
            table.rows[0],
            vec![
                DisplayCell::Text("1".into()),
                DisplayCell::Missing,
                DisplayCell::Text("3".into())
            ]
        );
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_from_csv_empty() {
        assert_eq!(DisplayTable::from_csv("").unwrap(), DisplayTable::default());
    }

    #[test]
    fn test_drop_placeholder_columns() {
        let mut table =
            DisplayTable::from_csv("Event #,Unnamed: 3,Col7,Home,Column\n1,,,Duke,x\n").unwrap();
        table.drop_placeholder_columns();
        assert_eq!(table.columns, names(&["Event #", "Home", "Column"]));
        assert_eq!(column(&table, "Home"), vec!["Duke"]);
    }

    #[test]
    fn test_placeholder_pattern_shared_across_tables() {
        for header in ["Unnamed: 0,Edge\n,1\n", "Col12,Edge\n,1\n"] {
            let mut table = DisplayTable::from_csv(header).unwrap();
            table.drop_placeholder_columns();
            assert_eq!(table.columns, names(&["Edge"]));
        }
        assert!(PLACEHOLDER.is_match("Unnamed:4_level_1"));
        assert!(!PLACEHOLDER.is_match("Colour"));
    }

    #[test]
    fn test_percent_median_above_one_rescales() {
        let mut table = DisplayTable::from_csv("Win%\n55\n60.5%\n1.5\n").unwrap();
        table.coerce_percent_columns(&names(&["win %"]));
        assert_eq!(column(&table, "Win%"), vec!["55.00%", "60.50%", "1.50%"]);
    }

    #[test]
    fn test_percent_median_at_most_one_unchanged() {
        let mut table = DisplayTable::from_csv("Edge\n0.031\n0.5\n1\nn/a\n").unwrap();
        table.coerce_percent_columns(&names(&["Edge"]));
        assert_eq!(column(&table, "Edge"), vec!["3.10%", "50.00%", "100.00%", ""]);
        let idx = table.column_index("Edge").unwrap();
        assert_eq!(table.rows[0][idx], DisplayCell::Percent(0.031));
    }

    #[test]
    fn test_percent_suffix_never_rescaled_by_median() {
        let mut table = DisplayTable::from_csv("Edge\n0.50%\n0.80%\n0.30%\n").unwrap();
        table.coerce_percent_columns(&names(&["Edge"]));
        assert_eq!(column(&table, "Edge"), vec!["0.50%", "0.80%", "0.30%"]);

        // Bare values are scaled on their own median
        let mut table = DisplayTable::from_csv("Win%\n0.5%\n55\n60\n").unwrap();
        table.coerce_percent_columns(&names(&["Win%"]));
        assert_eq!(column(&table, "Win%"), vec!["0.50%", "55.00%", "60.00%"]);
    }

    #[test]
    fn test_numeric_columns() {
        let mut table = DisplayTable::from_csv("Odds,Home\n-110,Duke\n+150,UNC\nEVEN,Kansas\n").unwrap();
        table.coerce_numeric_columns(&names(&["odds"]));
        assert_eq!(column(&table, "Odds"), vec!["-110", "150", ""]);
        assert_eq!(column(&table, "Home"), vec!["Duke", "UNC", "Kansas"]);
    }

    #[test]
    fn test_project_qr_moves_last_and_encodes() {
        let mut table =
            DisplayTable::from_csv("Event #,QR Code,Home\n1,ALC|EVT:1|V:A B,Duke\n2,,UNC\n").unwrap();
        let config = ViewerConfig::default();
        table.project_qr(&config);

        assert_eq!(table.columns, names(&["Event #", "Home", "QR"]));
        let idx = table.column_index("QR").unwrap();
        assert_eq!(
            table.rows[0][idx],
            DisplayCell::Image(
                "https://api.qrserver.com/v1/create-qr-code/?size=150x150&data=ALC%7CEVT%3A1%7CV%3AA%20B"
                    .to_string()
            )
        );
        assert_eq!(table.rows[1][idx], DisplayCell::Missing);
    }

    #[test]
    fn test_project_qr_fallback_name() {
        let mut table = DisplayTable::from_csv("qr_text,Home\nALC,Duke\n").unwrap();
        table.project_qr(&ViewerConfig::default());
        assert_eq!(table.columns, names(&["Home", "QR"]));
    }

    #[test]
    fn test_project_qr_without_payload_column() {
        let mut table = DisplayTable::from_csv("Home\nDuke\n").unwrap();
        table.project_qr(&ViewerConfig::default());
        assert_eq!(table.columns, names(&["Home"]));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[0.5, 4.0]), Some(2.25));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(-110.0), "-110");
        assert_eq!(format_number(1.25), "1.25");
        assert_eq!(format_number(0.1234567), "0.123457");
    }
}
