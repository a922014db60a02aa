//! sheetcast - publish a worksheet range as CSV, view it anywhere
//!
//! The publisher reads a fixed column span of one worksheet, locates the
//! header row, stops at the first blank key cell, normalizes percent and
//! money columns, derives a compact pipe-delimited payload per row, and
//! writes `data/latest.csv` plus a timestamp sidecar. Optionally the two
//! files are committed and pushed with git.
//!
//! The viewer loads those files from a local directory or from a remote
//! repository (pinned to the newest commit that touched them), cleans the
//! table up for display and turns payloads into QR image links.
//!
//! # Example
//!
//! ```no_run
//! use sheetcast::config::PublishConfig;
//! use sheetcast::publish::publish;
//! use std::path::PathBuf;
//!
//! let config = PublishConfig {
//!     workbook: PathBuf::from("ncaa.xlsm"),
//!     sheet: "Edges".to_string(),
//!     ..Default::default()
//! };
//! let report = publish(&config)?;
//! println!("{} rows -> {}", report.rows, report.output.display());
//! # Ok::<(), sheetcast::error::SheetError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod format;
pub mod payload;
pub mod publish;
pub mod sync;
pub mod types;
pub mod viewer;
pub mod writer;

// Re-export commonly used types
pub use config::{PublishConfig, SheetcastConfig, ViewerConfig};
pub use error::{SheetError, SheetResult};
pub use types::{CellValue, ColumnSpan, RowRecord, SheetExtract};
