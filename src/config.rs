//! Configuration for the publisher and the viewer
//!
//! Both halves read the same YAML file (`sheetcast.yaml` by default):
//!
//! ```yaml
//! publish:
//!   workbook: "ncaa.xlsm"
//!   sheet: "Edges"
//!   columns: "A:K"
//!   max_rows: 300
//!   sync: true
//! viewer:
//!   repo: "owner/excel-viewer"
//!   branch: "main"
//! ```
//!
//! Every field has a default, and CLI flags override whatever the file says.

use crate::error::{SheetError, SheetResult};
use crate::types::ColumnSpan;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "sheetcast.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetcastConfig {
    pub publish: PublishConfig,
    pub viewer: ViewerConfig,
}

impl SheetcastConfig {
    /// Load from an explicit path, else `sheetcast.yaml` if present, else defaults
    pub fn load(path: Option<&Path>) -> SheetResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.publish.validate()?;
        config.viewer.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> SheetResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SheetError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> SheetResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Commented default config, as written by `sheetcast init-config`
    pub fn default_yaml() -> SheetResult<String> {
        let body = serde_yaml::to_string(&Self::default())?;
        Ok(format!(
            "# sheetcast configuration\n\
             # Every key is optional; CLI flags take precedence.\n\
             # Set publish.timezone to your IANA zone (e.g. America/New_York);\n\
             # the published timestamp is stamped in UTC until you do.\n{}",
            body
        ))
    }
}

//==============================================================================
// Publisher
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Source workbook (.xlsx, .xlsm, .xlsb, .xls, .ods)
    pub workbook: PathBuf,
    pub sheet: String,
    pub output: PathBuf,
    pub timestamp_path: PathBuf,
    pub write_timestamp: bool,
    /// IANA zone used for the sidecar timestamp
    pub timezone: String,
    /// Safety bound on data rows read below the header
    pub max_rows: usize,
    /// How many rows of the key column are scanned for the header token
    pub header_scan_rows: usize,
    pub columns: ColumnSpan,
    /// Skip rows whose key cell is not a number instead of keeping them
    pub numeric_keys_only: bool,
    /// Commit and push the artifact after writing it
    pub sync: bool,
    pub repo_dir: PathBuf,
    pub percent_columns: Vec<String>,
    pub money_columns: Vec<String>,
    /// 0-based position of the wager column inside the span (K = 10)
    pub wager_index: Option<usize>,
    pub payload: bool,
    pub payload_column: String,
    /// Prefix the CSV with a UTF-8 byte order mark
    pub bom: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("workbook.xlsm"),
            sheet: "Edges".to_string(),
            output: PathBuf::from("data/latest.csv"),
            timestamp_path: PathBuf::from("data/updated_at.txt"),
            write_timestamp: true,
            timezone: "UTC".to_string(),
            max_rows: 300,
            header_scan_rows: 25,
            columns: ColumnSpan::default(),
            numeric_keys_only: false,
            sync: false,
            repo_dir: PathBuf::from("."),
            percent_columns: vec!["Win%".to_string(), "Edge".to_string()],
            money_columns: vec!["Wager".to_string()],
            wager_index: Some(10),
            payload: true,
            payload_column: "QR Code".to_string(),
            bom: false,
        }
    }
}

impl PublishConfig {
    pub fn validate(&self) -> SheetResult<()> {
        if self.sheet.trim().is_empty() {
            return Err(SheetError::Config("sheet name is empty".to_string()));
        }
        if self.max_rows == 0 {
            return Err(SheetError::Config("max_rows must be at least 1".to_string()));
        }
        if self.header_scan_rows == 0 {
            return Err(SheetError::Config(
                "header_scan_rows must be at least 1".to_string(),
            ));
        }
        if self.payload && self.payload_column.trim().is_empty() {
            return Err(SheetError::Config("payload_column is empty".to_string()));
        }
        Ok(())
    }
}

//==============================================================================
// Viewer
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Local directory holding the CSV and sidecar (used when `repo` is unset)
    pub dir: PathBuf,
    /// `owner/name` of the remote repository holding the published files
    pub repo: Option<String>,
    pub branch: String,
    /// Directory of the artifact inside the remote repository
    pub remote_dir: String,
    pub csv_name: String,
    pub timestamp_name: String,
    pub raw_base: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub percent_columns: Vec<String>,
    /// Coerced to plain numbers so they never pick up percent styling
    pub numeric_columns: Vec<String>,
    pub qr: bool,
    pub qr_source_column: String,
    pub qr_column: String,
    pub qr_endpoint: String,
    pub qr_size: u32,
    pub max_cell_width: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            repo: None,
            branch: "main".to_string(),
            remote_dir: "data".to_string(),
            csv_name: "latest.csv".to_string(),
            timestamp_name: "updated_at.txt".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            api_base: "https://api.github.com".to_string(),
            timeout_secs: 20,
            cache_ttl_secs: 60,
            percent_columns: vec!["Win%".to_string(), "Edge".to_string()],
            numeric_columns: vec!["Odds".to_string()],
            qr: true,
            qr_source_column: "QR Code".to_string(),
            qr_column: "QR".to_string(),
            qr_endpoint: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
            qr_size: 150,
            max_cell_width: 40,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> SheetResult<()> {
        if let Some(repo) = &self.repo {
            let parts: Vec<&str> = repo.split('/').collect();
            if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
                return Err(SheetError::Config(format!(
                    "repo must look like 'owner/name', got '{}'",
                    repo
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(SheetError::Config("timeout_secs must be at least 1".to_string()));
        }
        if self.max_cell_width < 4 {
            return Err(SheetError::Config("max_cell_width must be at least 4".to_string()));
        }
        Ok(())
    }

    /// Repository-relative path of the CSV (`data/latest.csv`)
    pub fn remote_csv_path(&self) -> String {
        join_remote(&self.remote_dir, &self.csv_name)
    }

    pub fn remote_timestamp_path(&self) -> String {
        join_remote(&self.remote_dir, &self.timestamp_name)
    }
}

fn join_remote(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
