//! Published artifact: the CSV and its timestamp sidecar

use crate::error::{SheetError, SheetResult};
use crate::types::SheetExtract;
use chrono::Utc;
use chrono_tz::Tz;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Overwrite `path` with the extract as CSV (header row first)
pub fn write_csv(path: &Path, extract: &SheetExtract, bom: bool) -> SheetResult<()> {
    ensure_parent(path)?;

    let mut file = BufWriter::new(File::create(path)?);
    if bom {
        file.write_all(UTF8_BOM)?;
    }

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&extract.columns)?;
    for row in &extract.rows {
        let record: Vec<String> = extract.columns.iter().map(|col| row.text(col)).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Current time in `timezone` as `YYYY-MM-DD HH:MM:SS TZ`
pub fn publish_timestamp(timezone: &str) -> SheetResult<String> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| SheetError::Timezone(timezone.to_string()))?;
    Ok(Utc::now()
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string())
}

/// Overwrite the sidecar with a single timestamp line
pub fn write_timestamp(path: &Path, stamp: &str) -> SheetResult<()> {
    ensure_parent(path)?;
    fs::write(path, format!("{}\n", stamp))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> SheetResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
