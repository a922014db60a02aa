use crate::config::{PublishConfig, SheetcastConfig, DEFAULT_CONFIG_FILE};
use crate::error::{SheetError, SheetResult};
use crate::publish::{publish as run_publish, PublishReport};
use crate::sync::SyncOutcome;
use crate::types::ColumnSpan;
use clap::Args;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Flags shared by `publish` and `watch`; each one overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct PublishOptions {
    /// Config file (defaults to ./sheetcast.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Workbook to read (.xlsx, .xlsm, .xlsb, .xls, .ods)
    #[arg(short, long, env = "SHEETCAST_WORKBOOK")]
    pub workbook: Option<PathBuf>,

    /// Worksheet name
    #[arg(short, long, env = "SHEETCAST_SHEET")]
    pub sheet: Option<String>,

    /// CSV output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum worksheet rows read below the header
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Column span to read, e.g. A:K
    #[arg(long)]
    pub columns: Option<String>,

    /// Skip rows whose key cell is not numeric
    #[arg(long)]
    pub strict: bool,

    /// Commit and push the published files
    #[arg(long)]
    pub sync: bool,

    /// Do not write the timestamp sidecar
    #[arg(long)]
    pub no_timestamp: bool,

    /// Prefix the CSV with a UTF-8 byte order mark
    #[arg(long)]
    pub bom: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl PublishOptions {
    /// Config file values with the command-line flags applied on top
    pub fn resolve(&self) -> SheetResult<PublishConfig> {
        let mut config = SheetcastConfig::load(self.config.as_deref())?.publish;

        if let Some(workbook) = &self.workbook {
            config.workbook = workbook.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet = sheet.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(max_rows) = self.max_rows {
            config.max_rows = max_rows;
        }
        if let Some(columns) = &self.columns {
            config.columns = ColumnSpan::parse(columns)?;
        }
        if self.strict {
            config.numeric_keys_only = true;
        }
        if self.sync {
            config.sync = true;
        }
        if self.no_timestamp {
            config.write_timestamp = false;
        }
        if self.bom {
            config.bom = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Execute the publish command
pub fn publish(options: &PublishOptions) -> SheetResult<PublishReport> {
    let config = options.resolve()?;

    println!("{}", "🔥 sheetcast - Publishing".bold().green());
    println!("   Workbook: {}", config.workbook.display());
    println!("   Sheet: {}", config.sheet.bright_yellow());
    println!("   Columns: {}\n", config.columns);

    let report = run_publish(&config)?;
    print_report(&report, &config);
    Ok(report)
}

fn print_report(report: &PublishReport, config: &PublishConfig) {
    println!("{} Header row: {}", "✅".green(), report.header_row);
    println!(
        "{} Rows: {} ({} columns)",
        "✅".green(),
        report.rows.to_string().bold(),
        report.columns.len()
    );
    if report.skipped > 0 {
        println!(
            "{} Skipped {} rows with a non-numeric key",
            "⚠️ ".yellow(),
            report.skipped
        );
    }
    if report.truncated {
        println!(
            "{} Stopped at the row cap ({}); raise max_rows to read further",
            "⚠️ ".yellow(),
            config.max_rows
        );
    }
    if let Some(payload) = &report.payload {
        println!(
            "   Pick column: {}  Wager column: {}",
            payload.pick.as_deref().unwrap_or("-").cyan(),
            payload.wager.as_deref().unwrap_or("-").cyan()
        );
    }

    println!("{} Saved: {}", "✅".green(), report.output.display());
    if let Some((path, stamp)) = &report.timestamp {
        println!("{} Timestamp: {} ({})", "✅".green(), stamp, path.display());
    }

    match &report.sync {
        Some(SyncOutcome::Pushed { commit, remote }) => {
            println!("{} Pushed {} to {}", "✅".green(), commit.bold(), remote);
        }
        Some(SyncOutcome::NoChanges) => {
            println!("{} Nothing changed, no commit made", "ℹ️ ".cyan());
        }
        None => {}
    }

    println!("⏱  {:.2}s", report.elapsed.as_secs_f64());
}

/// Execute the watch command: publish now, then again whenever the workbook is saved
pub fn watch(options: &PublishOptions) -> SheetResult<()> {
    let config = options.resolve()?;
    let workbook = config.workbook.clone();

    println!("{}", "👁️  sheetcast - Watch Mode".bold().green());
    println!("   Watching: {}", workbook.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !workbook.exists() {
        return Err(SheetError::Workbook(format!(
            "File not found: {}",
            workbook.display()
        )));
    }

    let canonical_path = workbook.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| SheetError::Watch("Cannot determine parent directory".to_string()))?;

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
        .map_err(|e| SheetError::Watch(format!("Failed to create file watcher: {}", e)))?;
    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| SheetError::Watch(format!("Failed to watch directory: {}", e)))?;

    println!("{}", "🔄 Initial publish...".cyan());
    run_watch_action(options);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && is_workbook_event(&event.path, &canonical_path)
                });
                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(options);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// Saves of the workbook itself; Excel's `~$` lock files are ignored
pub fn is_workbook_event(path: &Path, workbook: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    if name.to_string_lossy().starts_with("~$") {
        return false;
    }
    if let Ok(canonical) = path.canonicalize() {
        if canonical == workbook {
            return true;
        }
    }
    Some(name) == workbook.file_name()
}

fn run_watch_action(options: &PublishOptions) {
    // The config file is re-read on every change
    if let Err(e) = publish(options) {
        eprintln!("{} {}", "❌".red(), e);
    }
}

/// Write a commented default config file; refuses to overwrite
pub fn init_config(path: Option<PathBuf>) -> SheetResult<PathBuf> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if path.exists() {
        return Err(SheetError::Config(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&path, SheetcastConfig::default_yaml()?)?;
    println!("{} Wrote {}", "✅".green(), path.display());
    Ok(path)
}
