use clap::{Parser, Subcommand};
use sheetcast::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetcast")]
#[command(about = "Publish a worksheet range as CSV, optionally pushed with git.")]
#[command(long_about = "sheetcast - worksheet to CSV publisher

Reads a fixed column span (A:K by default) from one worksheet, finds the
header row, stops at the first blank key cell, formats percent and money
columns, adds a pipe-delimited payload column, and writes:

  data/latest.csv       the published table
  data/updated_at.txt   publish timestamp

COMMANDS:
  publish      - Publish once
  watch        - Publish again on every workbook save
  init-config  - Write a default sheetcast.yaml

EXAMPLES:
  sheetcast publish -w ncaa.xlsm -s Edges
  sheetcast publish --columns A:L --strict --sync
  sheetcast watch -w ncaa.xlsm

View the result with sheetcast-view.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the worksheet once
    Publish(cli::PublishOptions),

    /// Publish, then re-publish whenever the workbook changes
    Watch(cli::PublishOptions),

    /// Write a commented default config file
    InitConfig {
        /// Destination (default: sheetcast.yaml)
        file: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish(options) => {
            cli::init_logging(options.verbose);
            cli::publish(&options)?;
        }
        Commands::Watch(options) => {
            cli::init_logging(options.verbose);
            cli::watch(&options)?;
        }
        Commands::InitConfig { file } => {
            cli::init_logging(false);
            cli::init_config(file)?;
        }
    }

    Ok(())
}
