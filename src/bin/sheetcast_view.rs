//! sheetcast viewer
//!
//! Shows the latest published board from a local directory or a remote
//! repository. Run with: `sheetcast-view --repo owner/name`

use clap::Parser;
use sheetcast::cli::{self, ViewOptions};

#[derive(Parser, Debug)]
#[command(name = "sheetcast-view")]
#[command(version)]
#[command(about = "View the latest published sheetcast board")]
struct Cli {
    #[command(flatten)]
    options: ViewOptions,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.options.verbose);
    cli::view(&cli.options)?;
    Ok(())
}
