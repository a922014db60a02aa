use crate::config::{SheetcastConfig, ViewerConfig};
use crate::error::SheetResult;
use crate::viewer::{render_html, render_terminal, ViewState, ViewerSession};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ViewOptions {
    /// Config file (defaults to ./sheetcast.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Local directory holding latest.csv and updated_at.txt (wins over --repo)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Remote repository (owner/name) to read the published files from
    #[arg(short, long, env = "SHEETCAST_REPO")]
    pub repo: Option<String>,

    /// Branch of the remote repository
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Render once and exit
    #[arg(long)]
    pub once: bool,

    /// Also write the board to an HTML file
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Keep the raw payload column instead of QR images
    #[arg(long)]
    pub no_qr: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ViewOptions {
    pub fn resolve(&self) -> SheetResult<ViewerConfig> {
        let mut config = SheetcastConfig::load(self.config.as_deref())?.viewer;

        if let Some(repo) = &self.repo {
            config.repo = Some(repo.clone());
        }
        // An explicit directory always means local mode
        if let Some(dir) = &self.dir {
            config.dir = dir.clone();
            config.repo = None;
        }
        if let Some(branch) = &self.branch {
            config.branch = branch.clone();
        }
        if self.no_qr {
            config.qr = false;
        }

        config.validate()?;
        Ok(config)
    }
}

enum Action {
    Refresh,
    Quit,
}

/// Execute the view command
pub fn view(options: &ViewOptions) -> SheetResult<()> {
    let config = options.resolve()?;
    let mut session = ViewerSession::from_config(config)?;

    println!("{}", "📡 sheetcast - Viewer".bold().green());
    println!("   Source: {}\n", session.describe());

    let mut state = session.load();
    loop {
        match state {
            Ok(ViewState::Ready(view)) => {
                print!("{}", render_terminal(&view, session.config().max_cell_width));
                if let Some(path) = &options.html {
                    fs::write(path, render_html(&view, session.config().qr_size))?;
                    println!("{} Wrote {}", "✅".green(), path.display());
                }
            }
            Ok(ViewState::NoData { source }) => {
                println!(
                    "{} No published data yet at {}",
                    "⚠️ ".yellow(),
                    source.bold()
                );
            }
            Err(e) if options.once => return Err(e),
            Err(e) => {
                eprintln!("{} {}", "❌".red(), e);
            }
        }

        if options.once {
            break;
        }
        match prompt()? {
            Action::Refresh => state = session.refresh(),
            Action::Quit => break,
        }
    }

    Ok(())
}

fn prompt() -> SheetResult<Action> {
    print!("\n[r]efresh  [q]uit > ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(Action::Quit);
    }
    Ok(parse_action(&line))
}

fn parse_action(line: &str) -> Action {
    match line.trim().to_lowercase().as_str() {
        "q" | "quit" | "exit" => Action::Quit,
        _ => Action::Refresh,
    }
}
