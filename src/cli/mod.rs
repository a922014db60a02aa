//! CLI command handlers

pub mod commands;
pub mod view;

pub use commands::{init_config, publish, watch, PublishOptions};
pub use view::{view, ViewOptions};

/// Install the stderr log subscriber; `RUST_LOG` wins over `verbose`
pub fn init_logging(verbose: bool) {
    let default = if verbose { "sheetcast=debug" } else { "sheetcast=info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .try_init();
}
