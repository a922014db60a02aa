//! Read-only viewer for a published board
//!
//! A [`ViewerSession`] fetches the CSV and timestamp sidecar from an
//! [`ArtifactSource`] (local directory or remote repository), normalizes the
//! table for display, and hands back a [`ViewState`] for rendering.

pub mod render;
pub mod source;
pub mod table;

pub use render::{render_html, render_terminal};
pub use source::{ArtifactSource, LocalSource, RemoteSource, TtlCache};
pub use table::{DisplayCell, DisplayTable};

use crate::config::ViewerConfig;
use crate::error::SheetResult;
use tracing::{debug, warn};

/// A board ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedView {
    /// Sidecar timestamp, if one was published
    pub published: Option<String>,
    pub table: DisplayTable,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Nothing has been published at the source yet
    NoData { source: String },
    Ready(LoadedView),
}

pub struct ViewerSession {
    config: ViewerConfig,
    source: Box<dyn ArtifactSource>,
}

impl ViewerSession {
    /// Remote source when a repo is configured, local directory otherwise
    pub fn from_config(config: ViewerConfig) -> SheetResult<Self> {
        config.validate()?;
        let source: Box<dyn ArtifactSource> = if config.repo.is_some() {
            Box::new(RemoteSource::new(&config)?)
        } else {
            Box::new(LocalSource::new(&config))
        };
        Ok(Self::with_source(config, source))
    }

    pub fn with_source(config: ViewerConfig, source: Box<dyn ArtifactSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn load(&mut self) -> SheetResult<ViewState> {
        let description = self.source.describe();
        let Some(csv) = self.source.fetch_csv()? else {
            debug!("no CSV at {}", description);
            return Ok(ViewState::NoData {
                source: description,
            });
        };

        // A missing or unreadable sidecar only costs the header line
        let published = match self.source.fetch_timestamp() {
            Ok(stamp) => stamp.filter(|s| !s.is_empty()),
            Err(e) => {
                warn!("timestamp fetch failed: {}", e);
                None
            }
        };

        let table = DisplayTable::from_csv(&csv)?.normalize(&self.config);
        debug!(
            "loaded {} rows x {} cols from {}",
            table.rows.len(),
            table.columns.len(),
            description
        );

        Ok(ViewState::Ready(LoadedView {
            published,
            table,
            source: description,
        }))
    }

    /// Drop cached bodies and load again
    pub fn refresh(&mut self) -> SheetResult<ViewState> {
        self.source.clear_cache();
        self.load()
    }
}
