//! `[build]` section configuration.
//!
//! Directory layout, template naming conventions and render tuning.

use super::defaults;
use crate::site::Conventions;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in canopy.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// pages = "pages"          # Template root
/// content = "content"      # Collection content root
/// output = "out"           # Output directory
/// extension = "tmpl"       # Template file extension
/// batch_size = 10          # Render units started together
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Page template directory.
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Content directory holding collection sources.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Files copied verbatim into the output.
    #[serde(rename = "static", default = "defaults::build::static_dir")]
    #[educe(Default = defaults::build::static_dir())]
    pub static_dir: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Extension of page templates, without the dot.
    #[serde(default = "defaults::build::extension")]
    #[educe(Default = defaults::build::extension())]
    pub extension: String,

    /// File stem of per-directory layout templates.
    #[serde(default = "defaults::build::layout")]
    #[educe(Default = defaults::build::layout())]
    pub layout: String,

    /// File stem of the home page required at the pages root.
    #[serde(default = "defaults::build::home")]
    #[educe(Default = defaults::build::home())]
    pub home: String,

    /// Render units started together.
    #[serde(default = "defaults::build::batch_size")]
    #[educe(Default = defaults::build::batch_size())]
    pub batch_size: usize,

    /// Concurrent template render sessions.
    #[serde(default = "defaults::build::render_sessions")]
    #[educe(Default = defaults::build::render_sessions())]
    pub render_sessions: usize,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Log every written file.
    #[serde(skip)]
    pub verbose: bool,
}

impl BuildConfig {
    pub fn conventions(&self) -> Conventions {
        Conventions {
            layout: self.layout.clone(),
            home: self.home.clone(),
        }
    }
}
