//! Site configuration management for `canopy.toml`.
//!
//! # Sections
//!
//! | Section           | Purpose                                        |
//! |-------------------|------------------------------------------------|
//! | `[base]`          | Site metadata (title, description, url)        |
//! | `[build]`         | Directories, template conventions, batching    |
//! | `[[collections]]` | Content collections bound to dynamic routes    |
//! | `[extra]`         | User-defined fields exposed to templates       |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Site"
//! url = "https://example.com"
//!
//! [build]
//! pages = "pages"
//! output = "out"
//! batch_size = 10
//!
//! [[collections]]
//! route = "Blog"
//! content = "blog"
//!
//! [extra]
//! analytics_id = "UA-12345"
//! ```

mod base;
mod build;
mod collections;
pub mod defaults;
mod error;

pub use base::BaseConfig;
pub use build::BuildConfig;
pub use collections::{CollectionConfig, GroupConfig};
pub use error::ConfigError;

use crate::{
    cli::{Cli, Commands},
    render::PagesRoot,
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing canopy.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Content collections
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl PagesRoot for SiteConfig {
    fn pages_root(&self) -> &Path {
        &self.build.pages
    }
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.output, cli.output.as_ref());
        Self::update_option(&mut self.build.pages, cli.pages.as_ref());
        Self::update_option(&mut self.build.content, cli.content.as_ref());

        if let Commands::Build { build_args } = &cli.command {
            self.build.clean |= build_args.clean;
            self.build.verbose = build_args.verbose;
            Self::update_option(&mut self.build.batch_size, build_args.batch_size.as_ref());
        }

        self.resolve_paths(&root);
        self.config_path = Self::normalize_path(&self.get_root().join(&cli.config));
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make every directory absolute, relative to `root`.
    ///
    /// Collection routes resolve against the pages root and collection
    /// content against the content root.
    pub fn resolve_paths(&mut self, root: &Path) {
        let expanded = shellexpand::tilde(&root.to_string_lossy()).into_owned();
        let root = Self::normalize_path(Path::new(&expanded));
        self.set_root(&root);

        self.build.pages = Self::normalize_path(&root.join(&self.build.pages));
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.static_dir = Self::normalize_path(&root.join(&self.build.static_dir));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        for collection in &mut self.collections {
            collection.route = Self::normalize_path(&self.build.pages.join(&collection.route));
            collection.content =
                Self::normalize_path(&self.build.content.join(&collection.content));
            for group in &mut collection.groups {
                group.route = Self::normalize_path(&self.build.pages.join(&group.route));
            }
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration after paths are resolved
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.batch_size == 0 {
            bail!(ConfigError::Validation(
                "[build.batch_size] must be at least 1".into()
            ));
        }

        if self.build.render_sessions == 0 {
            bail!(ConfigError::Validation(
                "[build.render_sessions] must be at least 1".into()
            ));
        }

        for (field, value) in [
            ("[build.extension]", &self.build.extension),
            ("[build.layout]", &self.build.layout),
            ("[build.home]", &self.build.home),
        ] {
            if value.trim().is_empty() {
                bail!(ConfigError::Validation(format!("{field} must not be empty")));
            }
        }

        if self.build.output == self.get_root() || self.build.output == self.build.pages {
            bail!(ConfigError::Validation(
                "[build.output] must be a dedicated directory".into()
            ));
        }

        if !self.build.pages.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.pages] `{}` not found",
                self.build.pages.display()
            )));
        }

        for collection in &self.collections {
            if collection.route.as_os_str().is_empty() || collection.content.as_os_str().is_empty()
            {
                bail!(ConfigError::Validation(
                    "[[collections]] requires `route` and `content`".into()
                ));
            }
            if collection.groups.iter().any(|g| g.group_by.trim().is_empty()) {
                bail!(ConfigError::Validation(
                    "[[collections.groups]] requires a non-empty `group_by`".into()
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
