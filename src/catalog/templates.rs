//! Tera-backed page catalog.
//!
//! Every template below the pages root is registered under its `/`-separated
//! relative path (`Blog/[slug].tmpl`). Rendering runs on the blocking pool,
//! bounded by a fixed number of render sessions.
//!
//! # Template context
//!
//! | Variable | Available in | Content |
//! |----------|--------------|---------|
//! | `site`    | all     | `[base]` fields plus `extra` |
//! | `page`    | pages   | `path`, `url` of the template |
//! | `content` | layouts | the wrapped body |
//! | item/group fields | collection pages | see `catalog::collections` |

use crate::{
    config::SiteConfig,
    render::{BuildError, CancelToken, PageCatalog, PageId},
    site::slug,
};
use anyhow::{Context as _, Result, anyhow};
use rustc_hash::FxHashSet;
use serde_json::json;
use std::{
    fs,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tera::{Context, Tera};
use tokio::sync::Semaphore;
use walkdir::WalkDir;

/// Renders page, layout and collection templates with Tera.
pub struct TemplateCatalog {
    tera: Arc<Tera>,
    names: FxHashSet<String>,
    pages_root: PathBuf,
    site: serde_json::Value,
    sessions: Arc<Semaphore>,
    cancel: CancelToken,
}

impl TemplateCatalog {
    /// Load every `*.{extension}` file below `pages_root`.
    pub fn load(
        pages_root: &Path,
        extension: &str,
        site: serde_json::Value,
        sessions: usize,
    ) -> Result<Self> {
        let mut sources = Vec::new();
        for entry in WalkDir::new(pages_root).sort_by_file_name() {
            let entry = entry.context("Failed to scan pages directory")?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != extension) {
                continue;
            }
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read template `{}`", path.display()))?;
            sources.push((template_name(path, pages_root)?, source));
        }

        let names = sources.iter().map(|(name, _)| name.clone()).collect();
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(sources)
            .map_err(|err| anyhow!("{}", error_chain(&err)))
            .context("Failed to parse templates")?;

        Ok(Self {
            tera: Arc::new(tera),
            names,
            pages_root: pages_root.to_path_buf(),
            site,
            sessions: Arc::new(Semaphore::new(sessions.max(1))),
            cancel: CancelToken::new(),
        })
    }

    /// Load templates with the site context and session count of `config`.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::load(
            &config.build.pages,
            &config.build.extension,
            site_context(config),
            config.build.render_sessions,
        )
    }

    /// Stop waiting for render sessions once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn pages_root(&self) -> &Path {
        &self.pages_root
    }

    pub fn template_count(&self) -> usize {
        self.names.len()
    }

    /// Context holding `site`, to be extended per render.
    pub fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context
    }

    /// Render `page` with `context` inside a render session.
    ///
    /// Waiting for a free session ends with [`BuildError::Cancelled`] when
    /// `cancel` fires.
    pub async fn render_with(
        &self,
        page: &PageId,
        context: Context,
        cancel: &CancelToken,
    ) -> Result<String> {
        cancel.check()?;
        let _session = tokio::select! {
            session = Arc::clone(&self.sessions).acquire_owned() => {
                session.context("Render sessions closed")?
            }
            () = cancel.cancelled() => return Err(BuildError::Cancelled.into()),
        };

        let tera = Arc::clone(&self.tera);
        let name = page.as_str().to_owned();
        tokio::task::spawn_blocking(move || {
            tera.render(&name, &context)
                .map_err(|err| anyhow!("{}", error_chain(&err)))
        })
        .await
        .context("Render session panicked")?
    }

    fn page_context(&self, path: &Path) -> Context {
        let mut context = self.base_context();
        let location = slug::resolve(path, &self.pages_root, false, None);
        context.insert(
            "page",
            &json!({
                "path": path.strip_prefix(&self.pages_root).unwrap_or(path).to_string_lossy(),
                "url": location.url(),
            }),
        );
        context
    }
}

impl PageCatalog for TemplateCatalog {
    fn page_id(&self, path: &Path) -> Result<PageId> {
        let name = template_name(path, &self.pages_root)?;
        if !self.names.contains(&name) {
            return Err(anyhow!("Template `{name}` is not loaded"));
        }
        Ok(PageId::new(name))
    }

    async fn render_page(&self, path: &Path) -> Result<String> {
        let page = self.page_id(path)?;
        self.render_with(&page, self.page_context(path), &self.cancel).await
    }

    async fn render_layout(&self, layout: &Path, body: String) -> Result<String> {
        let page = self.page_id(layout)?;
        let mut context = self.base_context();
        context.insert("content", &body);
        self.render_with(&page, context, &self.cancel).await
    }
}

/// `site` variable of every template.
pub fn site_context(config: &SiteConfig) -> serde_json::Value {
    json!({
        "title": config.base.title,
        "description": config.base.description,
        "url": config.base.url,
        "extra": config.extra,
    })
}

/// Template name of `path`: its `/`-joined path below `pages_root`.
pub fn template_name(path: &Path, pages_root: &Path) -> Result<String> {
    let relative = path.strip_prefix(pages_root).with_context(|| {
        format!(
            "Template `{}` is outside `{}`",
            path.display(),
            pages_root.display()
        )
    })?;

    Ok(relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/"))
}

/// Tera hides the useful message in its source chain.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
