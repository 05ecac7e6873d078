//! Collaborators of the render pass.
//!
//! The orchestrator only decides *what* to render and *where* it goes. These
//! traits do the rest:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`PageCatalog`] | renders pages and layouts |
//! | [`CollectionCatalog`] | finds the collection behind a dynamic template |
//! | [`Collection`] / [`ItemStream`] | expands one dynamic template lazily |
//! | [`FileWriter`] | persists finished markup |
//! | [`PagesRoot`] | where templates are discovered |

use super::cancel::CancelToken;
use anyhow::Result;
use std::{fmt, future::Future, io, path::Path, sync::Arc};

/// Renderer-side identifier of a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Markup produced for one page instance.
///
/// `key` is the template path for static pages, the item's natural key for
/// collection items, and the group value for group pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub key: String,
    pub markup: String,
}

impl RenderedArtifact {
    pub fn new(key: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            markup: markup.into(),
        }
    }
}

/// Renders templates into markup. Usually backed by a limited pool of
/// render sessions.
pub trait PageCatalog: Send + Sync + 'static {
    fn page_id(&self, path: &Path) -> Result<PageId>;

    fn render_page(&self, path: &Path) -> impl Future<Output = Result<String>> + Send;

    /// Render `layout` around an already rendered `body`.
    fn render_layout(
        &self,
        layout: &Path,
        body: String,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Maps dynamic templates to the collections they expand.
pub trait CollectionCatalog: Send + Sync + 'static {
    type Collection: Collection;

    fn try_get_collection(&self, leaf: &Path) -> Option<Arc<Self::Collection>>;
}

/// A set of content items bound to one dynamic template.
pub trait Collection: Send + Sync + 'static {
    type Items: ItemStream;

    /// Directory the item keys are relative to.
    fn root_path(&self) -> &Path;

    /// One artifact per content item, rendered with `page`.
    fn render_items(&self, page: &PageId, cancel: &CancelToken) -> Result<Self::Items>;

    /// One artifact per distinct group value, rendered with `page`.
    fn render_groups(&self, page: &PageId, cancel: &CancelToken) -> Result<Self::Items>;
}

/// Lazy, finite, non-restartable producer of artifacts.
///
/// Each call may suspend on I/O before yielding. `Ok(None)` ends the stream.
pub trait ItemStream: Send + 'static {
    fn next(&mut self) -> impl Future<Output = Result<Option<RenderedArtifact>>> + Send;
}

/// Persists rendered markup as `<directory>/<file_name>.html`.
///
/// `directory` is relative to the output root and created on demand.
pub trait FileWriter: Send + Sync + 'static {
    fn write(
        &self,
        content: String,
        file_name: &str,
        directory: &str,
    ) -> impl Future<Output = io::Result<()>> + Send;
}

/// Root directory under which templates are discovered.
pub trait PagesRoot {
    fn pages_root(&self) -> &Path;
}

impl PagesRoot for Path {
    fn pages_root(&self) -> &Path {
        self
    }
}
