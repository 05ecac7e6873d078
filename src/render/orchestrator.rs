//! Render pass over a page tree.
//!
//! # Architecture
//!
//! ```text
//! RenderOrchestrator::run()
//!     │
//!     ├── plan() ──► one RenderUnit per leaf, depth-first,
//!     │              each holding the layout chain of its node
//!     │
//!     └── run_batched() ──► units in fixed-size batches
//!             │
//!             ├── Static           render_page → wrap → resolve → write
//!             ├── CollectionItem   render_items ─┐
//!             └── CollectionGroup  render_groups ┴► next() → wrap → resolve → write
//! ```
//!
//! Blank markup is the "no content" signal: the artifact is skipped without
//! error. Anything a collaborator reports as an error aborts the pass.

use super::{
    batch::{self, DEFAULT_BATCH_SIZE},
    cancel::CancelToken,
    error::BuildError,
    traits::{Collection, CollectionCatalog, FileWriter, ItemStream, PageCatalog, PagesRoot},
};
use crate::{
    log,
    site::{
        Leaf, LeafKind, Node,
        slug::{self, OutputLocation},
    },
};
use anyhow::anyhow;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Tuning of a render pass.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Units started together.
    pub batch_size: usize,
    /// Log every written file.
    pub verbose: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            verbose: false,
        }
    }
}

/// Outcome of a successful render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Render units executed (one per non-layout template).
    pub units: usize,
    /// Files handed to the writer.
    pub written: usize,
    /// Artifacts dropped for blank markup.
    pub skipped: usize,
}

/// Per-unit tally, summed into [`RenderStats`].
#[derive(Debug, Clone, Copy, Default)]
struct UnitReport {
    written: usize,
    skipped: usize,
}

impl UnitReport {
    fn record(&mut self, written: bool) {
        if written {
            self.written += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// One template together with the layout chain of its directory.
#[derive(Debug)]
struct RenderUnit {
    leaf: Leaf,
    layouts: Arc<[Leaf]>,
}

/// Collect render units depth-first.
fn plan(node: &Node, units: &mut Vec<RenderUnit>) {
    let layouts: Arc<[Leaf]> = node.layouts().into();
    units.extend(node.leaves().iter().map(|leaf| RenderUnit {
        leaf: leaf.clone(),
        layouts: Arc::clone(&layouts),
    }));
    for child in node.children() {
        plan(child, units);
    }
}

/// Which stream a dynamic template expands.
#[derive(Debug, Clone, Copy)]
enum Expansion {
    Items,
    Groups,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives the render pass of one build.
pub struct RenderOrchestrator<P, C, W> {
    pages: Arc<P>,
    collections: Arc<C>,
    writer: Arc<W>,
    options: RenderOptions,
    cancel: CancelToken,
}

impl<P, C, W> RenderOrchestrator<P, C, W>
where
    P: PageCatalog,
    C: CollectionCatalog,
    W: FileWriter,
{
    pub fn new(pages: Arc<P>, collections: Arc<C>, writer: Arc<W>, options: RenderOptions) -> Self {
        Self {
            pages,
            collections,
            writer,
            options,
            cancel: CancelToken::new(),
        }
    }

    /// Observe `cancel` instead of a private token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Render every template of `root`. Output locations are relative to
    /// `pages`' root.
    pub async fn run(
        &self,
        root: &Node,
        pages: &(impl PagesRoot + ?Sized),
    ) -> Result<RenderStats, BuildError> {
        self.run_with_progress(root, pages, || {}).await
    }

    /// Like [`run`](Self::run), calling `on_unit` whenever a unit finishes.
    pub async fn run_with_progress(
        &self,
        root: &Node,
        pages: &(impl PagesRoot + ?Sized),
        on_unit: impl Fn(),
    ) -> Result<RenderStats, BuildError> {
        let mut units = Vec::new();
        plan(root, &mut units);
        let total = units.len();

        let context = UnitContext {
            pages: Arc::clone(&self.pages),
            collections: Arc::clone(&self.collections),
            writer: Arc::clone(&self.writer),
            cancel: self.cancel.clone(),
            pages_root: pages.pages_root().into(),
            verbose: self.options.verbose,
        };

        let futures: Vec<_> = units
            .into_iter()
            .map(|unit| {
                let context = context.clone();
                async move { context.render_unit(unit).await }
            })
            .collect();

        let reports =
            batch::run_batched(futures, self.options.batch_size, &self.cancel, &on_unit).await?;

        Ok(reports.into_iter().fold(
            RenderStats {
                units: total,
                ..RenderStats::default()
            },
            |mut stats, report| {
                stats.written += report.written;
                stats.skipped += report.skipped;
                stats
            },
        ))
    }
}

// ============================================================================
// Unit Execution
// ============================================================================

/// Everything a spawned unit needs, owned.
struct UnitContext<P, C, W> {
    pages: Arc<P>,
    collections: Arc<C>,
    writer: Arc<W>,
    cancel: CancelToken,
    pages_root: Arc<Path>,
    verbose: bool,
}

impl<P, C, W> Clone for UnitContext<P, C, W> {
    fn clone(&self) -> Self {
        Self {
            pages: Arc::clone(&self.pages),
            collections: Arc::clone(&self.collections),
            writer: Arc::clone(&self.writer),
            cancel: self.cancel.clone(),
            pages_root: Arc::clone(&self.pages_root),
            verbose: self.verbose,
        }
    }
}

impl<P, C, W> UnitContext<P, C, W>
where
    P: PageCatalog,
    C: CollectionCatalog,
    W: FileWriter,
{
    async fn render_unit(self, unit: RenderUnit) -> Result<UnitReport, BuildError> {
        self.cancel.check()?;
        match unit.leaf.kind() {
            LeafKind::Static => self.render_static(&unit).await,
            LeafKind::CollectionItem => self.render_collection(&unit, Expansion::Items).await,
            LeafKind::CollectionGroup => self.render_collection(&unit, Expansion::Groups).await,
        }
    }

    async fn render_static(&self, unit: &RenderUnit) -> Result<UnitReport, BuildError> {
        let path = unit.leaf.full_path();
        let body = self
            .pages
            .render_page(path)
            .await
            .map_err(BuildError::render(path))?;

        let location = slug::resolve(path, &self.pages_root, false, None);
        let mut report = UnitReport::default();
        report.record(self.emit(&unit.layouts, path, body, location).await?);
        Ok(report)
    }

    async fn render_collection(
        &self,
        unit: &RenderUnit,
        expansion: Expansion,
    ) -> Result<UnitReport, BuildError> {
        let path = unit.leaf.full_path();
        let mut report = UnitReport::default();

        let Some(collection) = self.collections.try_get_collection(path) else {
            return Ok(report);
        };

        let page = self.pages.page_id(path).map_err(BuildError::render(path))?;
        let mut items = match expansion {
            Expansion::Items => collection.render_items(&page, &self.cancel),
            Expansion::Groups => collection.render_groups(&page, &self.cancel),
        }
        .map_err(BuildError::render(path))?;

        let route_dir = path.parent().unwrap_or(&*self.pages_root);

        loop {
            self.cancel.check()?;
            let Some(artifact) = items.next().await.map_err(BuildError::render(path))? else {
                break;
            };

            if artifact.key.trim().is_empty() {
                return Err(BuildError::render(path)(anyhow!(
                    "collection `{}` produced an item with a blank key",
                    collection.root_path().display()
                )));
            }

            let location = match expansion {
                Expansion::Items => slug::resolve_item(
                    &artifact.key,
                    collection.root_path(),
                    route_dir,
                    &self.pages_root,
                ),
                Expansion::Groups => {
                    slug::resolve(path, &self.pages_root, false, Some(&artifact.key))
                }
            };

            let source = PathBuf::from(&artifact.key);
            report.record(self.emit(&unit.layouts, &source, artifact.markup, location).await?);
        }

        Ok(report)
    }

    /// Wrap, then write unless the markup is blank. Returns whether a file was
    /// written.
    async fn emit(
        &self,
        layouts: &[Leaf],
        source: &Path,
        body: String,
        location: OutputLocation,
    ) -> Result<bool, BuildError> {
        if body.trim().is_empty() {
            return Ok(false);
        }

        let markup = self.wrap(layouts, source, body).await?;
        if markup.trim().is_empty() {
            return Ok(false);
        }

        self.cancel.check()?;
        self.writer
            .write(markup, &location.file_name, &location.directory)
            .await
            .map_err(|source| BuildError::Write {
                path: location.relative_path(),
                source,
            })?;

        if self.verbose {
            log!("render"; "{}", location.url());
        }
        Ok(true)
    }

    /// Apply layouts innermost first.
    async fn wrap(&self, layouts: &[Leaf], source: &Path, body: String) -> Result<String, BuildError> {
        let mut body = body;
        for layout in layouts.iter().rev() {
            self.cancel.check()?;
            body = self
                .pages
                .render_layout(layout.full_path(), body)
                .await
                .map_err(|err| {
                    BuildError::render(layout.full_path())(
                        err.context(format!("while wrapping `{}`", source.display())),
                    )
                })?;
        }
        Ok(body)
    }
}

// ============================================================================
// Tests
// ============================================================================
