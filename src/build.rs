//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── prepare()
//!     │       ├── TemplateCatalog::from_config()     parse every template
//!     │       ├── ContentCollections::from_config()  discover content + groups
//!     │       └── PageTreeBuilder::build_with()      structural checks
//!     │
//!     ├── clear_output()                             only for clean builds
//!     │
//!     ├── RenderOrchestrator::run_with_progress()    tokio runtime, batched
//!     │
//!     └── assets::copy_static()                      rayon
//! ```
//!
//! Nothing is written before the tree passes its structural checks.

use crate::{
    assets,
    catalog::{ContentCollections, TemplateCatalog},
    config::SiteConfig,
    log,
    logger::{ProgressBars, format_elapsed},
    render::{
        BuildError, CancelToken, FsWriter, PagesRoot, RenderOptions, RenderOrchestrator,
        RenderStats,
    },
    site::{Node, PageTreeBuilder},
};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

/// Outcome of a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub render: RenderStats,
    /// Static files copied.
    pub assets: usize,
    pub elapsed: Duration,
}

/// Everything the render pass needs, loaded and checked.
struct Prepared {
    catalog: Arc<TemplateCatalog>,
    collections: Arc<ContentCollections>,
    tree: Node,
}

/// Template files of the pages root, sorted.
pub fn discover_templates(pages: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<_> = assets::collect_all_files(pages)
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    files
}

fn prepare(config: &SiteConfig, cancel: &CancelToken) -> Result<Prepared> {
    let pages = config.pages_root();
    let files = discover_templates(pages, &config.build.extension);

    let catalog = Arc::new(TemplateCatalog::from_config(config)?.with_cancel(cancel.clone()));
    let collections = Arc::new(ContentCollections::from_config(config, Arc::clone(&catalog))?);

    let tree = PageTreeBuilder::new(config.build.conventions())
        .build_with(&files, pages, |leaf| collections.is_group_route(leaf))
        .map_err(BuildError::from)?;

    Ok(Prepared {
        catalog,
        collections,
        tree,
    })
}

/// Build the entire site into `[build] output`.
///
/// Fails without writing anything on structural errors. A render failure or
/// cancellation stops the pass after the current batch; finished batches stay
/// on disk.
pub fn build_site(config: &SiteConfig, cancel: &CancelToken) -> Result<BuildSummary> {
    let started = Instant::now();

    log!("build"; "loading templates...");
    let Prepared {
        catalog,
        collections,
        tree,
    } = prepare(config, cancel)?;

    if tree.is_empty() {
        log!("warn"; "no `*.{}` templates in {}", config.build.extension, config.build.pages.display());
        return Ok(BuildSummary::default());
    }
    log!(
        "build";
        "{} templates, {} collections",
        catalog.template_count(),
        collections.len()
    );

    if config.build.clean {
        clear_output(&config.build.output)?;
    }

    let render = render_tree(config, &tree, catalog, collections, cancel)?;

    cancel.check()?;
    let assets = assets::copy_static(config)?;

    let summary = BuildSummary {
        render,
        assets,
        elapsed: started.elapsed(),
    };
    log!(
        "build";
        "done: {} files written, {} skipped, {} assets in {}",
        summary.render.written,
        summary.render.skipped,
        summary.assets,
        format_elapsed(summary.elapsed)
    );
    Ok(summary)
}

fn render_tree(
    config: &SiteConfig,
    tree: &Node,
    catalog: Arc<TemplateCatalog>,
    collections: Arc<ContentCollections>,
    cancel: &CancelToken,
) -> Result<RenderStats> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start render runtime")?;

    let options = RenderOptions {
        batch_size: config.build.batch_size,
        verbose: config.build.verbose,
    };
    let writer = Arc::new(FsWriter::new(&config.build.output));
    let orchestrator =
        RenderOrchestrator::new(catalog, collections, writer, options).with_cancel(cancel.clone());

    log!("render"; "rendering {} pages...", tree.page_count());
    let progress = ProgressBars::new_filtered(&[("render", tree.page_count())]);
    let result = runtime.block_on(orchestrator.run_with_progress(tree, config, || {
        if let Some(progress) = &progress {
            progress.inc_by_name("render");
        }
    }));
    if let Some(progress) = progress {
        progress.finish();
    }

    result.map_err(|err| {
        let cancelled = err.is_cancelled();
        let err = anyhow::Error::from(err);
        if !cancelled {
            log!("error"; "{:#}", err);
        }
        err
    })
}

fn clear_output(output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    Ok(())
}

/// Print the page tree of `config` without rendering.
pub fn print_tree(config: &SiteConfig) -> Result<()> {
    let Prepared { tree, .. } = prepare(config, &CancelToken::new())?;

    if tree.is_empty() {
        log!("tree"; "no templates in {}", config.build.pages.display());
        return Ok(());
    }
    log!(
        "tree";
        "{} nodes, {} pages\n{}",
        tree.node_count(),
        tree.page_count(),
        tree.render_tree().trim_end()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionConfig, GroupConfig};
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(root: &Path, name: &str) -> String {
        fs::read_to_string(root.join(name)).unwrap()
    }

    fn blog_site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write(root, "pages/Layout.tmpl", "<html>{{ content }}</html>");
        write(root, "pages/Index.tmpl", "<h1>{{ site.title }}</h1>");
        write(root, "pages/404.tmpl", "missing");
        write(root, "pages/About Me.tmpl", "about");
        write(root, "pages/Blog/Layout.tmpl", "<article>{{ content }}</article>");
        write(root, "pages/Blog/[slug].tmpl", "{{ front_matter.title }}:{{ content | trim }}");
        write(
            root,
            "pages/Blog/Tags/[tag].tmpl",
            "{% for item in items %}{{ item.url }} {% endfor %}",
        );
        write(root, "content/blog/hello.md", "---\ntitle: Hello\ntags: news\n---\nhi");
        write(
            root,
            "content/blog/2024/C# Tips.md",
            "---\ntitle: Tips\ntags:\n  - news\n  - dev\n---\ntips",
        );
        write(root, "static/css/site.css", "body {}");

        let mut config = SiteConfig::default();
        config.base.title = "Canopy".into();
        config.collections = vec![CollectionConfig {
            route: "Blog".into(),
            content: "blog".into(),
            extension: "md".into(),
            groups: vec![GroupConfig {
                route: "Blog/Tags".into(),
                group_by: "tags".into(),
            }],
        }];
        config.resolve_paths(root);
        (dir, config)
    }

    #[test]
    fn test_build_blog_site() {
        let (_dir, config) = blog_site();
        let summary = build_site(&config, &CancelToken::new()).unwrap();
        let out = &config.build.output;

        assert_eq!(read(out, "index.html"), "<html><h1>Canopy</h1></html>");
        assert_eq!(read(out, "404.html"), "<html>missing</html>");
        assert_eq!(read(out, "about-me/index.html"), "<html>about</html>");
        assert_eq!(
            read(out, "blog/hello/index.html"),
            "<html><article>Hello:<p>hi</p></article></html>"
        );
        assert_eq!(
            read(out, "blog/csharp-tips/index.html"),
            "<html><article>Tips:<p>tips</p></article></html>"
        );
        assert_eq!(
            read(out, "blog/tags/news/index.html"),
            "<html><article>/blog/csharp-tips/ /blog/hello/ </article></html>"
        );
        assert!(out.join("blog/tags/dev/index.html").exists());
        assert_eq!(read(out, "css/site.css"), "body {}");

        assert_eq!(summary.render.units, 5);
        assert_eq!(summary.render.written, 7);
        assert_eq!(summary.render.skipped, 0);
        assert_eq!(summary.assets, 1);
    }

    #[test]
    fn test_missing_home_writes_nothing() {
        let (dir, config) = blog_site();
        fs::remove_file(dir.path().join("pages/Index.tmpl")).unwrap();

        let err = build_site(&config, &CancelToken::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Structural(_))
        ));
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_clean_build_removes_stale_files() {
        let (_dir, mut config) = blog_site();
        write(&config.build.output, "stale.html", "old");

        build_site(&config, &CancelToken::new()).unwrap();
        assert!(config.build.output.join("stale.html").exists());

        config.build.clean = true;
        build_site(&config, &CancelToken::new()).unwrap();
        assert!(!config.build.output.join("stale.html").exists());
        assert!(config.build.output.join("index.html").exists());
    }

    #[test]
    fn test_cancelled_build() {
        let (_dir, config) = blog_site();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = build_site(&config, &cancel).unwrap_err();
        assert!(err.downcast_ref::<BuildError>().is_some_and(BuildError::is_cancelled));
        assert!(!config.build.output.join("index.html").exists());
    }

    #[test]
    fn test_empty_pages_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pages")).unwrap();
        let mut config = SiteConfig::default();
        config.resolve_paths(dir.path());

        let summary = build_site(&config, &CancelToken::new()).unwrap();
        assert_eq!(summary, BuildSummary::default());
    }

    #[test]
    fn test_discover_templates_filters_extension() {
        let (dir, config) = blog_site();
        write(dir.path(), "pages/notes.txt", "x");

        let files = discover_templates(&config.build.pages, "tmpl");
        assert_eq!(files.len(), 7);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_print_tree() {
        let (_dir, config) = blog_site();
        print_tree(&config).unwrap();
    }
}
