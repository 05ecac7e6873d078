//! Local markdown content collections.
//!
//! # Architecture
//!
//! ```text
//! [[collections]] route = "Blog", content = "blog"
//!     │
//!     ├── pages/Blog/[slug].tmpl ──► ContentCollection (items)
//!     │       one artifact per content/blog/**/*.md
//!     │
//!     └── [[collections.groups]] route = "Blog/Tags", group_by = "tags"
//!             pages/Blog/Tags/[tag].tmpl ──► ContentCollection (groups)
//!             one artifact per distinct `tags` value
//! ```
//!
//! Items are read and rendered lazily, one per `next()` call. Group membership
//! is computed up front from front matter, in parallel.
//!
//! # Template context
//!
//! Item pages get `slug`, `front_matter`, `content` (markdown as HTML) and
//! `content_path`. Group pages get `slug`, `group` and `items`, a list of
//! `{ slug, url, front_matter }` of the members.

use super::{front_matter, markdown, templates::TemplateCatalog};
use crate::{
    config::{CollectionConfig, SiteConfig},
    render::{CancelToken, Collection, CollectionCatalog, ItemStream, PageId, RenderedArtifact},
    site::slug,
};
use anyhow::{Context as _, Result, bail};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::{
    collections::{BTreeMap, VecDeque},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

// ============================================================================
// Content Items
// ============================================================================

/// One content file of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub path: PathBuf,
    /// Slug of the lower-cased file stem.
    pub slug: String,
}

impl ContentItem {
    fn new(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            slug: slug::slugify(&stem),
            path,
        }
    }
}

/// Member of a group page.
#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub slug: String,
    pub url: String,
    pub front_matter: BTreeMap<String, serde_yaml::Value>,
}

/// Items sharing one front matter value.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub members: Vec<GroupMember>,
}

/// Content files with `extension` below `dir`, sorted by path.
pub fn discover_items(dir: &Path, extension: &str) -> Vec<ContentItem> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|ext| ext == extension))
        .collect();
    paths.sort();
    paths.into_iter().map(ContentItem::new).collect()
}

/// Partition `items` by the values of `key` in their front matter.
///
/// Items without the key belong to no group. Groups are sorted by name,
/// members keep item order.
pub fn group_items(
    items: &[ContentItem],
    key: &str,
    url_of: impl Fn(&ContentItem) -> String + Sync,
) -> Result<Vec<Group>> {
    let parsed = items
        .par_iter()
        .map(|item| {
            let source = fs::read_to_string(&item.path)
                .with_context(|| format!("Failed to read `{}`", item.path.display()))?;
            let (front_matter, _) = front_matter::split(&source)
                .with_context(|| format!("Invalid front matter in `{}`", item.path.display()))?;
            let values = front_matter.values(key);
            let member = GroupMember {
                slug: item.slug.clone(),
                url: url_of(item),
                front_matter: front_matter.fields().clone(),
            };
            Ok((values, member))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<String, Vec<GroupMember>> = BTreeMap::new();
    for (values, member) in parsed {
        for value in values {
            groups.entry(value).or_default().push(member.clone());
        }
    }

    Ok(groups
        .into_iter()
        .map(|(name, members)| Group { name, members })
        .collect())
}

// ============================================================================
// Collection
// ============================================================================

#[derive(Debug)]
enum Source {
    Items(Arc<[ContentItem]>),
    Groups(Arc<[Group]>),
}

/// Content bound to one dynamic route.
pub struct ContentCollection {
    root: PathBuf,
    source: Source,
    renderer: Arc<TemplateCatalog>,
}

impl ContentCollection {
    pub fn len(&self) -> usize {
        match &self.source {
            Source::Items(items) => items.len(),
            Source::Groups(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stream(
        &self,
        pending: VecDeque<Pending>,
        page: &PageId,
        cancel: &CancelToken,
    ) -> ContentStream {
        ContentStream {
            pending,
            page: page.clone(),
            renderer: Arc::clone(&self.renderer),
            cancel: cancel.clone(),
        }
    }
}

impl Collection for ContentCollection {
    type Items = ContentStream;

    fn root_path(&self) -> &Path {
        &self.root
    }

    fn render_items(&self, page: &PageId, cancel: &CancelToken) -> Result<ContentStream> {
        let Source::Items(items) = &self.source else {
            bail!(
                "collection `{}` is bound to a group route, it has no items",
                self.root.display()
            );
        };
        let pending = items.iter().cloned().map(Pending::Item).collect();
        Ok(self.stream(pending, page, cancel))
    }

    fn render_groups(&self, page: &PageId, cancel: &CancelToken) -> Result<ContentStream> {
        let Source::Groups(groups) = &self.source else {
            bail!(
                "collection `{}` is bound to an item route, it has no groups",
                self.root.display()
            );
        };
        let pending = groups.iter().cloned().map(Pending::Group).collect();
        Ok(self.stream(pending, page, cancel))
    }
}

// ============================================================================
// Stream
// ============================================================================

#[derive(Debug)]
enum Pending {
    Item(ContentItem),
    Group(Group),
}

/// Renders one pending item or group per `next()` call.
pub struct ContentStream {
    pending: VecDeque<Pending>,
    page: PageId,
    renderer: Arc<TemplateCatalog>,
    cancel: CancelToken,
}

impl ContentStream {
    async fn render_item(&self, item: ContentItem) -> Result<RenderedArtifact> {
        let source = tokio::fs::read_to_string(&item.path)
            .await
            .with_context(|| format!("Failed to read `{}`", item.path.display()))?;
        let (front_matter, body) = front_matter::split(&source)
            .with_context(|| format!("Invalid front matter in `{}`", item.path.display()))?;

        let mut context = self.renderer.base_context();
        context.insert("slug", &item.slug);
        context.insert("front_matter", front_matter.fields());
        context.insert("content", &markdown::to_html(body));
        context.insert("content_path", &item.path.to_string_lossy());

        let markup = self
            .renderer
            .render_with(&self.page, context, &self.cancel)
            .await
            .with_context(|| format!("Failed to render item `{}`", item.path.display()))?;
        Ok(RenderedArtifact::new(item.path.to_string_lossy(), markup))
    }

    async fn render_group(&self, group: Group) -> Result<RenderedArtifact> {
        let mut context = self.renderer.base_context();
        context.insert("slug", &slug::slugify(&group.name.to_lowercase()));
        context.insert("group", &group.name);
        context.insert("items", &group.members);

        let markup = self
            .renderer
            .render_with(&self.page, context, &self.cancel)
            .await
            .with_context(|| format!("Failed to render group `{}`", group.name))?;
        Ok(RenderedArtifact::new(group.name, markup))
    }
}

impl ItemStream for ContentStream {
    async fn next(&mut self) -> Result<Option<RenderedArtifact>> {
        if self.cancel.is_cancelled() {
            self.pending.clear();
            return Ok(None);
        }
        match self.pending.pop_front() {
            Some(Pending::Item(item)) => self.render_item(item).await.map(Some),
            Some(Pending::Group(group)) => self.render_group(group).await.map(Some),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// All collections of a site, keyed by route directory.
pub struct ContentCollections {
    by_route: FxHashMap<PathBuf, Arc<ContentCollection>>,
}

impl ContentCollections {
    /// Discover content and group membership of every configured collection.
    pub fn load(
        collections: &[CollectionConfig],
        pages_root: &Path,
        renderer: Arc<TemplateCatalog>,
    ) -> Result<Self> {
        let mut by_route = FxHashMap::default();

        for config in collections {
            let items: Arc<[ContentItem]> =
                discover_items(&config.content, &config.extension).into();

            for group in &config.groups {
                let groups = group_items(&items, &group.group_by, |item| {
                    slug::resolve_item(
                        &item.path.to_string_lossy(),
                        &config.content,
                        &config.route,
                        pages_root,
                    )
                    .url()
                })?;
                by_route.insert(
                    group.route.clone(),
                    Arc::new(ContentCollection {
                        root: config.content.clone(),
                        source: Source::Groups(groups.into()),
                        renderer: Arc::clone(&renderer),
                    }),
                );
            }

            by_route.insert(
                config.route.clone(),
                Arc::new(ContentCollection {
                    root: config.content.clone(),
                    source: Source::Items(items),
                    renderer: Arc::clone(&renderer),
                }),
            );
        }

        Ok(Self { by_route })
    }

    pub fn from_config(config: &SiteConfig, renderer: Arc<TemplateCatalog>) -> Result<Self> {
        Self::load(&config.collections, &config.build.pages, renderer)
    }

    /// Whether dynamic templates in the directory of `leaf` expand groups.
    pub fn is_group_route(&self, leaf: &Path) -> bool {
        leaf.parent()
            .and_then(|dir| self.by_route.get(dir))
            .is_some_and(|c| matches!(c.source, Source::Groups(_)))
    }

    pub fn len(&self) -> usize {
        self.by_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_route.is_empty()
    }
}

impl CollectionCatalog for ContentCollections {
    type Collection = ContentCollection;

    fn try_get_collection(&self, leaf: &Path) -> Option<Arc<ContentCollection>> {
        leaf.parent().and_then(|dir| self.by_route.get(dir)).cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    struct Fixture {
        _dir: TempDir,
        pages: PathBuf,
        collections: ContentCollections,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let pages = dir.path().join("pages");
        let content = dir.path().join("content/blog");

        write(&pages, "Index.tmpl", "home");
        write(
            &pages,
            "Blog/[slug].tmpl",
            "{{ front_matter.title }}|{{ slug }}|{{ content | trim }}",
        );
        write(
            &pages,
            "Blog/Tags/[tag].tmpl",
            "{{ group }}:{% for item in items %}{{ item.slug }}@{{ item.url }};{% endfor %}",
        );
        write(
            &content,
            "First Post.md",
            "---\ntitle: First\ntags:\n  - rust\n  - web\n---\n*one*",
        );
        write(&content, "2024/second.md", "---\ntitle: Second\ntags: rust\n---\ntwo");
        write(&content, "notes.txt", "not content");

        let renderer = Arc::new(TemplateCatalog::load(&pages, "tmpl", json!({}), 2).unwrap());
        let config = CollectionConfig {
            route: pages.join("Blog"),
            content: content.clone(),
            extension: "md".into(),
            groups: vec![GroupConfig {
                route: pages.join("Blog/Tags"),
                group_by: "tags".into(),
            }],
        };
        let collections = ContentCollections::load(&[config], &pages, renderer).unwrap();

        Fixture {
            _dir: dir,
            pages,
            collections,
        }
    }

    async fn drain(stream: &mut ContentStream) -> Vec<RenderedArtifact> {
        let mut out = Vec::new();
        while let Some(artifact) = stream.next().await.unwrap() {
            out.push(artifact);
        }
        out
    }

    #[test]
    fn test_discover_items() {
        let fixture = fixture();
        let collection = fixture
            .collections
            .try_get_collection(&fixture.pages.join("Blog/[slug].tmpl"))
            .unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.root_path().ends_with("content/blog"));
    }

    #[test]
    fn test_group_route_detection() {
        let fixture = fixture();
        assert!(fixture.collections.is_group_route(&fixture.pages.join("Blog/Tags/[tag].tmpl")));
        assert!(!fixture.collections.is_group_route(&fixture.pages.join("Blog/[slug].tmpl")));
        assert!(fixture.collections.try_get_collection(&fixture.pages.join("Docs/[x].tmpl")).is_none());
    }

    #[tokio::test]
    async fn test_render_items_in_order() {
        let fixture = fixture();
        let leaf = fixture.pages.join("Blog/[slug].tmpl");
        let collection = fixture.collections.try_get_collection(&leaf).unwrap();
        let page = PageId::new("Blog/[slug].tmpl");

        let mut stream = collection.render_items(&page, &CancelToken::new()).unwrap();
        let artifacts = drain(&mut stream).await;

        assert_eq!(artifacts.len(), 2);
        assert!(artifacts[0].key.ends_with("2024/second.md"));
        assert_eq!(artifacts[0].markup, "Second|second|<p>two</p>");
        assert!(artifacts[1].key.ends_with("First Post.md"));
        assert_eq!(artifacts[1].markup, "First|first-post|<p><em>one</em></p>");
    }

    #[tokio::test]
    async fn test_render_groups() {
        let fixture = fixture();
        let leaf = fixture.pages.join("Blog/Tags/[tag].tmpl");
        let collection = fixture.collections.try_get_collection(&leaf).unwrap();
        let page = PageId::new("Blog/Tags/[tag].tmpl");

        let mut stream = collection.render_groups(&page, &CancelToken::new()).unwrap();
        let artifacts = drain(&mut stream).await;

        let keys: Vec<_> = artifacts.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["rust", "web"]);
        assert_eq!(
            artifacts[0].markup,
            "rust:second@/blog/second/;first-post@/blog/first-post/;"
        );
        assert_eq!(artifacts[1].markup, "web:first-post@/blog/first-post/;");
    }

    #[test]
    fn test_expansion_must_match_route() {
        let fixture = fixture();
        let items = fixture
            .collections
            .try_get_collection(&fixture.pages.join("Blog/[slug].tmpl"))
            .unwrap();
        let groups = fixture
            .collections
            .try_get_collection(&fixture.pages.join("Blog/Tags/[tag].tmpl"))
            .unwrap();
        let cancel = CancelToken::new();

        let err = items
            .render_groups(&PageId::new("Blog/[slug].tmpl"), &cancel)
            .err()
            .unwrap();
        assert!(err.to_string().contains("item route"));
        let err = groups
            .render_items(&PageId::new("Blog/Tags/[tag].tmpl"), &cancel)
            .err()
            .unwrap();
        assert!(err.to_string().contains("group route"));
    }

    #[tokio::test]
    async fn test_cancelled_stream_stops() {
        let fixture = fixture();
        let leaf = fixture.pages.join("Blog/[slug].tmpl");
        let collection = fixture.collections.try_get_collection(&leaf).unwrap();
        let cancel = CancelToken::new();

        let mut stream = collection
            .render_items(&PageId::new("Blog/[slug].tmpl"), &cancel)
            .unwrap();
        assert!(stream.next().await.unwrap().is_some());

        cancel.cancel();
        assert!(stream.next().await.unwrap().is_none());
        assert!(stream.pending.is_empty());
    }

    #[test]
    fn test_content_item_slug() {
        let item = ContentItem::new(PathBuf::from("/c/Hello, World!.md"));
        assert_eq!(item.slug, "hello-world");
    }
}
