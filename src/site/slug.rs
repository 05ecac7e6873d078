//! Output path resolution and URL slugification.
//!
//! Every rendered artifact lands in one of two shapes under the output root:
//!
//! | Source name | Output |
//! |-------------|--------|
//! | reserved (`index`, `404`, `500`) | `<dir>/<name>.html` |
//! | anything else | `<dir>/<slug>/index.html` |
//!
//! Site URLs depend on this mapping, so it stays a pure function of its
//! inputs.

use regex::Regex;
use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf},
    sync::LazyLock,
};

/// File name used for the page inside a generated subdirectory.
pub const HOME_NAME: &str = "index";

/// Route names written directly into their directory instead of nesting.
pub const RESERVED_NAMES: [&str; 3] = [HOME_NAME, "404", "500"];

/// Extension the writer appends to every output file.
pub const HTML_EXTENSION: &str = "html";

static RE_UNSAFE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\-\+#]").unwrap());
static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\-\s]+").unwrap());

// ============================================================================
// Slugification
// ============================================================================

/// Convert a name into a URL-safe token.
///
/// Applied in this order:
/// 1. drop every char outside `[\w\s\-\+#]`
/// 2. trim
/// 3. collapse runs of `-` and whitespace into a single `-`
/// 4. `#` → `sharp`, `+` → `plus`
/// 5. lower-case
pub fn slugify(name: &str) -> String {
    let stripped = RE_UNSAFE.replace_all(name, "");
    let collapsed = RE_SEPARATORS.replace_all(stripped.trim(), "-");
    collapsed
        .replace('#', "sharp")
        .replace('+', "plus")
        .to_lowercase()
}

/// Whether `name` is written in place rather than as `<name>/index.html`.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

// ============================================================================
// Output Location
// ============================================================================

/// Where one artifact is written, relative to the output root.
///
/// `directory` always starts and ends with `/`; `file_name` has no extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputLocation {
    pub directory: String,
    pub file_name: String,
}

impl OutputLocation {
    fn new(segments: &[String], name: String) -> Self {
        let directory = to_directory(segments);
        if is_reserved(&name) {
            Self {
                directory,
                file_name: name,
            }
        } else {
            Self {
                directory: format!("{directory}{name}/"),
                file_name: HOME_NAME.to_owned(),
            }
        }
    }

    /// Output file path relative to the output root.
    ///
    /// `("/blog/post/", "index")` → `blog/post/index.html`
    pub fn relative_path(&self) -> PathBuf {
        Path::new(self.directory.trim_matches('/'))
            .join(format!("{}.{HTML_EXTENSION}", self.file_name))
    }

    /// Public URL path of the artifact.
    ///
    /// Home files are addressed by their directory, everything else by file.
    pub fn url(&self) -> String {
        if self.file_name == HOME_NAME {
            self.directory.clone()
        } else {
            format!("{}{}.{HTML_EXTENSION}", self.directory, self.file_name)
        }
    }

    /// Prefix `directory` with `segments`.
    fn nested_under(self, segments: &[String]) -> Self {
        if segments.is_empty() {
            return self;
        }
        Self {
            directory: format!("{}{}", to_directory(segments), &self.directory[1..]),
            file_name: self.file_name,
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Compute the output location of a rendered source file.
///
/// - `source`: the file being rendered (template or content item)
/// - `root`: prefix stripped from the directory of `source`
/// - `is_collection_item`: flatten nested directories to their first segment
/// - `override_key`: raw name used instead of the file stem
///
/// # Examples
///
/// | source | root | item | key | result |
/// |--------|------|------|-----|--------|
/// | `/p/404.tmpl` | `/p` | no | - | `("/", "404")` |
/// | `/p/My Post!.tmpl` | `/p` | no | - | `("/my-post/", "index")` |
/// | `/c/blog/2024/post.md` | `/c` | yes | - | `("/blog/post/", "index")` |
/// | `/p/Tags/[tag].tmpl` | `/p` | no | `Rust` | `("/tags/rust/", "index")` |
pub fn resolve(
    source: &Path,
    root: &Path,
    is_collection_item: bool,
    override_key: Option<&str>,
) -> OutputLocation {
    let directory = source.parent().unwrap_or(Path::new(""));
    let relative = directory.strip_prefix(root).unwrap_or(directory);

    let mut segments = lowercase_segments(relative);
    if is_collection_item {
        segments.truncate(1);
    }

    let name: Cow<'_, str> = match override_key {
        Some(key) => Cow::Borrowed(key),
        None => source
            .file_stem()
            .map_or(Cow::Borrowed(""), |stem| stem.to_string_lossy()),
    };

    OutputLocation::new(&segments, slugify(&name.to_lowercase()))
}

/// Compute the output location of one item of a content collection.
///
/// `key` is the item's natural key. A content file below `content_root` is
/// made relative to it and named by its file stem. Any other key is a raw
/// name and slugified whole. Either way the item lands under `route_dir`, the
/// directory of the dynamic template that expands the collection, and never
/// nests deeper than that directory.
///
/// ```text
/// pages/Blog/[slug].tmpl + content/blog/2024/post.md → /blog/post/index
/// pages/Docs/Blog/[slug].tmpl + "First Post"          → /docs/blog/first-post/index
/// pages/Blog/[slug].tmpl + "Release 1.1"              → /blog/release-11/index
/// ```
pub fn resolve_item(
    key: &str,
    content_root: &Path,
    route_dir: &Path,
    pages_root: &Path,
) -> OutputLocation {
    // Raw keys stand in for a file directly inside the route directory.
    let (relative, override_key) = match Path::new(key).strip_prefix(content_root) {
        Ok(relative) => (relative, None),
        Err(_) => (Path::new("_"), Some(key)),
    };

    match route_dir.parent().filter(|_| route_dir != pages_root) {
        Some(base) => {
            let prefix = base
                .strip_prefix(pages_root)
                .map(lowercase_segments)
                .unwrap_or_default();
            resolve(&route_dir.join(relative), base, true, override_key).nested_under(&prefix)
        }
        None => {
            let file_name = relative.file_name().map_or(relative, Path::new);
            resolve(&pages_root.join(file_name), pages_root, true, override_key)
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn lowercase_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect()
}

fn to_directory(segments: &[String]) -> String {
    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn location(directory: &str, file_name: &str) -> OutputLocation {
        OutputLocation {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    // ------------------------------------------------------------------------
    // slugify
    // ------------------------------------------------------------------------

    #[test]
    fn test_slugify_punctuation_and_spaces() {
        assert_eq!(slugify("My Post!"), "my-post");
        assert_eq!(slugify("  Hello,   World  "), "hello-world");
        assert_eq!(slugify("a - b -- c"), "a-b-c");
    }

    #[test]
    fn test_slugify_symbol_table() {
        assert_eq!(slugify("C#"), "csharp");
        assert_eq!(slugify("C++"), "cplusplus");
        assert_eq!(slugify("F# and C++"), "fsharp-and-cplusplus");
    }

    #[test]
    fn test_slugify_keeps_word_chars() {
        assert_eq!(slugify("snake_case_name"), "snake_case_name");
        assert_eq!(slugify("Über Café"), "über-café");
    }

    #[test]
    fn test_slugify_removes_brackets() {
        assert_eq!(slugify("[slug]"), "slug");
    }

    // ------------------------------------------------------------------------
    // resolve
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_reserved_name_stays_in_place() {
        let root = Path::new("/site/pages");
        assert_eq!(
            resolve(&root.join("404.tmpl"), root, false, None),
            location("/", "404")
        );
        assert_eq!(
            resolve(&root.join("Index.tmpl"), root, false, None),
            location("/", "index")
        );
        assert_eq!(
            resolve(&root.join("Errors/500.tmpl"), root, false, None),
            location("/errors/", "500")
        );
    }

    #[test]
    fn test_resolve_reserved_name_is_idempotent() {
        let root = Path::new("/site/pages");
        let first = resolve(&root.join("404.tmpl"), root, false, None);
        let again = resolve(&root.join("404.tmpl"), root, false, Some(&first.file_name));
        assert_eq!(first, again);
    }

    #[test]
    fn test_resolve_plain_page_gets_own_directory() {
        let root = Path::new("/site/pages");
        assert_eq!(
            resolve(&root.join("My Post!.tmpl"), root, false, None),
            location("/my-post/", "index")
        );
        assert_eq!(
            resolve(&root.join("Docs/Getting Started.tmpl"), root, false, None),
            location("/docs/getting-started/", "index")
        );
    }

    #[test]
    fn test_resolve_lowercases_directories() {
        let root = Path::new("/site/pages");
        assert_eq!(
            resolve(&root.join("Blog/Archive/About.tmpl"), root, false, None),
            location("/blog/archive/about/", "index")
        );
    }

    #[test]
    fn test_resolve_collection_item_truncates_nesting() {
        let root = Path::new("/site/content");
        assert_eq!(
            resolve(&root.join("blog/2024/post.md"), root, true, None),
            location("/blog/post/", "index")
        );
        assert_eq!(
            resolve(&root.join("blog/post.md"), root, true, None),
            location("/blog/post/", "index")
        );
    }

    #[test]
    fn test_resolve_override_key() {
        let root = Path::new("/site/pages");
        assert_eq!(
            resolve(&root.join("Tags/[tag].tmpl"), root, false, Some("Rust Lang")),
            location("/tags/rust-lang/", "index")
        );
    }

    // ------------------------------------------------------------------------
    // resolve_item
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_item_under_route() {
        let pages = Path::new("/site/pages");
        let content = Path::new("/site/content/blog");
        assert_eq!(
            resolve_item("/site/content/blog/2024/post.md", content, &pages.join("Blog"), pages),
            location("/blog/post/", "index")
        );
        assert_eq!(
            resolve_item("First Post", content, &pages.join("Blog"), pages),
            location("/blog/first-post/", "index")
        );
    }

    #[test]
    fn test_resolve_item_raw_key_keeps_dots() {
        let pages = Path::new("/site/pages");
        let content = Path::new("/site/content/blog");
        let blog = pages.join("Blog");
        assert_eq!(
            resolve_item("Release 1.1", content, &blog, pages),
            location("/blog/release-11/", "index")
        );
        assert_eq!(
            resolve_item("Release 1.2", content, &blog, pages),
            location("/blog/release-12/", "index")
        );
        assert_eq!(
            resolve_item("v2.0/notes", content, pages, pages),
            location("/v20notes/", "index")
        );
    }

    #[test]
    fn test_resolve_item_nested_route() {
        let pages = Path::new("/site/pages");
        let content = Path::new("/site/content/notes");
        assert_eq!(
            resolve_item("/site/content/notes/a/b/Deep.md", content, &pages.join("Docs/Notes"), pages),
            location("/docs/notes/deep/", "index")
        );
    }

    #[test]
    fn test_resolve_item_at_pages_root() {
        let pages = Path::new("/site/pages");
        let content = Path::new("/site/content");
        assert_eq!(
            resolve_item("/site/content/2024/hello.md", content, pages, pages),
            location("/hello/", "index")
        );
    }

    // ------------------------------------------------------------------------
    // OutputLocation
    // ------------------------------------------------------------------------

    #[test]
    fn test_output_location_paths() {
        let page = location("/blog/post/", "index");
        assert_eq!(page.relative_path(), PathBuf::from("blog/post/index.html"));
        assert_eq!(page.url(), "/blog/post/");

        let missing = location("/", "404");
        assert_eq!(missing.relative_path(), PathBuf::from("404.html"));
        assert_eq!(missing.url(), "/404.html");
    }
}
