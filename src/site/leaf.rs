//! Template classification.

use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// `[slug]`, `[category_name]`, ...
static RE_DYNAMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[a-zA-Z][a-zA-Z0-9_]*\]$").unwrap());

/// How a template produces output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// Rendered once from its own path.
    Static,
    /// Rendered once per item of the collection bound to its route.
    CollectionItem,
    /// Rendered once per distinct group value of a collection.
    CollectionGroup,
}

impl LeafKind {
    pub const fn is_dynamic(self) -> bool {
        !matches!(self, Self::Static)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::CollectionItem => "collection",
            Self::CollectionGroup => "group",
        }
    }
}

/// One discovered template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    full_path: PathBuf,
    kind: LeafKind,
    is_layout: bool,
}

impl Leaf {
    pub fn new(full_path: PathBuf, kind: LeafKind, is_layout: bool) -> Self {
        Self {
            full_path,
            kind,
            is_layout,
        }
    }

    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    pub const fn kind(&self) -> LeafKind {
        self.kind
    }

    pub const fn is_layout(&self) -> bool {
        self.is_layout
    }

    /// Whether the file name is a single `[name]` segment.
    pub const fn is_dynamic_path(&self) -> bool {
        self.kind.is_dynamic()
    }

    /// File name for display.
    pub fn name(&self) -> String {
        self.full_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Reserved template names of a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Stem of the per-directory layout template.
    pub layout: String,
    /// Stem of the home page that must exist at the pages root.
    pub home: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            layout: "Layout".into(),
            home: "Index".into(),
        }
    }
}

impl Conventions {
    pub fn is_layout(&self, path: &Path) -> bool {
        stem(path).is_some_and(|s| s.eq_ignore_ascii_case(&self.layout))
    }

    pub fn is_home(&self, path: &Path) -> bool {
        stem(path).is_some_and(|s| s.eq_ignore_ascii_case(&self.home))
    }

    pub fn is_dynamic(path: &Path) -> bool {
        stem(path).is_some_and(|s| RE_DYNAMIC.is_match(s))
    }

    /// Classify `path`. `is_group` decides between the two dynamic kinds.
    pub fn classify(&self, path: &Path, is_group: impl Fn(&Path) -> bool) -> Leaf {
        let kind = match (Self::is_dynamic(path), is_group(path)) {
            (false, _) => LeafKind::Static,
            (true, false) => LeafKind::CollectionItem,
            (true, true) => LeafKind::CollectionGroup,
        };
        Leaf::new(path.to_path_buf(), kind, self.is_layout(path))
    }
}

fn stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}
