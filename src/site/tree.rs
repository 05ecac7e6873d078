//! Page tree construction.
//!
//! Turns a flat list of template paths into a directory-shaped tree that
//! carries the layout chain of every directory.
//!
//! ```text
//! pages/Index.tmpl           Node "/"        layouts [Layout]
//! pages/Layout.tmpl            ├── Index.tmpl
//! pages/Blog/[slug].tmpl  ──►  └── Node "/Blog"  layouts [Layout, Blog/Layout]
//! pages/Blog/Layout.tmpl             └── [slug].tmpl
//! ```
//!
//! Groups are keyed by their path relative to the pages root and sorted, so a
//! parent always precedes its descendants. A group is a direct child when it
//! is one level deeper and its path starts with the parent path followed by a
//! separator.

use super::{
    error::StructuralError,
    leaf::{Conventions, Leaf},
};
use rustc_hash::FxHashMap;
use std::{
    fmt::Write,
    path::{Component, Path, PathBuf},
};

// ============================================================================
// Node
// ============================================================================

/// One directory level of the page tree. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    directory: PathBuf,
    leaves: Vec<Leaf>,
    layouts: Vec<Leaf>,
    children: Vec<Node>,
    has_own_layout: bool,
}

impl Node {
    fn empty(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            ..Self::default()
        }
    }

    /// Absolute directory this node stands for.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Non-layout templates declared directly in this directory.
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Layout chain in effect here, outermost first.
    pub fn layouts(&self) -> &[Leaf] {
        &self.layouts
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Layout declared in this very directory, if any.
    pub fn own_layout(&self) -> Option<&Leaf> {
        self.has_own_layout.then(|| self.layouts.last()).flatten()
    }

    /// This node and all descendants, depth-first, parents before children.
    pub fn walk(&self) -> Vec<&Node> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.walk());
        }
        nodes
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    /// Number of non-layout templates in the tree.
    pub fn page_count(&self) -> usize {
        self.walk().iter().map(|node| node.leaves.len()).sum()
    }

    /// Number of template files in the tree, layouts included.
    pub fn file_count(&self) -> usize {
        self.walk()
            .iter()
            .map(|node| node.leaves.len() + usize::from(node.has_own_layout))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.children.is_empty() && !self.has_own_layout
    }

    /// Draw the tree for the terminal.
    ///
    /// ```text
    /// pages/  [layout: Layout.tmpl]
    /// ├── Index.tmpl
    /// └── Blog/
    ///     └── [slug].tmpl  (collection)
    /// ```
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        writeln!(out, "{}/{}", dir_name(&self.directory), self.layout_note()).ok();
        self.render_entries(&mut out, "");
        out
    }

    fn render_entries(&self, out: &mut String, indent: &str) {
        let total = self.leaves.len() + self.children.len();

        for (i, leaf) in self.leaves.iter().enumerate() {
            let note = if leaf.is_dynamic_path() {
                format!("  ({})", leaf.kind().label())
            } else {
                String::new()
            };
            writeln!(out, "{indent}{}{}{note}", branch(i + 1 == total), leaf.name()).ok();
        }

        for (j, child) in self.children.iter().enumerate() {
            let last = self.leaves.len() + j + 1 == total;
            writeln!(
                out,
                "{indent}{}{}/{}",
                branch(last),
                dir_name(&child.directory),
                child.layout_note()
            )
            .ok();
            let indent = format!("{indent}{}", if last { "    " } else { "│   " });
            child.render_entries(out, &indent);
        }
    }

    fn layout_note(&self) -> String {
        self.own_layout()
            .map(|layout| format!("  [layout: {}]", layout.name()))
            .unwrap_or_default()
    }
}

fn branch(last: bool) -> &'static str {
    if last { "└── " } else { "├── " }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Builder
// ============================================================================

/// Files of one directory, keyed by its path relative to the pages root.
#[derive(Debug)]
struct Group {
    /// `""` for the root, `/Blog/Tags` below it.
    path: String,
    /// Number of separators in `path`.
    depth: usize,
    directory: PathBuf,
    files: Vec<PathBuf>,
}

/// Builds a [`Node`] tree from discovered template paths.
#[derive(Debug, Clone, Default)]
pub struct PageTreeBuilder {
    conventions: Conventions,
}

impl PageTreeBuilder {
    pub fn new(conventions: Conventions) -> Self {
        Self { conventions }
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Build a tree where every dynamic template expands collection items.
    pub fn build(&self, files: &[PathBuf], pages_root: &Path) -> Result<Node, StructuralError> {
        self.build_with(files, pages_root, |_| false)
    }

    /// Build a tree, asking `is_group` whether a dynamic template expands the
    /// groups of a collection rather than its items.
    ///
    /// An empty file list yields an empty tree. Otherwise the pages root must
    /// hold a home page and no directory may hold two layouts.
    pub fn build_with(
        &self,
        files: &[PathBuf],
        pages_root: &Path,
        is_group: impl Fn(&Path) -> bool,
    ) -> Result<Node, StructuralError> {
        if files.is_empty() {
            return Ok(Node::empty(pages_root));
        }

        let groups = group_by_directory(files, pages_root)?;
        let Some(root) = groups.first() else {
            return Ok(Node::empty(pages_root));
        };

        if !root.files.iter().any(|file| self.conventions.is_home(file)) {
            return Err(StructuralError::MissingHomePage {
                root: pages_root.to_path_buf(),
                home: self.conventions.home.clone(),
            });
        }

        self.build_node(&groups, 0, &[], &is_group)
    }

    fn build_node(
        &self,
        groups: &[Group],
        index: usize,
        inherited: &[Leaf],
        is_group: &impl Fn(&Path) -> bool,
    ) -> Result<Node, StructuralError> {
        let group = &groups[index];

        let mut leaves = Vec::with_capacity(group.files.len());
        let mut own_layout: Option<Leaf> = None;
        for file in &group.files {
            let leaf = self.conventions.classify(file, is_group);
            if !leaf.is_layout() {
                leaves.push(leaf);
                continue;
            }
            if let Some(first) = &own_layout {
                return Err(StructuralError::DuplicateLayout {
                    directory: group.directory.clone(),
                    first: first.full_path().to_path_buf(),
                    second: file.clone(),
                });
            }
            own_layout = Some(leaf);
        }

        let has_own_layout = own_layout.is_some();
        let mut layouts = inherited.to_vec();
        layouts.extend(own_layout);

        let prefix = format!("{}/", group.path);
        let children = groups
            .iter()
            .enumerate()
            .skip(index + 1)
            .filter(|(_, candidate)| {
                candidate.depth == group.depth + 1 && candidate.path.starts_with(&prefix)
            })
            .map(|(i, _)| self.build_node(groups, i, &layouts, is_group))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node {
            directory: group.directory.clone(),
            leaves,
            layouts,
            children,
            has_own_layout,
        })
    }
}

/// Group files by directory, add empty groups for template-less ancestors,
/// and sort by relative path.
fn group_by_directory(files: &[PathBuf], pages_root: &Path) -> Result<Vec<Group>, StructuralError> {
    let mut by_dir: FxHashMap<PathBuf, Vec<PathBuf>> = FxHashMap::default();

    for file in files {
        let directory = file.parent().unwrap_or(Path::new(""));
        if !directory.starts_with(pages_root) {
            return Err(StructuralError::OutsideRoot {
                path: file.clone(),
                root: pages_root.to_path_buf(),
            });
        }
        by_dir.entry(directory.to_path_buf()).or_default().push(file.clone());
    }

    let directories: Vec<PathBuf> = by_dir.keys().cloned().collect();
    for directory in directories {
        for ancestor in directory.ancestors().skip(1) {
            if !ancestor.starts_with(pages_root) {
                break;
            }
            by_dir.entry(ancestor.to_path_buf()).or_default();
        }
    }

    let mut groups: Vec<Group> = by_dir
        .into_iter()
        .map(|(directory, mut files)| {
            files.sort();
            files.dedup();
            let path = node_path(&directory, pages_root);
            Group {
                depth: path.matches('/').count(),
                path,
                directory,
                files,
            }
        })
        .collect();
    groups.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(groups)
}

fn node_path(directory: &Path, pages_root: &Path) -> String {
    directory
        .strip_prefix(pages_root)
        .unwrap_or(directory)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(format!("/{}", part.to_string_lossy())),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
