//! Page tree model: template classification, tree construction and output
//! path resolution.

pub mod error;
pub mod leaf;
pub mod slug;
pub mod tree;

pub use error::StructuralError;
pub use leaf::{Conventions, Leaf, LeafKind};
pub use slug::OutputLocation;
pub use tree::{Node, PageTreeBuilder};
