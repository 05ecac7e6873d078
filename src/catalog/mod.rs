//! Concrete collaborators of the render pass.
//!
//! - [`TemplateCatalog`]: Tera templates below the pages root
//! - [`ContentCollections`]: markdown content bound to dynamic routes

mod collections;
pub mod front_matter;
pub mod markdown;
mod templates;

pub use collections::{
    ContentCollection, ContentCollections, ContentItem, ContentStream, Group, GroupMember,
    discover_items, group_items,
};
pub use templates::{TemplateCatalog, site_context, template_name};
