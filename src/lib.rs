//! canopy - a static site builder for template page trees.
//!
//! ```text
//! pages/**/*.tmpl ──► site::PageTreeBuilder ──► Node tree
//!                                                  │
//! content/**/*.md ──► catalog ──────────────► render::RenderOrchestrator
//!                                                  │
//!                                           site::slug ──► render::FsWriter ──► out/
//! ```

pub mod assets;
pub mod build;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod logger;
pub mod render;
pub mod site;
