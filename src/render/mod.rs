//! Render pass: scheduling, collaborator traits and output.

pub mod batch;
pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod traits;
pub mod writer;

pub use cancel::CancelToken;
pub use error::BuildError;
pub use orchestrator::{RenderOptions, RenderOrchestrator, RenderStats};
pub use traits::{
    Collection, CollectionCatalog, FileWriter, ItemStream, PageCatalog, PageId, PagesRoot,
    RenderedArtifact,
};
pub use writer::FsWriter;
