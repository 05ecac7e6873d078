//! Render pass errors.

use crate::site::StructuralError;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Fatal errors of a build. Output of batches that already finished stays on
/// disk.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("failed to render `{}`", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("render task panicked: {0}")]
    TaskPanicked(String),

    #[error("build cancelled")]
    Cancelled,
}

impl BuildError {
    /// Wrap a collaborator failure for `path`. A cancellation stays a
    /// cancellation.
    pub(crate) fn render(path: impl Into<PathBuf>) -> impl FnOnce(anyhow::Error) -> Self {
        let path = path.into();
        move |source| {
            if source
                .downcast_ref::<Self>()
                .is_some_and(Self::is_cancelled)
            {
                Self::Cancelled
            } else {
                Self::Render { path, source }
            }
        }
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_render_error_keeps_source() {
        let err = BuildError::render("/p/Index.tmpl")(anyhow!("unknown variable `title`"));
        assert_eq!(format!("{err}"), "failed to render `/p/Index.tmpl`");

        let chained = format!("{:#}", anyhow::Error::from(err));
        assert!(chained.contains("unknown variable `title`"));
    }

    #[test]
    fn test_render_keeps_cancellation() {
        let err = BuildError::render("/p/Index.tmpl")(BuildError::Cancelled.into());
        assert!(err.is_cancelled());

        let wrapped = anyhow::Error::from(BuildError::Cancelled).context("while rendering");
        assert!(BuildError::render("/p/Index.tmpl")(wrapped).is_cancelled());
    }

    #[test]
    fn test_cancelled() {
        assert!(BuildError::Cancelled.is_cancelled());
        assert!(!BuildError::TaskPanicked("boom".into()).is_cancelled());
    }
}
