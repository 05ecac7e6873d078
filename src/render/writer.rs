//! Filesystem output.

use super::traits::FileWriter;
use crate::site::slug::HTML_EXTENSION;
use std::{
    io,
    path::{Path, PathBuf},
};

/// Writes markup below an output root.
#[derive(Debug, Clone)]
pub struct FsWriter {
    output: PathBuf,
}

impl FsWriter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Absolute path of `<directory>/<file_name>.html`.
    pub fn target(&self, file_name: &str, directory: &str) -> PathBuf {
        self.output
            .join(directory.trim_matches('/'))
            .join(format!("{file_name}.{HTML_EXTENSION}"))
    }
}

impl FileWriter for FsWriter {
    async fn write(&self, content: String, file_name: &str, directory: &str) -> io::Result<()> {
        let target = self.target(file_name, directory);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, content).await
    }
}
