//! Page tree construction errors.

use std::path::PathBuf;
use thiserror::Error;

/// Problems in the template layout that stop a build before rendering.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("no `{home}` home page in pages root `{}`", root.display())]
    MissingHomePage { root: PathBuf, home: String },

    #[error(
        "more than one layout in `{}`: `{}` and `{}`",
        directory.display(),
        first.display(),
        second.display()
    )]
    DuplicateLayout {
        directory: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("template `{}` is outside the pages root `{}`", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error_display() {
        let err = StructuralError::MissingHomePage {
            root: PathBuf::from("/site/pages"),
            home: "Index".into(),
        };
        let display = format!("{err}");
        assert!(display.contains("Index"));
        assert!(display.contains("/site/pages"));

        let err = StructuralError::DuplicateLayout {
            directory: PathBuf::from("/p/blog"),
            first: PathBuf::from("/p/blog/Layout.tmpl"),
            second: PathBuf::from("/p/blog/layout.tmpl"),
        };
        assert!(format!("{err}").contains("layout.tmpl"));
    }
}
