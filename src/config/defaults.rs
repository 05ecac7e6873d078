//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "canopy site".into()
    }

    pub fn url() -> Option<String> {
        None
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn pages() -> PathBuf {
        "pages".into()
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn static_dir() -> PathBuf {
        "static".into()
    }

    pub fn output() -> PathBuf {
        "out".into()
    }

    pub fn extension() -> String {
        "tmpl".into()
    }

    pub fn layout() -> String {
        "Layout".into()
    }

    pub fn home() -> String {
        "Index".into()
    }

    pub fn batch_size() -> usize {
        crate::render::batch::DEFAULT_BATCH_SIZE
    }

    pub fn render_sessions() -> usize {
        4
    }
}

// ============================================================================
// [[collections]] Defaults
// ============================================================================

pub mod collections {
    pub fn extension() -> String {
        "md".into()
    }
}
