//! `[[collections]]` configuration.
//!
//! A collection binds a directory of content files to the dynamic template of
//! a page route. Group routes render one page per distinct front matter value.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One `[[collections]]` entry.
///
/// # Example
/// ```toml
/// [[collections]]
/// route = "Blog"            # pages/Blog/[slug].tmpl renders each item
/// content = "blog"          # content/blog/**/*.md
///
/// [[collections.groups]]
/// route = "Blog/Tags"       # pages/Blog/Tags/[tag].tmpl renders each tag
/// group_by = "tags"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Route directory relative to the pages root.
    pub route: PathBuf,

    /// Content directory relative to the content root.
    pub content: PathBuf,

    /// Extension of content files, without the dot.
    #[serde(default = "defaults::collections::extension")]
    #[educe(Default = defaults::collections::extension())]
    pub extension: String,

    /// Group routes derived from item front matter.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// One `[[collections.groups]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    /// Route directory relative to the pages root.
    pub route: PathBuf,

    /// Front matter key whose values form the groups.
    pub group_by: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_collections() {
        let config = r#"
            [[collections]]
            route = "Blog"
            content = "blog"

            [[collections.groups]]
            route = "Blog/Tags"
            group_by = "tags"

            [[collections]]
            route = "Notes"
            content = "notes"
            extension = "markdown"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.collections.len(), 2);
        let blog = &config.collections[0];
        assert_eq!(blog.route, PathBuf::from("Blog"));
        assert_eq!(blog.extension, "md");
        assert_eq!(blog.groups.len(), 1);
        assert_eq!(blog.groups[0].group_by, "tags");

        assert_eq!(config.collections[1].extension, "markdown");
        assert!(config.collections[1].groups.is_empty());
    }

    #[test]
    fn test_collection_requires_route() {
        let config = r#"
            [[collections]]
            content = "blog"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
