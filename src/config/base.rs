//! `[base]` section configuration.
//!
//! Site information exposed to every template as `site`.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in canopy.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Site"
/// description = "Notes and articles"
/// url = "https://example.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: String,

    /// Public base URL, used for absolute links in templates.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_full() {
        let config = r#"
            [base]
            title = "Canopy"
            description = "A tree of pages"
            url = "https://canopy.example"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Canopy");
        assert_eq!(config.base.description, "A tree of pages");
        assert_eq!(config.base.url, Some("https://canopy.example".to_string()));
    }

    #[test]
    fn test_base_config_defaults() {
        let config: SiteConfig = toml::from_str("[base]").unwrap();

        assert_eq!(config.base.title, "canopy site");
        assert_eq!(config.base.description, "");
        assert!(config.base.url.is_none());
    }

    #[test]
    fn test_base_config_unknown_field() {
        let config = r#"
            [base]
            title = "Test"
            author = "someone"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
