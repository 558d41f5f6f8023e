//! `[site]` section: where the site lives and what it serves.
//!
//! # Example
//!
//! ```toml
//! [site]
//! url = "https://example.com"   # origin used for same-origin checks
//! root = "public"               # document root (relative to config file)
//! fonts = "assets/fonts"        # font directory under root, for preloads
//! front_page = "/"              # path whose thumbnail image counts as hero
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Public origin of the site.
    pub url: String,
    /// Document root.
    pub root: PathBuf,
    /// Font directory, relative to `root`.
    pub fonts: PathBuf,
    /// URL path of the front page.
    pub front_page: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5277".into(),
            root: PathBuf::from("public"),
            fonts: PathBuf::from("assets/fonts"),
            front_page: "/".into(),
        }
    }
}

impl SiteConfig {
    pub const URL: FieldPath = FieldPath::new("site.url");
    pub const FRONT_PAGE: FieldPath = FieldPath::new("site.front_page");

    /// Parsed origin, `None` if `url` is not an absolute URL.
    pub fn origin(&self) -> Option<url::Url> {
        url::Url::parse(&self.url).ok()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match url::Url::parse(&self.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => diag.error(Self::URL, format!("{} must use http or https", Self::URL)),
            Err(e) => diag.error_with_hint(
                Self::URL,
                format!("invalid url `{}`: {e}", self.url),
                "use an absolute origin such as https://example.com",
            ),
        }

        if !self.front_page.starts_with('/') {
            diag.error(
                Self::FRONT_PAGE,
                format!("{} must start with `/`", Self::FRONT_PAGE),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_site_defaults_are_valid() {
        let config = test_parse_config("");
        let mut diag = ConfigDiagnostics::new();
        config.site.validate(&mut diag);
        assert!(!diag.has_errors());
        assert_eq!(config.site.front_page, "/");
    }

    #[test]
    fn test_site_rejects_relative_url() {
        let config = test_parse_config("[site]\nurl = \"example.com\"");
        let mut diag = ConfigDiagnostics::new();
        config.site.validate(&mut diag);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_site_rejects_non_http_scheme() {
        let config = test_parse_config("[site]\nurl = \"ftp://example.com\"\nfront_page = \"home\"");
        let mut diag = ConfigDiagnostics::new();
        config.site.validate(&mut diag);
        assert_eq!(diag.errors().len(), 2);
    }
}
