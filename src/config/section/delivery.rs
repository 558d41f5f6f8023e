//! Asset delivery sections: `[cdn]`, `[minify]` and `[cache]`.
//!
//! # Example
//!
//! ```toml
//! [cdn]
//! url = "https://cdn.example.com"
//!
//! [minify]
//! engine = "regex"            # "regex" (best effort) or "syntax" (oxc / lightningcss)
//!
//! [cache]
//! vary_by_device = true       # append `vary-by-device` on mobile responses
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

// ============================================================================
// [cdn]
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnConfig {
    /// CDN origin that replaces the site origin for local assets.
    pub url: String,
}

impl CdnConfig {
    pub const URL: FieldPath = FieldPath::new("cdn.url");

    pub fn validate(&self, enabled: bool, diag: &mut ConfigDiagnostics) {
        if !enabled {
            return;
        }
        if self.url.is_empty() {
            diag.error_with_hint(
                Self::URL,
                format!("features.cdn is true but {} is empty", Self::URL),
                "set [cdn] url or disable features.cdn",
            );
            return;
        }
        if url::Url::parse(&self.url).is_err() {
            diag.error(Self::URL, format!("invalid url `{}`", self.url));
        }
    }
}

// ============================================================================
// [minify]
// ============================================================================

/// Minification backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinifyEngine {
    /// Comment and whitespace stripping; not syntax aware.
    #[default]
    Regex,
    /// Parser-based (oxc for JS, lightningcss for CSS), regex on parse failure.
    Syntax,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MinifyConfig {
    pub engine: MinifyEngine,
}

// ============================================================================
// [cache]
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Append the non-standard `vary-by-device` token for mobile clients.
    pub vary_by_device: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            vary_by_device: true,
        }
    }
}

impl CacheConfig {
    pub const VARY_BY_DEVICE: FieldPath = FieldPath::new("cache.vary_by_device");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.vary_by_device {
            diag.warn(
                Self::VARY_BY_DEVICE,
                "`vary-by-device` is not a Cache-Control directive; HTTP caches ignore it",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_cdn_required_when_enabled() {
        let config = test_parse_config("[features]\ncdn = true");
        let mut diag = ConfigDiagnostics::new();
        config.cdn.validate(config.features.cdn, &mut diag);
        assert!(diag.has_errors());

        let config = test_parse_config("[features]\ncdn = true\n[cdn]\nurl = \"https://cdn.example.com\"");
        let mut diag = ConfigDiagnostics::new();
        config.cdn.validate(config.features.cdn, &mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_minify_engine_parse() {
        let config = test_parse_config("");
        assert_eq!(config.minify.engine, MinifyEngine::Regex);

        let config = test_parse_config("[minify]\nengine = \"syntax\"");
        assert_eq!(config.minify.engine, MinifyEngine::Syntax);
    }

    #[test]
    fn test_vary_by_device_warns() {
        let config = test_parse_config("");
        let mut diag = ConfigDiagnostics::new();
        config.cache.validate(&mut diag);
        assert_eq!(diag.warnings().len(), 1);
        assert!(!diag.has_errors());
    }
}
