//! `[features]` section: one switch per optimization.
//!
//! # Example
//!
//! ```toml
//! [features]
//! lazy_loading = true         # loading="lazy" on content images/iframes
//! minification = true         # write and reference .min.css / .min.js
//! browser_caching = true      # Cache-Control + security headers
//! remove_query_strings = true # drop ?ver= from asset URLs
//! google_fonts = true         # merge Google Fonts stylesheets
//! webp = true                 # WebP siblings + srcset substitution
//! critical_css = true         # inline critical CSS, preload-swap the rest
//! js_loading = true           # defer non-critical scripts on every device
//! resource_hints = true       # dns-prefetch / preconnect / preload hints
//! cdn = false                 # rewrite local asset URLs to [cdn].url
//! service_worker = true       # register /speedway-sw.js over HTTPS
//! image_optimization = true   # re-encode uploads
//! font_optimization = true    # font-display swap + font preloads
//! dark_mode = true            # theme styles, toggle and save endpoint
//! ```

use serde::{Deserialize, Serialize};

/// Feature flags, read-only for the lifetime of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub lazy_loading: bool,
    pub minification: bool,
    pub browser_caching: bool,
    pub remove_query_strings: bool,
    pub google_fonts: bool,
    pub webp: bool,
    pub critical_css: bool,
    pub js_loading: bool,
    pub resource_hints: bool,
    pub cdn: bool,
    pub service_worker: bool,
    pub image_optimization: bool,
    pub font_optimization: bool,
    pub dark_mode: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            lazy_loading: true,
            minification: true,
            browser_caching: true,
            remove_query_strings: true,
            google_fonts: true,
            webp: true,
            critical_css: true,
            js_loading: true,
            resource_hints: true,
            cdn: false,
            service_worker: true,
            image_optimization: true,
            font_optimization: true,
            dark_mode: true,
        }
    }
}

impl FeaturesConfig {
    /// Every optimization switched off.
    pub const fn none() -> Self {
        Self {
            lazy_loading: false,
            minification: false,
            browser_caching: false,
            remove_query_strings: false,
            google_fonts: false,
            webp: false,
            critical_css: false,
            js_loading: false,
            resource_hints: false,
            cdn: false,
            service_worker: false,
            image_optimization: false,
            font_optimization: false,
            dark_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_features_defaults() {
        let config = test_parse_config("");
        assert!(config.features.lazy_loading);
        assert!(config.features.browser_caching);
        assert!(!config.features.cdn);
    }

    #[test]
    fn test_features_partial_override() {
        let config = test_parse_config("[features]\nlazy_loading = false\ncdn = true");
        assert!(!config.features.lazy_loading);
        assert!(config.features.cdn);
        // untouched flags keep defaults
        assert!(config.features.dark_mode);
    }
}
