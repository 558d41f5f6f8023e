//! Configuration management for `speedway.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── delivery   # [cdn] [minify] [cache]
//! │   ├── features   # [features]
//! │   ├── media      # [image]
//! │   ├── origin     # [site]
//! │   ├── preference # [theme]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # Config (this file)
//! ```
//!
//! Every section is optional. A missing `speedway.toml` is not an error:
//! the defaults enable every optimization except the CDN rewrite.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    CacheConfig, CdnConfig, FeaturesConfig, ImageConfig, MinifyConfig, MinifyEngine, ServeConfig,
    SiteConfig, ThemeConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    cli::{Cli, Commands},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing speedway.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory, parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Site origin and document root
    #[serde(default)]
    pub site: SiteConfig,

    /// Optimization switches
    #[serde(default)]
    pub features: FeaturesConfig,

    /// CDN origin
    #[serde(default)]
    pub cdn: CdnConfig,

    /// Image encoder qualities
    #[serde(default)]
    pub image: ImageConfig,

    /// Cache header options
    #[serde(default)]
    pub cache: CacheConfig,

    /// Minifier backend
    #[serde(default)]
    pub minify: MinifyConfig,

    /// Theme preference persistence
    #[serde(default)]
    pub theme: ThemeConfig,

    /// Host server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl Config {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file. When none is found the
    /// defaults are used and the cwd becomes the project root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    ..Self::default()
                }
            }
        };

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);

        config.apply_command_options(cli);
        config.normalize_paths(&root);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Document root served by the host and scanned for fonts.
    pub fn document_root(&self) -> &Path {
        &self.site.root
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve {
                interface,
                port,
                root,
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.site.root, root.as_ref());
            }
            Commands::Minify { args } => {
                if args.syntax {
                    self.minify.engine = MinifyEngine::Syntax;
                }
            }
            Commands::Optimize { .. } | Commands::Classify { .. } => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);
        self.config_path = crate::utils::path::normalize_path(&self.config_path);
        self.site.root = crate::utils::path::normalize_path(&root.join(&self.site.root));
        self.theme.store = root.join(&self.theme.store);
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.site.validate(&mut diag);
        self.cdn.validate(self.features.cdn, &mut diag);
        self.image.validate(&mut diag);
        self.cache.validate(&mut diag);
        self.theme.validate(self.features.dark_mode, &mut diag);
        self.serve.validate(&mut diag);

        diag.print_warnings();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = Config::from_str("[features\nlazy_loading = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.get_root(), Path::new(""));
        assert!(config.features.lazy_loading);
        assert!(!config.features.cdn);
        assert_eq!(config.image.webp_quality, 90);
        assert!(config.cache.vary_by_device);
        assert_eq!(config.serve.port, 5277);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_cdn_without_url_fails_validation() {
        let config = test_parse_config("[features]\ncdn = true");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[features]\nwebp = false\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = Config::parse_with_ignored(content).unwrap();

        assert!(!config.features.webp);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_unknown_feature_flag_detected() {
        let content = "[features]\nenable_prerender = true";
        let (_, ignored) = Config::parse_with_ignored(content).unwrap();
        assert_eq!(ignored, vec!["features.enable_prerender".to_string()]);
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[site]\nurl = \"https://example.com\"\n[cdn]\nurl = \"https://cdn.example.com\"";
        let (_, ignored) = Config::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
    }
}
