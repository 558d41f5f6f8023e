//! `[theme]` section: dark/light preference persistence.
//!
//! # Example
//!
//! ```toml
//! [theme]
//! store = "speedway-themes.json"   # relative to the config file
//! secret = "change-me"             # key material for anti-forgery nonces
//! ```
//!
//! An empty `secret` derives a per-process key; nonces then expire on restart.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// JSON file holding per-user preferences.
    pub store: PathBuf,
    /// Nonce key material.
    pub secret: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from("speedway-themes.json"),
            secret: String::new(),
        }
    }
}

impl ThemeConfig {
    pub const SECRET: FieldPath = FieldPath::new("theme.secret");

    pub fn validate(&self, enabled: bool, diag: &mut ConfigDiagnostics) {
        if enabled && self.secret.is_empty() {
            diag.warn(
                Self::SECRET,
                "no secret configured, theme nonces are only valid until restart",
            );
        }
    }
}
