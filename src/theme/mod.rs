//! Per-user dark / light preference.
//!
//! The save action verifies its anti-forgery token before anything else;
//! anonymous saves are acknowledged but not stored.

mod nonce;
mod store;

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use crate::core::ClientContext;
use crate::debug;

pub use nonce::{NonceIssuer, TICK_SECS};
pub use store::{FileStore, MemoryStore, PreferenceStore};

/// Action name the client sends with every save.
pub const SAVE_ACTION: &str = "save_theme";

/// Path the client posts the save form to.
pub const ENDPOINT: &str = "/speedway/theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// `dark` or `light`; anything else is `light`.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim() {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("invalid or expired nonce")]
    InvalidNonce,

    #[error("theme store io: {0}")]
    Io(#[from] io::Error),

    #[error("theme store json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ThemeError {
    /// Rejected before touching the store.
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::UnknownAction(_) | Self::InvalidNonce)
    }
}

/// Fields of a save request, usually from a urlencoded form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRequest {
    pub action: String,
    pub theme: String,
    pub nonce: String,
}

impl SaveRequest {
    pub fn from_form(body: &[u8]) -> Self {
        let mut request = Self::default();
        for (key, value) in form_urlencoded::parse(body) {
            match key.as_ref() {
                "action" => request.action = value.into_owned(),
                "theme" => request.theme = value.into_owned(),
                "nonce" => request.nonce = value.into_owned(),
                _ => {}
            }
        }
        request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Valid request from an anonymous visitor; nothing stored.
    Accepted,
    Saved(Theme),
}

/// Verify and apply a save request.
pub fn save_theme(
    store: &dyn PreferenceStore,
    nonces: &NonceIssuer,
    request: &SaveRequest,
    client: &ClientContext,
) -> Result<SaveOutcome, ThemeError> {
    if request.action != SAVE_ACTION {
        return Err(ThemeError::UnknownAction(request.action.clone()));
    }
    if !nonces.verify(SAVE_ACTION, client.user, &request.nonce) {
        return Err(ThemeError::InvalidNonce);
    }

    let Some(user) = client.user else {
        return Ok(SaveOutcome::Accepted);
    };

    let theme = Theme::parse_or_default(&request.theme);
    store.put(user, theme)?;
    debug!("theme"; "user {} -> {}", user, theme);
    Ok(SaveOutcome::Saved(theme))
}
