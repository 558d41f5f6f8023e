//! Anti-forgery tokens for the theme save action.
//!
//! A token is a keyed blake3 hash of `(action, user, tick)` where a tick is
//! a 12-hour window. Tokens from the current and the previous tick verify,
//! so a token lives between 12 and 24 hours.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::UserId;

/// Seconds per validity window.
pub const TICK_SECS: u64 = 12 * 60 * 60;

const KEY_CONTEXT: &str = "speedway 2024 theme nonce key";

/// Bytes of the keyed hash carried in a token.
const TOKEN_BYTES: usize = 16;

#[derive(Clone)]
pub struct NonceIssuer {
    key: [u8; 32],
}

impl std::fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceIssuer").finish_non_exhaustive()
    }
}

impl NonceIssuer {
    /// Derive the key from configured secret material.
    ///
    /// An empty secret yields a per-process key.
    pub fn new(secret: &str) -> Self {
        if secret.is_empty() {
            return Self::ephemeral();
        }
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
        }
    }

    fn ephemeral() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seed = format!("{}:{now}:{:p}", std::process::id(), &now);
        Self {
            key: blake3::derive_key(KEY_CONTEXT, seed.as_bytes()),
        }
    }

    pub fn issue(&self, action: &str, user: Option<UserId>) -> String {
        self.issue_at(action, user, unix_now())
    }

    pub fn verify(&self, action: &str, user: Option<UserId>, token: &str) -> bool {
        self.verify_at(action, user, token, unix_now())
    }

    pub fn issue_at(&self, action: &str, user: Option<UserId>, now: u64) -> String {
        hex::encode(self.token(action, user, now / TICK_SECS))
    }

    pub fn verify_at(&self, action: &str, user: Option<UserId>, token: &str, now: u64) -> bool {
        let Ok(given) = hex::decode(token) else {
            return false;
        };
        if given.len() != TOKEN_BYTES {
            return false;
        }
        let tick = now / TICK_SECS;
        [Some(tick), tick.checked_sub(1)]
            .into_iter()
            .flatten()
            .any(|t| constant_time_eq(&given, &self.token(action, user, t)))
    }

    fn token(&self, action: &str, user: Option<UserId>, tick: u64) -> [u8; TOKEN_BYTES] {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(action.as_bytes());
        hasher.update(&[0]);
        hasher.update(&user.map_or(0, |u| u.0).to_le_bytes());
        hasher.update(&tick.to_le_bytes());

        let mut out = [0; TOKEN_BYTES];
        out.copy_from_slice(&hasher.finalize().as_bytes()[..TOKEN_BYTES]);
        out
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
