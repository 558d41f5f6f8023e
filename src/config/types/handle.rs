//! Global config snapshot.
//!
//! Uses `arc-swap` for lock-free reads. Each request takes one `Arc`
//! snapshot and never observes a later replacement.

use crate::config::Config;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
static CONFIG: LazyLock<ArcSwap<Config>> =
    LazyLock::new(|| ArcSwap::from_pointee(Config::default()));

/// Current config snapshot.
#[inline]
pub fn cfg() -> Arc<Config> {
    CONFIG.load_full()
}

/// Install the loaded config and return the shared snapshot.
#[inline]
pub fn init_config(config: Config) -> Arc<Config> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
