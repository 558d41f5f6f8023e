//! speedway - asset-delivery optimization rules for CMS pages.
//!
//! The rules are plain functions over request-scoped inputs:
//!
//! - [`device`] classifies the client and builds its [`core::ClientContext`]
//! - [`policy`] plans script and stylesheet loading
//! - [`image`] rewrites `<img>` attributes and transcodes uploads
//! - [`minify`] writes `.min.css` / `.min.js` artifacts
//! - [`headers`] computes caching and security headers
//! - [`theme`] stores the dark / light preference behind a nonce
//!
//! [`pipeline`] strings the page rewriters together and [`serve`] hosts them.

pub mod cli;
pub mod config;
pub mod core;
pub mod device;
pub mod embed;
pub mod headers;
pub mod image;
pub mod logger;
pub mod minify;
pub mod pipeline;
pub mod policy;
pub mod serve;
pub mod theme;
pub mod utils;
