//! Image delivery rules.
//!
//! # Modules
//!
//! - [`attrs`]: `<img>` loading attributes and content lazy loading
//! - [`srcset`]: `.webp` substitution in candidate lists
//! - [`transcode`]: upload re-encoding and WebP / AVIF derivatives

pub mod attrs;
pub mod srcset;
pub mod transcode;

pub use attrs::{HeroHint, lazy_load_content, rewrite};
pub use srcset::{prefer_modern_sources, webp_sibling};
pub use transcode::{
    Derivatives, Encoders, Upload, convert_upload_to_webp, derivative_quality,
    generate_derivatives, has_transparency, optimize_upload,
};
