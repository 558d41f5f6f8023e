//! `[image]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [image]
//! webp_quality = 90     # upload-time WebP sibling
//! avif_quality = 80     # AVIF derivatives
//! ```
//!
//! WebP derivatives of intermediate sizes pick their quality from the pixel
//! count instead (75 / 80 / 85).

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub webp_quality: u8,
    pub avif_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            webp_quality: 90,
            avif_quality: 80,
        }
    }
}

impl ImageConfig {
    pub const WEBP_QUALITY: FieldPath = FieldPath::new("image.webp_quality");
    pub const AVIF_QUALITY: FieldPath = FieldPath::new("image.avif_quality");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, value) in [
            (Self::WEBP_QUALITY, self.webp_quality),
            (Self::AVIF_QUALITY, self.avif_quality),
        ] {
            if !(1..=100).contains(&value) {
                diag.error(field, format!("{field} must be within 1..=100, got {value}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_image_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.image.webp_quality, 90);
        assert_eq!(config.image.avif_quality, 80);
    }

    #[test]
    fn test_image_quality_out_of_range() {
        let config = test_parse_config("[image]\nwebp_quality = 0");
        let mut diag = ConfigDiagnostics::new();
        config.image.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
