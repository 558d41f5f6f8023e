//! `speedway optimize`: upload post-processing and derivatives.
//!
//! Plain mode treats each file as a fresh upload:
//!
//! 1. re-encode (`features.image_optimization`)
//! 2. WebP sibling at `image.webp_quality` (`features.webp`)
//! 3. AVIF sibling at `image.avif_quality`
//!
//! `--derivatives` treats the files as generated sizes and writes WebP with
//! an area-derived quality plus AVIF, leaving the source alone.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;

use super::OptimizeArgs;
use super::common::{collect_files, plural_count};
use crate::config::Config;
use crate::core::ImageFormat;
use crate::image::{Encoders, convert_upload_to_webp, generate_derivatives, optimize_upload};
use crate::{debug, log};

/// What happened to one input.
#[derive(Debug, Default)]
struct Report {
    source: PathBuf,
    written: Vec<PathBuf>,
}

pub fn optimize_images(args: &OptimizeArgs, config: &Config) -> Result<()> {
    let files = collect_files(&args.paths, config.document_root(), is_raster)?;
    if files.is_empty() {
        log!("optimize"; "no images found");
        return Ok(());
    }

    let mut encoders = Encoders::detect().with_avif_quality(config.image.avif_quality);
    encoders.avif &= !args.no_avif;
    if !args.no_avif && !encoders.avif {
        debug!("optimize"; "built without AVIF support");
    }

    let reports: Vec<Report> = files
        .par_iter()
        .map(|path| {
            if args.derivatives {
                derive(path, &encoders, config)
            } else {
                process_upload(path, &encoders, config)
            }
        })
        .collect();

    for report in &reports {
        for out in &report.written {
            debug!("optimize"; "{} -> {}", report.source.display(), out.display());
        }
    }
    let written: usize = reports.iter().map(|r| r.written.len()).sum();
    log!(
        "optimize";
        "{} processed, {} written",
        plural_count(reports.len(), "image"),
        plural_count(written, "file")
    );
    Ok(())
}

fn process_upload(path: &Path, encoders: &Encoders, config: &Config) -> Report {
    let mut report = Report {
        source: path.to_path_buf(),
        ..Report::default()
    };

    let upload = if config.features.image_optimization {
        let upload = optimize_upload(path);
        if upload.path != path {
            report.written.push(upload.path.clone());
        }
        upload.path
    } else {
        path.to_path_buf()
    };

    if config.features.webp
        && let Some(webp) = convert_upload_to_webp(&upload, config.image.webp_quality)
    {
        report.written.push(webp);
    }

    if encoders.avif {
        let avif_only = Encoders {
            webp: false,
            ..*encoders
        };
        report.written.extend(generate_derivatives(&upload, &avif_only).avif);
    }
    report
}

fn derive(path: &Path, encoders: &Encoders, config: &Config) -> Report {
    let encoders = Encoders {
        webp: encoders.webp && config.features.webp,
        ..*encoders
    };
    let derivatives = generate_derivatives(path, &encoders);
    let formats: Vec<&str> = derivatives.formats().map(ImageFormat::extension).collect();
    debug!("optimize"; "{}: [{}]", path.display(), formats.join(", "));
    Report {
        source: path.to_path_buf(),
        written: derivatives.webp.into_iter().chain(derivatives.avif).collect(),
    }
}

/// JPEG, PNG or GIF by extension.
fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png" | "gif"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ::image::{ImageBuffer, Rgb};

    use super::*;
    use crate::pipeline::test_support;

    fn args(paths: Vec<PathBuf>, derivatives: bool) -> OptimizeArgs {
        OptimizeArgs {
            paths,
            derivatives,
            no_avif: true,
        }
    }

    #[test]
    fn test_upload_mode() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("photo.png");
        ImageBuffer::from_pixel(8, 8, Rgb([10u8, 20, 30])).save(&png).unwrap();

        let config = test_support::config(dir.path());
        optimize_images(&args(vec![png.clone()], false), &config).unwrap();

        assert!(!png.exists());
        assert!(dir.path().join("photo.jpg").is_file());
        assert!(dir.path().join("photo.webp").is_file());
        assert!(!dir.path().join("photo.avif").exists());
    }

    #[test]
    fn test_derivative_mode_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("thumb-150x150.png");
        ImageBuffer::from_pixel(4, 4, Rgb([0u8, 0, 0])).save(&png).unwrap();
        let before = fs::read(&png).unwrap();

        let config = test_support::config(dir.path());
        optimize_images(&args(Vec::new(), true), &config).unwrap();

        assert_eq!(fs::read(&png).unwrap(), before);
        assert!(dir.path().join("thumb-150x150.webp").is_file());
    }

    #[test]
    fn test_features_off_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("a.jpg");
        ImageBuffer::from_pixel(4, 4, Rgb([9u8, 9, 9])).save(&jpg).unwrap();
        let before = fs::read(&jpg).unwrap();

        let mut config = test_support::config(dir.path());
        config.features.image_optimization = false;
        config.features.webp = false;
        optimize_images(&args(Vec::new(), false), &config).unwrap();

        assert_eq!(fs::read(&jpg).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_is_raster() {
        assert!(is_raster(Path::new("a.JPG")));
        assert!(is_raster(Path::new("a.gif")));
        assert!(!is_raster(Path::new("a.webp")));
        assert!(!is_raster(Path::new("a")));
    }
}
