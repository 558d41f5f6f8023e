//! Upload post-processing and modern-format derivatives.
//!
//! Every public entry point is infallible: a file that cannot be read,
//! sniffed, decoded or encoded is left exactly as it was.
//!
//! | Input             | Upload step                          |
//! |-------------------|--------------------------------------|
//! | PNG, opaque       | JPEG q85 at `<stem>.jpg`, PNG removed |
//! | PNG, transparent  | PNG, best compression, same path     |
//! | JPEG              | JPEG q85, same path                  |
//! | GIF / other       | untouched                            |

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageFormat as Sniffed};
use thiserror::Error;

use crate::core::ImageFormat;
use crate::debug;
use crate::utils::mime;

/// JPEG quality for upload re-encoding.
const JPEG_QUALITY: u8 = 85;

/// AVIF quality when none is configured.
pub const DEFAULT_AVIF_QUALITY: u8 = 80;

/// rav1e speed preset (1 slowest .. 10 fastest).
#[cfg(feature = "avif")]
const AVIF_SPEED: u8 = 6;

/// Upper bound of pixels inspected by [`has_transparency`].
pub const TRANSPARENCY_SAMPLE_LIMIT: u64 = 1_048_576;

#[derive(Debug, Error)]
enum TranscodeError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("codec: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported source format")]
    Unsupported,

    #[error("{0} encoder failed: {1}")]
    Encode(&'static str, String),

    #[cfg(not(feature = "avif"))]
    #[error("{0} encoder not compiled in")]
    Unavailable(&'static str),
}

type Result<T> = std::result::Result<T, TranscodeError>;

// ============================================================================
// Upload
// ============================================================================

/// Where an upload ended up and what it is now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: PathBuf,
    pub mime: &'static str,
}

impl Upload {
    fn unchanged(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            mime: mime::from_path(path),
        }
    }
}

/// Re-encode an uploaded raster image in place (or as JPEG for opaque PNGs).
pub fn optimize_upload(path: &Path) -> Upload {
    match try_optimize_upload(path) {
        Ok(upload) => upload,
        Err(e) => {
            debug!("image"; "leaving {} unchanged: {}", path.display(), e);
            Upload::unchanged(path)
        }
    }
}

fn try_optimize_upload(path: &Path) -> Result<Upload> {
    let bytes = fs::read(path)?;
    let format = image::guess_format(&bytes)?;

    match format {
        Sniffed::Png => {
            let img = image::load_from_memory_with_format(&bytes, format)?;
            if has_transparency(&img) {
                fs::write(path, encode_png(&img)?)?;
                return Ok(Upload {
                    path: path.to_path_buf(),
                    mime: ImageFormat::Png.mime(),
                });
            }

            let bytes = encode_jpeg(&img, JPEG_QUALITY)?;
            let jpg = write_sibling(path, ImageFormat::Jpeg.extension(), &bytes)?;
            if jpg != path {
                fs::remove_file(path)?;
            }
            debug!("image"; "converted {} to {}", path.display(), jpg.display());
            Ok(Upload {
                path: jpg,
                mime: ImageFormat::Jpeg.mime(),
            })
        }
        Sniffed::Jpeg => {
            let img = image::load_from_memory_with_format(&bytes, format)?;
            fs::write(path, encode_jpeg(&img, JPEG_QUALITY)?)?;
            Ok(Upload {
                path: path.to_path_buf(),
                mime: ImageFormat::Jpeg.mime(),
            })
        }
        Sniffed::Gif => Ok(Upload {
            path: path.to_path_buf(),
            mime: mime::types::GIF,
        }),
        _ => Err(TranscodeError::Unsupported),
    }
}

/// Write `bytes` to `<stem>.<ext>` next to `path`, or to the first free
/// `<stem>-<n>.<ext>` when another file already holds that name.
///
/// Names are claimed with `create_new`, so concurrent writers never share one.
fn write_sibling(path: &Path, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    let candidate = path.with_extension(extension);
    if candidate == path {
        fs::write(path, bytes)?;
        return Ok(candidate);
    }

    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let mut name = candidate;
    let mut n = 0u32;
    loop {
        match fs::OpenOptions::new().write(true).create_new(true).open(&name) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(name);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                n += 1;
                name = path.with_file_name(format!("{stem}-{n}.{extension}"));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Write a `<stem>.webp` sibling of a JPEG or PNG upload.
pub fn convert_upload_to_webp(path: &Path, quality: u8) -> Option<PathBuf> {
    let result = decode_raster(path, &[Sniffed::Jpeg, Sniffed::Png]).and_then(|img| {
        let out = path.with_extension(ImageFormat::Webp.extension());
        fs::write(&out, encode_webp(&img, quality)?)?;
        Ok(out)
    });
    match result {
        Ok(out) => Some(out),
        Err(e) => {
            debug!("image"; "no webp for {}: {}", path.display(), e);
            None
        }
    }
}

// ============================================================================
// Derivatives
// ============================================================================

/// Encoders available to [`generate_derivatives`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoders {
    pub webp: bool,
    pub avif: bool,
    pub avif_quality: u8,
}

impl Encoders {
    /// Encoders compiled into this binary.
    pub const fn detect() -> Self {
        Self {
            webp: true,
            avif: cfg!(feature = "avif"),
            avif_quality: DEFAULT_AVIF_QUALITY,
        }
    }

    pub const fn with_avif_quality(mut self, quality: u8) -> Self {
        self.avif_quality = quality;
        self
    }
}

impl Default for Encoders {
    fn default() -> Self {
        Self::detect()
    }
}

/// Derivative files written next to a source image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derivatives {
    pub webp: Option<PathBuf>,
    pub avif: Option<PathBuf>,
}

impl Derivatives {
    pub fn formats(&self) -> impl Iterator<Item = ImageFormat> {
        [
            self.webp.as_ref().map(|_| ImageFormat::Webp),
            self.avif.as_ref().map(|_| ImageFormat::Avif),
        ]
        .into_iter()
        .flatten()
    }
}

/// WebP quality for a derivative, from its pixel area.
///
/// Strictly greater than 1,000,000 → 75, strictly greater than 500,000 → 80,
/// otherwise 85.
pub const fn derivative_quality(width: u32, height: u32) -> u8 {
    let area = width as u64 * height as u64;
    if area > 1_000_000 {
        75
    } else if area > 500_000 {
        80
    } else {
        85
    }
}

/// Write `<stem>.webp` and `<stem>.avif` for a JPEG, PNG or GIF source.
///
/// A failing encoder only skips its own derivative.
pub fn generate_derivatives(path: &Path, encoders: &Encoders) -> Derivatives {
    let img = match decode_raster(path, &[Sniffed::Jpeg, Sniffed::Png, Sniffed::Gif]) {
        Ok(img) => img,
        Err(e) => {
            debug!("image"; "no derivatives for {}: {}", path.display(), e);
            return Derivatives::default();
        }
    };

    let mut derivatives = Derivatives::default();

    if encoders.webp {
        let quality = derivative_quality(img.width(), img.height());
        derivatives.webp = write_derivative(path, ImageFormat::Webp, || encode_webp(&img, quality));
    }
    if encoders.avif {
        derivatives.avif =
            write_derivative(path, ImageFormat::Avif, || encode_avif(&img, encoders.avif_quality));
    }

    derivatives
}

fn write_derivative<F>(source: &Path, format: ImageFormat, encode: F) -> Option<PathBuf>
where
    F: FnOnce() -> Result<Vec<u8>>,
{
    let out = source.with_extension(format.extension());
    match encode().and_then(|bytes| fs::write(&out, bytes).map_err(TranscodeError::from)) {
        Ok(()) => Some(out),
        Err(e) => {
            debug!("image"; "skipping {}: {}", out.display(), e);
            None
        }
    }
}

// ============================================================================
// Transparency
// ============================================================================

/// Whether any inspected pixel has alpha below 255.
///
/// Images above [`TRANSPARENCY_SAMPLE_LIMIT`] pixels are sampled with a
/// uniform stride, so a lone transparent pixel may be missed.
pub fn has_transparency(img: &DynamicImage) -> bool {
    if !img.color().has_alpha() {
        return false;
    }

    let (width, height) = img.dimensions();
    let total = u64::from(width) * u64::from(height);
    if total == 0 {
        return false;
    }
    let stride = total.div_ceil(TRANSPARENCY_SAMPLE_LIMIT).max(1);

    let mut index = 0;
    while index < total {
        let x = (index % u64::from(width)) as u32;
        let y = (index / u64::from(width)) as u32;
        if img.get_pixel(x, y)[3] < u8::MAX {
            return true;
        }
        index += stride;
    }
    false
}

// ============================================================================
// Codecs
// ============================================================================

fn decode_raster(path: &Path, accepted: &[Sniffed]) -> Result<DynamicImage> {
    let bytes = fs::read(path)?;
    let format = image::guess_format(&bytes)?;
    if !accepted.contains(&format) {
        return Err(TranscodeError::Unsupported);
    }
    Ok(image::load_from_memory_with_format(&bytes, format)?)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // The webp encoder only accepts 8-bit RGB / RGBA buffers.
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let encoder = webp::Encoder::from_image(&img)
        .map_err(|e| TranscodeError::Encode("webp", e.to_string()))?;
    Ok(encoder.encode(f32::from(quality)).to_vec())
}

#[cfg(feature = "avif")]
fn encode_avif(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    use ravif::{Img, RGBA8};

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<RGBA8> = rgba
        .pixels()
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();

    let encoded = ravif::Encoder::new()
        .with_quality(f32::from(quality))
        .with_speed(AVIF_SPEED)
        .encode_rgba(Img::new(pixels.as_slice(), width as usize, height as usize))
        .map_err(|e| TranscodeError::Encode("avif", e.to_string()))?;
    Ok(encoded.avif_file)
}

#[cfg(not(feature = "avif"))]
fn encode_avif(_img: &DynamicImage, _quality: u8) -> Result<Vec<u8>> {
    Err(TranscodeError::Unavailable("avif"))
}
