//! CSS and JavaScript minification.
//!
//! The regex engine is the default and never fails; the syntax engine
//! (oxc / lightningcss) falls back to it when the input does not parse.
//!
//! Derived files are written beside their source as `<stem>.min.<ext>`;
//! sources are never modified.

mod pattern;
mod syntax;

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::MinifyEngine;
use crate::core::ResourceKind;
use crate::debug;

pub use pattern::{minify_css, minify_inline_css, minify_js};

/// Minify `text` with `engine`.
pub fn minify(kind: ResourceKind, text: &str, engine: MinifyEngine, module: bool) -> String {
    if engine == MinifyEngine::Syntax {
        let parsed = match kind {
            ResourceKind::Script => syntax::minify_js(text, module),
            ResourceKind::Style => syntax::minify_css(text),
        };
        if let Some(out) = parsed {
            return out;
        }
        debug!("minify"; "{} did not parse, using regex engine", kind.as_str());
    }
    match kind {
        ResourceKind::Script => minify_js(text),
        ResourceKind::Style => minify_css(text),
    }
}

/// Resource kind for a `.css` / `.js` / `.mjs` path.
fn kind_of(path: &Path) -> Option<ResourceKind> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "css" => Some(ResourceKind::Style),
        "js" | "mjs" => Some(ResourceKind::Script),
        _ => None,
    }
}

/// A CSS / JS source that does not yet carry the `.min` marker.
pub fn is_minifiable(path: &Path) -> bool {
    kind_of(path).is_some() && !is_minified(path)
}

/// File stem already ends in `.min`.
pub fn is_minified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(".min"))
}

/// Write `<stem>.min.<ext>` next to `path`.
///
/// Returns `Ok(None)` for files that are not CSS/JS or are already minified.
pub fn write_minified(path: &Path, engine: MinifyEngine) -> Result<Option<PathBuf>> {
    let Some(kind) = kind_of(path) else {
        return Ok(None);
    };
    if is_minified(path) {
        return Ok(None);
    }

    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let module = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".module.js") || n.ends_with(".mjs"));
    let minified = minify(kind, &source, engine, module);

    let out = minified_path(path);
    fs::write(&out, minified).with_context(|| format!("failed to write {}", out.display()))?;
    debug!("minify"; "{} -> {}", path.display(), out.display());
    Ok(Some(out))
}

/// Like [`write_minified`], but reuses a `.min` sibling that is not older
/// than its source.
pub fn ensure_minified(path: &Path, engine: MinifyEngine) -> Result<Option<PathBuf>> {
    if !is_minifiable(path) {
        return Ok(None);
    }
    let out = minified_path(path);
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    if let (Some(source), Some(derived)) = (modified(path), modified(&out))
        && derived >= source
    {
        return Ok(Some(out));
    }
    write_minified(path, engine)
}

fn minified_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let ext = path.extension().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!("{stem}.min.{ext}"))
}

/// Point a `.css` / `.js` reference at its `.min` sibling.
///
/// Only the final extension of the path part is touched; query and fragment
/// are kept. References that are already minified come back borrowed.
pub fn minified_src(src: &str) -> Cow<'_, str> {
    let split = src.find(['?', '#']).unwrap_or(src.len());
    let (path, tail) = src.split_at(split);

    for ext in [".css", ".js"] {
        let Some(stem) = path.strip_suffix(ext) else {
            continue;
        };
        if stem.ends_with(".min") || stem.is_empty() || stem.ends_with('/') {
            return Cow::Borrowed(src);
        }
        return Cow::Owned(format!("{stem}.min{ext}{tail}"));
    }
    Cow::Borrowed(src)
}
