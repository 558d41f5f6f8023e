//! Modern-format substitution in `srcset` candidate lists.

use std::borrow::Cow;

/// The `.webp` sibling URL of a `.jpg` / `.jpeg` / `.png` URL.
///
/// Only a trailing extension counts; URLs with a query string are skipped.
pub fn webp_sibling(url: &str) -> Option<String> {
    let dot = url.rfind('.')?;
    let ext = &url[dot + 1..];
    if url[dot..].contains(['/', '?', '#']) {
        return None;
    }
    matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png")
        .then(|| format!("{}.webp", &url[..dot]))
}

/// Replace each raster candidate with its `.webp` sibling when `exists`
/// reports the sibling is present.
///
/// Descriptors (`480w`, `2x`) and candidate order are preserved.
pub fn prefer_modern_sources<'a, F>(srcset: &'a str, exists: F) -> Cow<'a, str>
where
    F: Fn(&str) -> bool,
{
    let mut changed = false;
    let candidates: Vec<String> = srcset
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|candidate| {
            let (url, descriptor) = match candidate.split_once(char::is_whitespace) {
                Some((url, descriptor)) => (url, Some(descriptor.trim())),
                None => (candidate, None),
            };
            let url = match webp_sibling(url) {
                Some(webp) if exists(&webp) => {
                    changed = true;
                    webp
                }
                _ => url.to_string(),
            };
            match descriptor {
                Some(descriptor) => format!("{url} {descriptor}"),
                None => url,
            }
        })
        .collect();

    if changed {
        Cow::Owned(candidates.join(", "))
    } else {
        Cow::Borrowed(srcset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webp_sibling() {
        assert_eq!(webp_sibling("/img/a.jpg").as_deref(), Some("/img/a.webp"));
        assert_eq!(webp_sibling("/img/a.JPEG").as_deref(), Some("/img/a.webp"));
        assert_eq!(webp_sibling("/img/a.png").as_deref(), Some("/img/a.webp"));
        assert_eq!(webp_sibling("/img/a.gif"), None);
        assert_eq!(webp_sibling("/img/a.jpg?w=300"), None);
        assert_eq!(webp_sibling("/img.d/photo"), None);
    }

    #[test]
    fn test_prefer_modern_sources() {
        let srcset = "/a-300.jpg 300w, /a-600.jpg 600w, /a-900.png 900w";
        let out = prefer_modern_sources(srcset, |url| url != "/a-600.webp");
        assert_eq!(out, "/a-300.webp 300w, /a-600.jpg 600w, /a-900.webp 900w");
    }

    #[test]
    fn test_prefer_modern_sources_unchanged() {
        let srcset = "/a.jpg 1x, /a@2x.jpg 2x";
        assert!(matches!(prefer_modern_sources(srcset, |_| false), Cow::Borrowed(_)));
    }
}
