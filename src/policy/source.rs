//! Source URL rewrites: version query removal, CDN origin, preload `Link`
//! headers and Google Fonts request merging.

use std::borrow::Cow;
use std::path::Path;

use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::core::{PRIORITY_HANDLES, ResourceDescriptor};
use crate::utils::mime;

pub const GOOGLE_FONTS_HOST: &str = "fonts.googleapis.com";

/// Resolve `src` (absolute, protocol-relative or path) against the site.
pub fn resolve(src: &str, site: &Url) -> Option<Url> {
    site.join(src).ok()
}

fn same_origin(url: &Url, site: &Url) -> bool {
    url.origin() == site.origin()
}

/// Drop the `ver` query parameter, keeping every other parameter verbatim.
pub fn strip_version_query(src: &str) -> Cow<'_, str> {
    let (without_fragment, fragment) = match src.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (src, None),
    };
    let Some((base, query)) = without_fragment.split_once('?') else {
        return Cow::Borrowed(src);
    };

    let is_ver = |pair: &str| pair == "ver" || pair.starts_with("ver=");
    if !query.split('&').any(is_ver) {
        return Cow::Borrowed(src);
    }

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_ver(pair))
        .collect();

    let mut out = base.to_string();
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    Cow::Owned(out)
}

/// Move a same-origin static asset to the CDN origin.
///
/// Documents and foreign URLs are returned unchanged. The CDN url may carry
/// a path prefix, which is kept.
pub fn rewrite_cdn<'a>(src: &'a str, site: &Url, cdn: &Url) -> Cow<'a, str> {
    let Some(url) = resolve(src, site) else {
        return Cow::Borrowed(src);
    };
    if !same_origin(&url, site) || !mime::is_static_asset(mime::from_path(Path::new(url.path()))) {
        return Cow::Borrowed(src);
    }

    let mut out = cdn.as_str().trim_end_matches('/').to_string();
    out.push_str(url.path());
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    Cow::Owned(out)
}

/// `Link` header value preloading a same-origin script or stylesheet.
///
/// `None` for third-party sources, which must not be pushed.
pub fn preload_link_header(desc: &ResourceDescriptor, site: &Url) -> Option<String> {
    let url = resolve(&desc.src, site)?;
    if !same_origin(&url, site) {
        return None;
    }
    let priority = if PRIORITY_HANDLES.contains(&desc.handle.as_str()) {
        "high"
    } else {
        "auto"
    };
    Some(format!(
        "<{}>; rel=preload; as={}; fetchpriority={priority}",
        desc.src,
        desc.kind.as_str()
    ))
}

/// Combine several Google Fonts stylesheet URLs into one request.
///
/// Families are deduplicated in first-seen order and joined with `|`.
/// Returns `None` when no family is found.
pub fn merge_google_fonts<'a, I>(urls: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut families: Vec<String> = Vec::new();

    for raw in urls {
        let Ok(url) = Url::parse(&absolute_scheme(raw)) else {
            continue;
        };
        if url.host_str() != Some(GOOGLE_FONTS_HOST) {
            continue;
        }
        for (key, value) in url.query_pairs() {
            if key != "family" {
                continue;
            }
            for family in value.split('|').map(str::trim).filter(|f| !f.is_empty()) {
                if !families.iter().any(|f| f == family) {
                    families.push(family.to_string());
                }
            }
        }
    }

    if families.is_empty() {
        return None;
    }

    let encoded: Vec<String> = families
        .iter()
        .map(|family| byte_serialize(family.as_bytes()).collect())
        .collect();
    Some(format!(
        "https://{GOOGLE_FONTS_HOST}/css?family={}",
        encoded.join("|")
    ))
}

/// Protocol-relative `//host/...` URLs get an `https:` scheme.
fn absolute_scheme(raw: &str) -> Cow<'_, str> {
    if raw.starts_with("//") {
        Cow::Owned(format!("https:{raw}"))
    } else {
        Cow::Borrowed(raw)
    }
}
