//! Request path to document-root file resolution.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL to a file under `root`.
///
/// Directories resolve to their `index.html`. Anything that escapes the root,
/// including through symlinks, is rejected.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = url_path(url);
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let canonical = root.join(clean.trim_matches('/')).canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Decoded path part of a request URL, query and fragment removed.
pub fn url_path(url: &str) -> Cow<'_, str> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    percent_decode_str(&url[..end])
        .decode_utf8()
        .unwrap_or(Cow::Borrowed("/"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_url_path() {
        assert_eq!(url_path("/a%20b/c.css?ver=1#x"), "/a b/c.css");
        assert_eq!(url_path("/"), "/");
    }

    #[test]
    fn test_resolve_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("post")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("post/index.html"), "post").unwrap();
        fs::write(dir.path().join("app.js"), "").unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(resolve_path("/", dir.path()), Some(root.join("index.html")));
        assert_eq!(resolve_path("/post/", dir.path()), Some(root.join("post/index.html")));
        assert_eq!(resolve_path("/app.js?ver=2", dir.path()), Some(root.join("app.js")));
        assert_eq!(resolve_path("/missing.js", dir.path()), None);
        assert_eq!(resolve_path("/post/../../etc/passwd", dir.path()), None);
        assert_eq!(resolve_path("/%2e%2e/etc/passwd", dir.path()), None);
    }
}
