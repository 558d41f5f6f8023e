//! Input collection shared by the batch commands.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use jwalk::WalkDir;

/// Expand CLI paths into the files `accept` keeps.
///
/// No paths means the whole `root`; a single `-` reads paths from stdin.
/// Directories are walked recursively; explicit files must be accepted.
pub fn collect_files<F>(paths: &[PathBuf], root: &Path, accept: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let paths = if paths.len() == 1 && paths[0].as_os_str() == "-" {
        read_paths_from_stdin()?
    } else if paths.is_empty() {
        vec![root.to_path_buf()]
    } else {
        paths.to_vec()
    };

    let mut files = Vec::new();
    for path in &paths {
        if path.is_file() {
            if !accept(path) {
                bail!("not a supported file: {}", path.display());
            }
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk(path).into_iter().filter(|p| accept(p)));
        } else {
            bail!("path not found: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect()
}

/// Read lines from stdin, skipping blanks.
pub fn read_lines_from_stdin() -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

fn read_paths_from_stdin() -> Result<Vec<PathBuf>> {
    Ok(read_lines_from_stdin()?.into_iter().map(PathBuf::from).collect())
}

/// `1 file`, `3 files`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn is_css(path: &Path) -> bool {
        path.extension().is_some_and(|e| e == "css")
    }

    #[test]
    fn test_collect_defaults_to_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/x.css"), "").unwrap();
        fs::write(dir.path().join("y.css"), "").unwrap();
        fs::write(dir.path().join("z.js"), "").unwrap();

        let files = collect_files(&[], dir.path(), is_css).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_css(f)));
    }

    #[test]
    fn test_collect_rejects_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let js = dir.path().join("z.js");
        fs::write(&js, "").unwrap();

        assert!(collect_files(&[js], dir.path(), is_css).is_err());
        assert!(collect_files(&[dir.path().join("nope")], dir.path(), is_css).is_err());
    }

    #[test]
    fn test_collect_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("y.css");
        fs::write(&css, "").unwrap();

        let files = collect_files(&[css.clone(), dir.path().to_path_buf()], dir.path(), is_css).unwrap();
        assert_eq!(files, [css]);
    }

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "file"), "0 files");
        assert_eq!(plural_count(1, "file"), "1 file");
        assert_eq!(plural_count(2, "image"), "2 images");
    }
}
