//! Resolution of manifest and TOC hrefs to archive-relative paths.
//!
//! All paths inside the scratch directory are handled as `/`-separated
//! strings relative to the archive root until the last moment, so `..`
//! can be collapsed lexically and can never climb out of the root.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Drop any `#fragment` or `?query` suffix.
pub fn strip_fragment(href: &str) -> &str {
    href.split(['#', '?']).next().unwrap_or(href)
}

/// Directory part of an archive-relative path (`""` for the root).
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve `href` against `base_dir`, both archive-relative.
///
/// Percent-escapes are decoded, then the result goes through
/// [`join_path`]. An href starting with `/` is taken relative to the root.
pub fn resolve(base_dir: &str, href: &str) -> String {
    let decoded = percent_decode_str(strip_fragment(href)).decode_utf8_lossy();
    join_path(base_dir, &decoded)
}

/// Join a plain archive path onto `base_dir` without any URL decoding.
///
/// `.` and empty segments are dropped, and `..` pops a segment (clamped
/// at the archive root).
pub fn join_path(base_dir: &str, path: &str) -> String {
    let mut segments: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}

/// Turn an archive-relative path into a filesystem path under `root`.
pub fn to_fs_path(root: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |p, seg| p.join(seg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_to_base() {
        assert_eq!(resolve("OEBPS", "text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve("", "ch1.xhtml"), "ch1.xhtml");
    }

    #[test]
    fn collapses_dot_segments() {
        assert_eq!(resolve("OEBPS/text", "../images/a.png"), "OEBPS/images/a.png");
        assert_eq!(resolve("OEBPS", "./ch1.xhtml"), "OEBPS/ch1.xhtml");
    }

    #[test]
    fn dotdot_is_clamped_at_root() {
        assert_eq!(resolve("OEBPS", "../../../etc/passwd"), "etc/passwd");
    }

    #[test]
    fn strips_fragment_and_decodes() {
        assert_eq!(resolve("OEBPS", "chapter%201.xhtml#sec2"), "OEBPS/chapter 1.xhtml");
        assert_eq!(strip_fragment("a.xhtml?x=1"), "a.xhtml");
    }

    #[test]
    fn join_path_keeps_escapes_and_hashes() {
        assert_eq!(join_path("", "./OPS/a%20b#1.opf"), "OPS/a%20b#1.opf");
        assert_eq!(join_path("OPS", "../x.opf"), "x.opf");
    }

    #[test]
    fn absolute_href_starts_at_root() {
        assert_eq!(resolve("OEBPS", "/Text/ch1.xhtml"), "Text/ch1.xhtml");
    }

    #[test]
    fn parent_of_root_file_is_empty() {
        assert_eq!(parent("content.opf"), "");
        assert_eq!(parent("OEBPS/content.opf"), "OEBPS");
    }

    #[test]
    fn fs_path_joins_segments() {
        let p = to_fs_path(Path::new("/scratch"), "OEBPS/ch1.xhtml");
        assert_eq!(p, Path::new("/scratch").join("OEBPS").join("ch1.xhtml"));
    }
}
