//! Chapter titles from the book's navigation document.
//!
//! Two formats are understood: the EPUB 3 navigation document (an XHTML
//! file whose `<nav epub:type="toc">` holds nested `<a href>` links) and
//! the EPUB 2 NCX (`navPoint` → `navLabel/text` + `content@src`).
//!
//! A table of contents is an enhancement only. Every failure here (missing
//! file, malformed XML, no entries) yields an empty map and the loader
//! falls back to `"Chapter N"` titles.

use crate::output::ManifestEntry;
use crate::pipeline::{decode, href, xml};
use roxmltree::Node;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Read the navigation document at `toc_path` (archive-relative) and map
/// each target's archive-relative path to its label.
pub async fn read_titles(scratch_dir: &Path, toc_path: &str) -> HashMap<String, String> {
    let path = href::to_fs_path(scratch_dir, toc_path);
    match tokio::fs::read(&path).await {
        Ok(bytes) => parse_toc(&decode::decode_text(&bytes), href::parent(toc_path)),
        Err(e) => {
            debug!("Navigation document {} unreadable: {}", toc_path, e);
            HashMap::new()
        }
    }
}

/// Parse navigation document text. `toc_dir` is the archive-relative
/// directory the document's hrefs are relative to.
///
/// Fragments are dropped from targets, so several entries pointing into
/// one file collapse onto it; the first label in document order wins.
pub fn parse_toc(text: &str, toc_dir: &str) -> HashMap<String, String> {
    let doc = match xml::parse(text) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Navigation document is not well-formed: {}", e);
            return HashMap::new();
        }
    };
    let root = doc.root_element();
    let entries = if root.tag_name().name() == "ncx" {
        ncx_entries(root)
    } else {
        nav_entries(root)
    };

    let mut titles = HashMap::new();
    for (target, label) in entries {
        let target = href::strip_fragment(target);
        if target.is_empty() {
            continue;
        }
        let key = href::resolve(toc_dir, target);
        titles.entry(key).or_insert(label);
    }
    debug!("Navigation document yielded {} titles", titles.len());
    titles
}

/// Copy titles onto manifest entries whose resolved href has one.
pub fn apply_titles(
    manifest: &mut HashMap<String, ManifestEntry>,
    base_dir: &str,
    titles: &HashMap<String, String>,
) {
    if titles.is_empty() {
        return;
    }
    for entry in manifest.values_mut() {
        let key = href::resolve(base_dir, href::strip_fragment(&entry.href));
        if let Some(title) = titles.get(&key) {
            entry.title = Some(title.clone());
        }
    }
}

// ── EPUB 3 navigation document ───────────────────────────────────────────────

fn nav_entries<'a>(root: Node<'a, '_>) -> Vec<(&'a str, String)> {
    let navs: Vec<_> = root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "nav")
        .collect();
    let Some(nav) = navs
        .iter()
        .find(|n| is_toc_nav(**n))
        .or_else(|| navs.first())
    else {
        return Vec::new();
    };

    nav.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "a")
        .filter_map(|a| Some((a.attribute("href")?, xml::trimmed_text(a)?)))
        .collect()
}

/// `epub:type` is namespaced, so match on the local attribute name.
fn is_toc_nav(nav: Node<'_, '_>) -> bool {
    nav.attributes()
        .any(|attr| attr.name() == "type" && attr.value().split_whitespace().any(|t| t == "toc"))
}

// ── EPUB 2 NCX ───────────────────────────────────────────────────────────────

fn ncx_entries<'a>(root: Node<'a, '_>) -> Vec<(&'a str, String)> {
    root.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "navPoint")
        .filter_map(|point| {
            let label = xml::child(point, "navLabel")
                .and_then(|l| xml::child(l, "text"))
                .and_then(xml::trimmed_text)?;
            let src = xml::child(point, "content")?.attribute("src")?;
            Some((src, label))
        })
        .collect()
}
