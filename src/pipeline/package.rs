//! Package document (OPF) parsing: metadata, manifest and spine.
//!
//! ## Which manifest entries are kept?
//!
//! Only entries whose `media-type` contains `"html"` (case-sensitive
//! substring, which also covers `application/xhtml+xml`) are retained for
//! rendering. Images, styles and fonts are parsed but not retained.

use crate::config::LoaderConfig;
use crate::error::PackageError;
use crate::output::{ManifestEntry, PackageMetadata};
use crate::pipeline::{decode, href, toc, xml};
use roxmltree::Node;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Media type of an EPUB 2 navigation control file.
const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Everything the content loader needs from the package document.
#[derive(Debug, Clone)]
pub struct Package {
    pub metadata: PackageMetadata,
    /// Retained (HTML/XHTML) entries keyed by id.
    pub manifest: HashMap<String, ManifestEntry>,
    /// Spine `idref`s in reading order, unfiltered.
    pub spine: Vec<String>,
    /// Archive-relative directory of the package document (`""` at the root).
    pub base_dir: String,
    /// Archive-relative path of the navigation document, when one is declared.
    pub toc_path: Option<String>,
}

/// A manifest `item` before the HTML filter.
#[derive(Debug, Clone)]
struct RawItem {
    id: String,
    href: String,
    media_type: String,
    properties: Option<String>,
}

/// Read and parse the package document at `opf_rel` (archive-relative)
/// under `scratch_dir`.
///
/// When [`LoaderConfig::resolve_toc_titles`] is set, manifest titles are
/// filled from the navigation document; a missing or broken TOC only
/// leaves titles unset.
pub async fn parse_package(
    scratch_dir: &Path,
    opf_rel: &str,
    config: &LoaderConfig,
) -> Result<Package, PackageError> {
    let opf_path = href::to_fs_path(scratch_dir, opf_rel);
    let bytes = tokio::fs::read(&opf_path)
        .await
        .map_err(|e| PackageError::InvalidOpf {
            path: opf_path.clone(),
            detail: e.to_string(),
        })?;
    let text = decode::decode_text(&bytes);
    let mut package = parse_opf(&text, &opf_path, href::parent(opf_rel))?;

    if config.resolve_toc_titles {
        if let Some(toc_path) = package.toc_path.as_deref() {
            let titles = toc::read_titles(scratch_dir, toc_path).await;
            toc::apply_titles(&mut package.manifest, &package.base_dir, &titles);
        }
    }

    info!(
        "Package '{}': {} retained manifest entries, {} spine references",
        package.metadata.title,
        package.manifest.len(),
        package.spine.len()
    );
    Ok(package)
}

/// Parse package document text. `opf_path` is only used in errors.
pub fn parse_opf(text: &str, opf_path: &Path, base_dir: &str) -> Result<Package, PackageError> {
    let doc = xml::parse(text).map_err(|e| PackageError::InvalidOpf {
        path: opf_path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let root = doc.root_element();
    let path = || opf_path.to_path_buf();

    let metadata_el =
        xml::child(root, "metadata").ok_or_else(|| PackageError::InvalidMetadata { path: path() })?;
    let manifest_el =
        xml::child(root, "manifest").ok_or_else(|| PackageError::InvalidManifest { path: path() })?;
    let spine_el =
        xml::child(root, "spine").ok_or_else(|| PackageError::InvalidSpine { path: path() })?;

    let metadata = parse_metadata(metadata_el);
    let items = parse_manifest_items(manifest_el);
    let spine = parse_spine(spine_el);
    let toc_path = find_toc(&items, spine_el.attribute("toc")).map(|h| href::resolve(base_dir, h));

    let manifest: HashMap<String, ManifestEntry> = items
        .into_values()
        .filter(|item| item.media_type.contains("html"))
        .map(|item| {
            (
                item.id.clone(),
                ManifestEntry {
                    id: item.id,
                    href: item.href,
                    media_type: item.media_type,
                    title: None,
                },
            )
        })
        .collect();

    Ok(Package {
        metadata,
        manifest,
        spine,
        base_dir: base_dir.to_string(),
        toc_path,
    })
}

/// First-match values from `<metadata>`, with defaults for what is missing.
fn parse_metadata(metadata: Node<'_, '_>) -> PackageMetadata {
    let value = |name: &str| xml::child(metadata, name).and_then(xml::trimmed_text);

    PackageMetadata {
        title: value("title").unwrap_or_else(|| "Untitled".to_string()),
        creator: value("creator"),
        language: value("language").unwrap_or_else(|| "en".to_string()),
        identifier: value("identifier").unwrap_or_else(|| Uuid::new_v4().to_string()),
        publisher: value("publisher"),
        date: value("date"),
        rights: value("rights"),
    }
}

/// Every complete `item`, keyed by id; a later duplicate id replaces an earlier one.
fn parse_manifest_items(manifest: Node<'_, '_>) -> HashMap<String, RawItem> {
    let mut items = HashMap::new();
    for node in xml::children(manifest, "item") {
        let (Some(id), Some(href), Some(media_type)) = (
            node.attribute("id"),
            node.attribute("href"),
            node.attribute("media-type"),
        ) else {
            debug!("Skipping incomplete manifest item: {:?}", node.attribute("id"));
            continue;
        };
        items.insert(
            id.to_string(),
            RawItem {
                id: id.to_string(),
                href: href.to_string(),
                media_type: media_type.to_string(),
                properties: node.attribute("properties").map(str::to_string),
            },
        );
    }
    items
}

fn parse_spine(spine: Node<'_, '_>) -> Vec<String> {
    xml::children(spine, "itemref")
        .filter_map(|n| n.attribute("idref"))
        .filter(|idref| !idref.is_empty())
        .map(str::to_string)
        .collect()
}

/// Href of the navigation document: EPUB 3 `nav` property first, then the
/// spine's `toc` idref, then any NCX item.
fn find_toc<'a>(items: &'a HashMap<String, RawItem>, spine_toc: Option<&str>) -> Option<&'a str> {
    let nav = items.values().find(|item| {
        item.properties
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|t| t == "nav"))
    });
    nav.or_else(|| spine_toc.and_then(|id| items.get(id)))
        .or_else(|| items.values().find(|item| item.media_type == NCX_MEDIA_TYPE))
        .map(|item| item.href.as_str())
}
