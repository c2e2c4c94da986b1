//! Container resolution: find the package document named by
//! `META-INF/container.xml`.
//!
//! Only the first `rootfiles/rootfile` is honoured. Books that ship several
//! renditions load their first one; there is no selection heuristic.

use crate::error::ContainerError;
use crate::pipeline::{href, xml};
use std::path::Path;
use tracing::debug;

/// Location of the container descriptor inside every EPUB.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Read the container descriptor under `scratch_dir` and return the
/// archive-relative path of the package document.
pub async fn resolve_opf_path(scratch_dir: &Path) -> Result<String, ContainerError> {
    let path = href::to_fs_path(scratch_dir, CONTAINER_PATH);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ContainerError::InvalidContainer {
            reason: format!("cannot read {CONTAINER_PATH}: {e}"),
        })?;
    let text = crate::pipeline::decode::decode_text(&bytes);
    let opf = parse_container(&text)?;
    debug!("Package document: {}", opf);
    Ok(opf)
}

/// Extract the first rootfile's `full-path` from container XML.
pub fn parse_container(text: &str) -> Result<String, ContainerError> {
    let invalid = |reason: &str| ContainerError::InvalidContainer {
        reason: reason.to_string(),
    };

    let doc = xml::parse(text).map_err(|e| ContainerError::InvalidContainer {
        reason: format!("malformed XML: {e}"),
    })?;

    let rootfile = xml::child(doc.root_element(), "rootfiles")
        .and_then(|rootfiles| xml::child(rootfiles, "rootfile"))
        .ok_or_else(|| invalid("no rootfiles/rootfile element"))?;

    let full_path = rootfile
        .attribute("full-path")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid("rootfile has no full-path attribute"))?;

    // `full-path` is a plain archive path, not a URL reference.
    let resolved = href::join_path("", full_path);
    if resolved.is_empty() {
        return Err(invalid("rootfile full-path resolves to the archive root"));
    }
    Ok(resolved)
}
