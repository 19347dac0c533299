use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;

use super::model::{Document, PendingResource};
use crate::foundation::error::{StowError, StowResult};

/// Read a document from `path` and load every resource it references.
///
/// Relative URIs resolve against the document's directory.
pub fn load_document(path: &Path) -> StowResult<Document> {
    let bytes = std::fs::read(path).map_err(|e| StowError::io("read", path, e))?;
    let mut doc = Document::from_slice(&bytes)?;
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    read_resources(&mut doc, root)?;
    Ok(doc)
}

/// Attach a pending payload to every buffer, image, and shader of `doc`.
///
/// - `data:` URIs are decoded in place. Embedded images and shaders get a content identity so
///   byte-identical copies are written once.
/// - Relative URIs are read from `root`; the normalized URI becomes both the identity and the
///   explicit output path.
/// - Images stored in a bufferView are copied out of their (already loaded) buffer.
pub fn read_resources(doc: &mut Document, root: &Path) -> StowResult<()> {
    for buffer in &mut doc.buffers {
        if let Some(uri) = buffer.uri.as_deref() {
            buffer.pending = Some(load_uri(uri, root, false)?);
        }
    }

    for i in 0..doc.images.len() {
        let pending = match (doc.images[i].uri.as_deref(), doc.images[i].buffer_view) {
            (Some(uri), _) => load_uri(uri, root, true)?,
            (None, Some(view)) => PendingResource::new(buffer_view_bytes(doc, view)?).with_content_id(),
            (None, None) => continue,
        };
        doc.images[i].pending = Some(pending);
    }

    for i in 0..doc.shaders.len() {
        let pending = match (doc.shaders[i].uri.as_deref(), doc.shaders[i].buffer_view) {
            (Some(uri), _) => load_uri(uri, root, true)?,
            (None, Some(view)) => PendingResource::new(buffer_view_bytes(doc, view)?).with_content_id(),
            (None, None) => continue,
        };
        doc.shaders[i].pending = Some(pending);
    }
    Ok(())
}

/// Decode the payload of a base64 `data:` URI.
pub fn parse_data_uri(uri: &str) -> StowResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| StowError::validation("not a data uri"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| StowError::validation("data uri has no ',' separator"))?;
    if !header.ends_with(";base64") {
        return Err(StowError::validation(
            "only base64-encoded data uris are supported",
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| StowError::validation(format!("invalid base64 in data uri: {e}")))
}

/// Normalize and validate document-relative resource paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> StowResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StowError::validation("resource paths must be relative"));
    }
    if s.is_empty() {
        return Err(StowError::validation("resource path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StowError::validation(
                "resource paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StowError::validation(
            "resource path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

fn load_uri(uri: &str, root: &Path, content_id: bool) -> StowResult<PendingResource> {
    if uri.starts_with("data:") {
        let pending = PendingResource::new(parse_data_uri(uri)?);
        return Ok(if content_id {
            pending.with_content_id()
        } else {
            pending
        });
    }

    let norm = normalize_rel_path(uri)?;
    let path = root.join(&norm);
    let bytes = std::fs::read(&path).map_err(|e| StowError::io("read", &path, e))?;
    Ok(PendingResource {
        source: Arc::new(bytes),
        resource_id: Some(norm.clone()),
        relative_path: Some(norm),
    })
}

fn buffer_view_bytes(doc: &Document, view_index: usize) -> StowResult<Vec<u8>> {
    let view = doc.buffer_views.get(view_index).ok_or_else(|| {
        StowError::validation(format!("missing bufferView {view_index}"))
    })?;
    let source = doc
        .buffers
        .get(view.buffer)
        .and_then(|b| b.pending.as_ref())
        .ok_or_else(|| {
            StowError::validation(format!(
                "bufferView {view_index} references unloaded buffer {}",
                view.buffer
            ))
        })?;
    let start = view.byte_offset as usize;
    let end = start.saturating_add(view.byte_length as usize);
    source
        .source
        .get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            StowError::validation(format!("bufferView {view_index} range exceeds its buffer"))
        })
}

#[cfg(test)]
#[path = "../../tests/unit/document/load.rs"]
mod tests;
