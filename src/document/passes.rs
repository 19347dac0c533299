//! Graph passes the writer runs between the image/shader pass and the buffer pass.

use serde_json::Value;

use super::model::{Buffer, Document, PendingResource};
use crate::foundation::error::{StowError, StowResult};

/// Alignment of every bufferView inside a merged buffer.
pub const MERGE_ALIGNMENT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Element kinds the unreachable-element pass can prune.
pub enum ElementKind {
    /// bufferViews not referenced by accessors, images, shaders, or extension JSON.
    BufferView,
    /// Buffers not referenced by any bufferView.
    Buffer,
}

/// Document-wide graph passes consumed by the writer.
pub trait GraphPasses: Sync {
    /// Drop elements of `kinds` that nothing references, re-indexing every reference.
    fn remove_unreachable(&self, doc: &mut Document, kinds: &[ElementKind]) -> StowResult<()>;

    /// Coalesce the buffers referenced by bufferViews into one buffer.
    fn merge_buffers(&self, doc: &mut Document, name_hint: Option<&str>) -> StowResult<()>;
}

#[derive(Clone, Copy, Debug, Default)]
/// Built-in [`GraphPasses`] implementation.
pub struct DefaultGraphPasses;

impl GraphPasses for DefaultGraphPasses {
    fn remove_unreachable(&self, doc: &mut Document, kinds: &[ElementKind]) -> StowResult<()> {
        // Views go first: dropping a view can orphan its buffer.
        if kinds.contains(&ElementKind::BufferView) {
            prune_buffer_views(doc);
        }
        if kinds.contains(&ElementKind::Buffer) {
            prune_buffers(doc);
        }
        Ok(())
    }

    fn merge_buffers(&self, doc: &mut Document, name_hint: Option<&str>) -> StowResult<()> {
        if doc.buffer_views.is_empty() {
            return Ok(());
        }

        let mut sources = Vec::with_capacity(doc.buffer_views.len());
        for (i, view) in doc.buffer_views.iter().enumerate() {
            let buffer = doc.buffers.get(view.buffer).ok_or_else(|| {
                StowError::validation(format!(
                    "bufferView {i} references missing buffer {}",
                    view.buffer
                ))
            })?;
            let Some(pending) = buffer.pending.as_ref() else {
                tracing::debug!(
                    buffer = view.buffer,
                    "buffer has no in-memory bytes, skipping merge"
                );
                return Ok(());
            };
            sources.push(pending);
        }

        let mut merged = Vec::<u8>::new();
        let mut offsets = Vec::with_capacity(doc.buffer_views.len());
        for (i, (view, pending)) in doc.buffer_views.iter().zip(&sources).enumerate() {
            let start = usize::try_from(view.byte_offset).ok();
            let len = usize::try_from(view.byte_length).ok();
            let bytes = start
                .zip(len)
                .and_then(|(s, l)| pending.source.get(s..s.checked_add(l)?))
                .ok_or_else(|| {
                    StowError::validation(format!(
                        "bufferView {i} range exceeds buffer {} ({} bytes)",
                        view.buffer,
                        pending.source.len()
                    ))
                })?;
            merged.resize(merged.len().next_multiple_of(MERGE_ALIGNMENT), 0);
            offsets.push(merged.len() as u64);
            merged.extend_from_slice(bytes);
        }

        let mut referenced: Vec<usize> = doc.buffer_views.iter().map(|v| v.buffer).collect();
        referenced.sort_unstable();
        referenced.dedup();

        // A lone source buffer keeps its identity so a re-write reuses its file name.
        let (resource_id, relative_path, other) = match referenced.as_slice() {
            [only] => {
                let b = &doc.buffers[*only];
                let p = b.pending.as_ref();
                (
                    p.and_then(|p| p.resource_id.clone()),
                    p.and_then(|p| p.relative_path.clone()),
                    b.other.clone(),
                )
            }
            _ => (None, None, Default::default()),
        };
        let name = referenced
            .iter()
            .find_map(|&i| doc.buffers[i].name.clone())
            .or_else(|| name_hint.map(str::to_string));

        tracing::debug!(
            buffers = referenced.len(),
            views = doc.buffer_views.len(),
            bytes = merged.len(),
            "merged buffers"
        );

        doc.buffers = vec![Buffer {
            byte_length: merged.len() as u64,
            uri: None,
            name,
            other,
            pending: Some(PendingResource {
                source: std::sync::Arc::new(merged),
                resource_id,
                relative_path,
            }),
        }];
        for (view, offset) in doc.buffer_views.iter_mut().zip(offsets) {
            view.buffer = 0;
            view.byte_offset = offset;
        }
        Ok(())
    }
}

fn prune_buffer_views(doc: &mut Document) {
    let mut used = vec![false; doc.buffer_views.len()];
    visit_buffer_view_refs(doc, &mut |idx| {
        if let Some(slot) = used.get_mut(*idx) {
            *slot = true;
        }
    });

    let remap = compact(&mut doc.buffer_views, &used);
    visit_buffer_view_refs(doc, &mut |idx| {
        if let Some(Some(new_idx)) = remap.get(*idx) {
            *idx = *new_idx;
        }
    });
}

fn prune_buffers(doc: &mut Document) {
    let mut used = vec![false; doc.buffers.len()];
    for view in &doc.buffer_views {
        if let Some(slot) = used.get_mut(view.buffer) {
            *slot = true;
        }
    }

    let remap = compact(&mut doc.buffers, &used);
    for view in &mut doc.buffer_views {
        if let Some(Some(new_idx)) = remap.get(view.buffer) {
            view.buffer = *new_idx;
        }
    }
}

/// Keep the items flagged in `used`, returning old-index to new-index.
fn compact<T>(items: &mut Vec<T>, used: &[bool]) -> Vec<Option<usize>> {
    let mut remap = Vec::with_capacity(items.len());
    let mut next = 0usize;
    for &keep in used {
        if keep {
            remap.push(Some(next));
            next += 1;
        } else {
            remap.push(None);
        }
    }

    let mut i = 0usize;
    items.retain(|_| {
        let keep = used.get(i).copied().unwrap_or(false);
        i += 1;
        keep
    });
    remap
}

fn visit_buffer_view_refs(doc: &mut Document, f: &mut dyn FnMut(&mut usize)) {
    for accessor in &mut doc.accessors {
        if let Some(idx) = accessor.buffer_view.as_mut() {
            f(idx);
        }
        if let Some(sparse) = accessor.sparse.as_mut() {
            f(&mut sparse.indices.buffer_view);
            f(&mut sparse.values.buffer_view);
        }
    }
    for image in &mut doc.images {
        if let Some(idx) = image.buffer_view.as_mut() {
            f(idx);
        }
    }
    for shader in &mut doc.shaders {
        if let Some(idx) = shader.buffer_view.as_mut() {
            f(idx);
        }
    }
    for value in doc.other.values_mut() {
        visit_json_refs(value, f);
    }
}

/// Walk untyped JSON (meshes, extensions, ...) for `"bufferView": <index>` members.
fn visit_json_refs(value: &mut Value, f: &mut dyn FnMut(&mut usize)) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "bufferView"
                    && let Some(raw) = child.as_u64()
                    && let Ok(mut idx) = usize::try_from(raw)
                {
                    f(&mut idx);
                    *child = Value::from(idx as u64);
                } else {
                    visit_json_refs(child, f);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                visit_json_refs(item, f);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/passes.rs"]
mod tests;
