use std::sync::Arc;

use super::model::{Buffer, BufferView, Document, PendingResource};

/// Append `source` to the document's buffer pool.
///
/// The bytes land in a new buffer with a single bufferView spanning it; the merge pass later
/// coalesces pool buffers. Returns the new bufferView index.
pub fn add_buffer(doc: &mut Document, source: Arc<Vec<u8>>) -> usize {
    let byte_length = source.len() as u64;
    let buffer_index = doc.buffers.len();
    doc.buffers.push(Buffer {
        byte_length,
        pending: Some(PendingResource {
            source,
            resource_id: None,
            relative_path: None,
        }),
        ..Buffer::default()
    });
    doc.buffer_views.push(BufferView {
        buffer: buffer_index,
        byte_length,
        ..BufferView::default()
    });
    doc.buffer_views.len() - 1
}

#[cfg(test)]
#[path = "../../tests/unit/document/pool.rs"]
mod tests;
