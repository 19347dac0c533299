use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::document::model::{Accessor, BufferView, Image};

fn buffer_with(bytes: &[u8]) -> Buffer {
    Buffer {
        byte_length: bytes.len() as u64,
        pending: Some(PendingResource::new(bytes.to_vec())),
        ..Buffer::default()
    }
}

fn view(buffer: usize, byte_offset: u64, byte_length: u64) -> BufferView {
    BufferView {
        buffer,
        byte_offset,
        byte_length,
        ..BufferView::default()
    }
}

#[test]
fn unreachable_views_and_buffers_are_dropped_and_reindexed() {
    let mut doc = Document::default();
    doc.buffers = vec![buffer_with(&[0; 4]), buffer_with(&[1; 4]), buffer_with(&[2; 4])];
    doc.buffer_views = vec![view(0, 0, 4), view(1, 0, 4), view(2, 0, 4)];
    doc.accessors.push(Accessor {
        buffer_view: Some(2),
        ..Accessor::default()
    });
    doc.images.push(Image {
        buffer_view: Some(2),
        ..Image::default()
    });

    DefaultGraphPasses
        .remove_unreachable(&mut doc, &[ElementKind::Buffer, ElementKind::BufferView])
        .unwrap();

    assert_eq!(doc.buffer_views.len(), 1);
    assert_eq!(doc.buffers.len(), 1);
    assert_eq!(doc.buffer_views[0].buffer, 0);
    assert_eq!(
        doc.buffers[0].pending.as_ref().unwrap().source.as_slice(),
        &[2; 4]
    );
    assert_eq!(doc.accessors[0].buffer_view, Some(0));
    assert_eq!(doc.images[0].buffer_view, Some(0));
}

#[test]
fn references_inside_untyped_json_keep_views_alive() {
    let mut doc = Document::default();
    doc.buffers = vec![buffer_with(&[0; 8])];
    doc.buffer_views = vec![view(0, 0, 4), view(0, 4, 4)];
    doc.other.insert(
        "meshes".to_string(),
        json!([{ "primitives": [{ "extensions": { "KHR_draco_mesh_compression": { "bufferView": 1 } } }] }]),
    );

    DefaultGraphPasses
        .remove_unreachable(&mut doc, &[ElementKind::BufferView])
        .unwrap();

    assert_eq!(doc.buffer_views.len(), 1);
    assert_eq!(doc.buffer_views[0].byte_offset, 4);
    assert_eq!(
        doc.other["meshes"][0]["primitives"][0]["extensions"]["KHR_draco_mesh_compression"]
            ["bufferView"],
        0
    );
}

#[test]
fn buffers_only_pass_leaves_views_alone() {
    let mut doc = Document::default();
    doc.buffers = vec![buffer_with(&[0; 4]), buffer_with(&[1; 4])];
    doc.buffer_views = vec![view(1, 0, 4)];

    DefaultGraphPasses
        .remove_unreachable(&mut doc, &[ElementKind::Buffer])
        .unwrap();

    assert_eq!(doc.buffer_views.len(), 1);
    assert_eq!(doc.buffers.len(), 1);
    assert_eq!(doc.buffer_views[0].buffer, 0);
}

#[test]
fn merge_aligns_views_and_drops_unreferenced_bytes() {
    let mut doc = Document::default();
    doc.buffers = vec![buffer_with(&[1, 2, 3, 9, 9]), buffer_with(&[4, 5])];
    doc.buffer_views = vec![view(0, 0, 3), view(1, 0, 2)];

    DefaultGraphPasses.merge_buffers(&mut doc, Some("scene")).unwrap();

    assert_eq!(doc.buffers.len(), 1);
    let merged = doc.buffers[0].pending.as_ref().unwrap();
    assert_eq!(merged.source.as_slice(), &[1, 2, 3, 0, 0, 0, 0, 0, 4, 5]);
    assert_eq!(doc.buffers[0].byte_length, 10);
    assert_eq!(doc.buffers[0].name.as_deref(), Some("scene"));
    assert_eq!(doc.buffer_views[0].byte_offset, 0);
    assert_eq!(doc.buffer_views[1].byte_offset, 8);
    assert!(doc.buffer_views.iter().all(|v| v.buffer == 0));
}

#[test]
fn merge_prefers_an_explicit_buffer_name_over_the_hint() {
    let mut doc = Document::default();
    let mut named = buffer_with(&[1, 2]);
    named.name = Some("geometry".to_string());
    doc.buffers = vec![buffer_with(&[0]), named];
    doc.buffer_views = vec![view(0, 0, 1), view(1, 0, 2)];

    DefaultGraphPasses.merge_buffers(&mut doc, Some("scene")).unwrap();

    assert_eq!(doc.buffers[0].name.as_deref(), Some("geometry"));
}

#[test]
fn merge_of_a_single_buffer_keeps_its_identity() {
    let mut doc = Document::default();
    doc.buffers = vec![Buffer {
        byte_length: 4,
        pending: Some(
            PendingResource::new(vec![1u8, 2, 3, 4])
                .with_resource_id("model.bin")
                .with_relative_path("model.bin"),
        ),
        ..Buffer::default()
    }];
    doc.buffer_views = vec![view(0, 0, 4)];

    DefaultGraphPasses.merge_buffers(&mut doc, None).unwrap();

    let pending = doc.buffers[0].pending.as_ref().unwrap();
    assert_eq!(pending.relative_path.as_deref(), Some("model.bin"));
    assert_eq!(pending.source, Arc::new(vec![1u8, 2, 3, 4]));
    assert!(doc.buffers[0].name.is_none());
}

#[test]
fn merge_skips_documents_with_unloaded_buffers() {
    let mut doc = Document::default();
    doc.buffers = vec![Buffer {
        byte_length: 4,
        uri: Some("external.bin".to_string()),
        ..Buffer::default()
    }];
    doc.buffer_views = vec![view(0, 0, 4)];

    DefaultGraphPasses.merge_buffers(&mut doc, None).unwrap();

    assert_eq!(doc.buffers[0].uri.as_deref(), Some("external.bin"));
}

#[test]
fn merge_rejects_out_of_range_views() {
    let mut doc = Document::default();
    doc.buffers = vec![buffer_with(&[0; 4])];
    doc.buffer_views = vec![view(0, 2, 4)];

    let err = DefaultGraphPasses.merge_buffers(&mut doc, None).unwrap_err();
    assert!(matches!(err, StowError::Validation(_)));
}
