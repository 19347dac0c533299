use super::*;

#[test]
fn parse_keeps_uninterpreted_properties() {
    let json = br#"{
        "asset": { "version": "2.0" },
        "buffers": [{ "byteLength": 4, "uri": "a.bin", "extras": { "k": 1 } }],
        "bufferViews": [{ "buffer": 0, "byteLength": 4 }],
        "images": [{ "uri": "a.png", "name": "albedo" }],
        "shaders": [{ "type": 35632, "uri": "a.glsl" }],
        "programs": [{ "fragmentShader": 0, "vertexShader": 0, "name": "main" }],
        "meshes": [{ "primitives": [] }]
    }"#;
    let doc = Document::from_slice(json).unwrap();

    assert_eq!(doc.buffers[0].byte_length, 4);
    assert_eq!(doc.buffers[0].other["extras"]["k"], 1);
    assert_eq!(doc.buffer_views[0].byte_offset, 0);
    assert_eq!(doc.images[0].name.as_deref(), Some("albedo"));
    assert_eq!(doc.shaders[0].stage(), Some(ShaderStage::Fragment));
    assert_eq!(doc.programs[0].shader_for(ShaderStage::Vertex), Some(0));
    assert!(doc.other.contains_key("asset"));
    assert!(doc.other.contains_key("meshes"));

    let out: serde_json::Value = serde_json::from_slice(&doc.to_vec_pretty().unwrap()).unwrap();
    assert_eq!(out["asset"]["version"], "2.0");
    assert_eq!(out["shaders"][0]["type"], 35632);
    assert_eq!(out["programs"][0]["fragmentShader"], 0);
    assert!(out["bufferViews"][0].get("byteOffset").is_none());
    assert!(out.get("textures").is_none());
}

#[test]
fn parse_rejects_malformed_json() {
    let err = Document::from_slice(b"{ not json").unwrap_err();
    assert!(matches!(err, StowError::Serde(_)));
}

#[test]
fn pending_payload_is_never_serialized() {
    let mut doc = Document::default();
    doc.images.push(Image {
        pending: Some(PendingResource::new(vec![1u8, 2, 3]).with_resource_id("img")),
        ..Image::default()
    });
    let text = String::from_utf8(doc.to_vec_pretty().unwrap()).unwrap();
    assert!(!text.contains("pending"));
    assert!(!text.contains("img"));
}

#[test]
fn use_extension_is_idempotent() {
    let mut doc = Document::default();
    doc.use_extension("KHR_texture_basisu", true);
    doc.use_extension("KHR_texture_basisu", true);
    doc.use_extension("KHR_materials_unlit", false);

    assert_eq!(
        doc.extensions_used,
        vec!["KHR_texture_basisu".to_string(), "KHR_materials_unlit".to_string()]
    );
    assert_eq!(doc.extensions_required, vec!["KHR_texture_basisu".to_string()]);
}

#[test]
fn content_id_tracks_bytes() {
    let a = PendingResource::new(b"same".to_vec()).with_content_id();
    let b = PendingResource::new(b"same".to_vec()).with_content_id();
    let c = PendingResource::new(b"different".to_vec()).with_content_id();

    assert_eq!(a.resource_id, b.resource_id);
    assert_ne!(a.resource_id, c.resource_id);
    assert!(a.resource_id.unwrap().starts_with("xxh3:"));
}

#[test]
fn unknown_shader_type_has_no_stage() {
    assert_eq!(ShaderStage::from_gl(1), None);
    assert_eq!(ShaderStage::Vertex.suffix(), "VS");
    assert_eq!(ShaderStage::Fragment.suffix(), "FS");
}
