use super::*;

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn data_uri_decoding() {
    assert_eq!(
        parse_data_uri("data:application/octet-stream;base64,AQID").unwrap(),
        vec![1u8, 2, 3]
    );
    assert!(parse_data_uri("data:text/plain,hello").is_err());
    assert!(parse_data_uri("data:;base64,@@@").is_err());
    assert!(parse_data_uri("model.bin").is_err());
}

#[test]
fn embedded_and_file_resources_are_loaded() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tex")).unwrap();
    std::fs::write(dir.path().join("tex/a.png"), b"png-bytes").unwrap();

    let json = br#"{
        "buffers": [{ "byteLength": 6, "uri": "data:application/octet-stream;base64,AQIDBAUG" }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 2, "byteLength": 3 }],
        "images": [
            { "uri": "./tex/a.png" },
            { "bufferView": 0, "mimeType": "image/png" },
            { "uri": "data:image/png;base64,AQID" },
            { "uri": "data:image/png;base64,AQID" }
        ],
        "shaders": [{ "type": 35632, "uri": "data:text/plain;base64,dm9pZA==" }]
    }"#;
    let mut doc = Document::from_slice(json).unwrap();
    read_resources(&mut doc, dir.path()).unwrap();

    let buffer = doc.buffers[0].pending.as_ref().unwrap();
    assert_eq!(buffer.source.as_slice(), &[1, 2, 3, 4, 5, 6]);
    assert!(buffer.resource_id.is_none());

    let file = doc.images[0].pending.as_ref().unwrap();
    assert_eq!(file.source.as_slice(), b"png-bytes");
    assert_eq!(file.resource_id.as_deref(), Some("tex/a.png"));
    assert_eq!(file.relative_path.as_deref(), Some("tex/a.png"));

    let in_view = doc.images[1].pending.as_ref().unwrap();
    assert_eq!(in_view.source.as_slice(), &[3, 4, 5]);

    let a = doc.images[2].pending.as_ref().unwrap();
    let b = doc.images[3].pending.as_ref().unwrap();
    assert!(a.resource_id.is_some());
    assert_eq!(a.resource_id, b.resource_id);
    assert!(a.relative_path.is_none());

    let shader = doc.shaders[0].pending.as_ref().unwrap();
    assert_eq!(shader.source.as_slice(), b"void");
}

#[test]
fn missing_files_surface_as_filesystem_errors() {
    let dir = tempfile::tempdir().unwrap();
    let json = br#"{ "images": [{ "uri": "missing.png" }] }"#;
    let mut doc = Document::from_slice(json).unwrap();

    let err = read_resources(&mut doc, dir.path()).unwrap_err();
    assert!(matches!(err, StowError::FileSystem(_)));
}

#[test]
fn load_document_resolves_against_the_document_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scene.bin"), [9u8; 4]).unwrap();
    std::fs::write(
        dir.path().join("scene.gltf"),
        br#"{ "buffers": [{ "byteLength": 4, "uri": "scene.bin" }] }"#,
    )
    .unwrap();

    let doc = load_document(&dir.path().join("scene.gltf")).unwrap();
    let pending = doc.buffers[0].pending.as_ref().unwrap();
    assert_eq!(pending.source.as_slice(), &[9u8; 4]);
    assert_eq!(pending.relative_path.as_deref(), Some("scene.bin"));
}
