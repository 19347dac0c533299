use std::io::Cursor;

use super::*;
use crate::assets::format::{ImageFormat, sniff_image};

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_raw(2, 2, vec![200u8; 16]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn jpeg_reencode_runs_in_process() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.jpg");
    std::fs::write(&input, png_bytes()).unwrap();

    ExternalCodecs::new()
        .reencode_jpeg(&input, &output, 75)
        .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(sniff_image(&bytes).unwrap(), ImageFormat::Jpeg);
}

#[test]
fn jpeg_reencode_of_garbage_is_a_transcode_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    std::fs::write(&input, b"nope").unwrap();

    let err = ExternalCodecs::new()
        .reencode_jpeg(&input, &dir.path().join("out.jpg"), 75)
        .unwrap_err();
    assert!(matches!(err, StowError::Transcode(_)));
}

#[test]
fn missing_tool_is_a_transcode_error() {
    let dir = tempfile::tempdir().unwrap();
    let codecs = ExternalCodecs {
        dwebp: dir.path().join("no-such-dwebp"),
        ..ExternalCodecs::default()
    };
    let err = codecs
        .decode_webp(&dir.path().join("a.webp"), &dir.path().join("a.png"))
        .unwrap_err();
    assert!(err.to_string().contains("failed to spawn dwebp"));
}

#[cfg(unix)]
#[test]
fn non_zero_exit_is_a_transcode_error() {
    let dir = tempfile::tempdir().unwrap();
    let codecs = ExternalCodecs {
        basisu: PathBuf::from("false"),
        ..ExternalCodecs::default()
    };
    let err = codecs
        .encode_basis(
            &dir.path().join("a.png"),
            &dir.path().join("a.ktx2"),
            BasisParams {
                linear: false,
                quality: 128,
            },
        )
        .unwrap_err();
    assert!(matches!(err, StowError::Transcode(_)));
    assert!(err.to_string().contains("basisu failed"));
}

#[test]
fn basisu_produces_ktx2_when_available() {
    if !is_tool_on_path("basisu") {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.ktx2");
    std::fs::write(&input, png_bytes()).unwrap();

    ExternalCodecs::new()
        .encode_basis(
            &input,
            &output,
            BasisParams {
                linear: false,
                quality: 64,
            },
        )
        .unwrap();
    assert_eq!(
        sniff_image(&std::fs::read(&output).unwrap()).unwrap(),
        ImageFormat::Ktx2
    );
}

#[test]
fn unknown_tools_are_not_on_path() {
    assert!(!is_tool_on_path("gltf-stow-definitely-missing-tool"));
}
