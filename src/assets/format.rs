use crate::foundation::error::{StowError, StowResult};

/// The 12-byte file identifier every KTX2 container starts with.
pub const KTX2_IDENTIFIER: [u8; 12] = [
    0xAB, b'K', b'T', b'X', b' ', b'2', b'0', 0xBB, b'\r', b'\n', 0x1A, b'\n',
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// WebP compression variant.
pub enum WebpKind {
    /// VP8 bitstream.
    Lossy,
    /// VP8L bitstream.
    Lossless,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Image container formats recognized from content bytes.
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// GIF.
    Gif,
    /// BMP.
    Bmp,
    /// WebP, split by bitstream kind.
    Webp(WebpKind),
    /// KTX2 container holding GPU-compressed (Basis Universal) texture data.
    Ktx2,
}

impl ImageFormat {
    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
            Self::Gif => ".gif",
            Self::Bmp => ".bmp",
            Self::Webp(_) => ".webp",
            Self::Ktx2 => ".ktx2",
        }
    }

    /// Whether this is the GPU-compressed texture container.
    pub fn is_gpu_container(self) -> bool {
        matches!(self, Self::Ktx2)
    }
}

/// Determine an image's format from its bytes, ignoring any declared metadata.
pub fn sniff_image(bytes: &[u8]) -> StowResult<ImageFormat> {
    if bytes.starts_with(&KTX2_IDENTIFIER) {
        return Ok(ImageFormat::Ktx2);
    }
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => Ok(ImageFormat::Png),
        Ok(image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
        Ok(image::ImageFormat::Gif) => Ok(ImageFormat::Gif),
        Ok(image::ImageFormat::Bmp) => Ok(ImageFormat::Bmp),
        Ok(image::ImageFormat::WebP) => Ok(ImageFormat::Webp(webp_kind(bytes))),
        Ok(other) => Err(StowError::validation(format!(
            "unsupported image format {other:?}"
        ))),
        Err(_) => Err(StowError::validation("unrecognized image bytes")),
    }
}

/// MIME type for a file extension (with or without the leading dot).
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "ktx2" => "image/ktx2",
        "basis" => "image/basis",
        "glsl" | "vert" | "frag" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Walk the RIFF chunks after the 12-byte header for the first bitstream chunk.
///
/// Extended (`VP8X`) files carry their bitstream in a later chunk. Files with no top-level
/// bitstream chunk (animations) count as lossless so they are never flattened.
fn webp_kind(bytes: &[u8]) -> WebpKind {
    let mut pos = 12usize;
    while let Some(header) = bytes.get(pos..pos + 8) {
        let (fourcc, size) = header.split_at(4);
        match fourcc {
            b"VP8 " => return WebpKind::Lossy,
            b"VP8L" => return WebpKind::Lossless,
            _ => {}
        }
        let size = u32::from_le_bytes([size[0], size[1], size[2], size[3]]) as usize;
        pos = match size
            .checked_add(8 + (size & 1))
            .and_then(|advance| pos.checked_add(advance))
        {
            Some(next) => next,
            None => break,
        };
    }
    WebpKind::Lossless
}

#[cfg(test)]
#[path = "../../tests/unit/assets/format.rs"]
mod tests;
