use std::path::PathBuf;

use crate::assets::codec::BasisParams;
use crate::assets::transcode::TranscodeOptions;
use crate::foundation::error::{StowError, StowResult};

/// Default Basis Universal quality level.
pub const DEFAULT_BASIS_QUALITY: u8 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Resource kinds with their own separate-file switch.
pub enum ResourceKind {
    /// Buffers (`.bin`).
    Buffer,
    /// Images (sniffed extension).
    Image,
    /// Shaders (`.glsl`).
    Shader,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Options for one write invocation. Read-only once the write starts.
///
/// Field names serialize to the option keys used in JSON config files (`separateBuffers`,
/// `decodeWebP`, `jpegCompressionRatio`, ...).
pub struct WriteOptions {
    /// Write buffers as separate files.
    pub separate_buffers: bool,
    /// Write images as separate files.
    pub separate_textures: bool,
    /// Write shaders as separate files.
    pub separate_shaders: bool,
    /// Write every resource kind as separate files.
    pub separate_resources: bool,
    /// Embed non-separate images and shaders as data URIs instead of bufferViews.
    pub data_uris: bool,
    /// Encode images to KTX2 with Basis Universal.
    pub encode_basis: bool,
    /// Basis Universal quality level (1..=255).
    pub basis_quality: u8,
    /// Encode Basis textures as linear data.
    pub basis_linear: bool,
    /// Decode lossy WebP images to PNG.
    #[serde(rename = "decodeWebP")]
    pub decode_webp: bool,
    /// Re-compress images as JPEG at this quality (1..=100). Ignored when `encode_basis` is set.
    pub jpeg_compression_ratio: Option<u8>,
    /// Document name used when deriving resource file names.
    pub name: Option<String>,
    /// Collect buffer bytes into one [`crate::BufferStorage`] instead of writing buffers.
    pub buffer_storage: bool,
    /// Worker threads for image transcoding. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Parent directory for transcode temp workspaces.
    pub temp_dir: Option<PathBuf>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            separate_buffers: false,
            separate_textures: false,
            separate_shaders: false,
            separate_resources: false,
            data_uris: false,
            encode_basis: false,
            basis_quality: DEFAULT_BASIS_QUALITY,
            basis_linear: false,
            decode_webp: false,
            jpeg_compression_ratio: None,
            name: None,
            buffer_storage: false,
            threads: None,
            temp_dir: None,
        }
    }
}

impl WriteOptions {
    /// Parse options from a JSON config.
    pub fn from_json(bytes: &[u8]) -> StowResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| StowError::serde(format!("failed to parse write options: {e}")))
    }

    /// Check option values before any document mutation.
    pub fn validate(&self) -> StowResult<()> {
        if self.basis_quality == 0 {
            return Err(StowError::validation("basisQuality must be in 1..=255"));
        }
        if let Some(q) = self.jpeg_compression_ratio
            && !(1..=100).contains(&q)
        {
            return Err(StowError::validation(
                "jpegCompressionRatio must be in 1..=100",
            ));
        }
        if self.threads == Some(0) {
            return Err(StowError::validation("threads must be >= 1 when set"));
        }
        if self.encode_basis && self.jpeg_compression_ratio.is_some() {
            tracing::warn!(
                "encodeBasis and jpegCompressionRatio are both set; basis encoding wins and JPEG re-compression is skipped"
            );
        }
        Ok(())
    }

    /// Whether resources of `kind` go to separate files.
    pub fn separates(&self, kind: ResourceKind) -> bool {
        self.separate_resources
            || match kind {
                ResourceKind::Buffer => self.separate_buffers,
                ResourceKind::Image => self.separate_textures,
                ResourceKind::Shader => self.separate_shaders,
            }
    }

    /// Transcode stage switches derived from these options.
    pub fn transcode_options(&self) -> TranscodeOptions {
        TranscodeOptions {
            decode_webp: self.decode_webp,
            basis: self.encode_basis.then_some(BasisParams {
                linear: self.basis_linear,
                quality: self.basis_quality,
            }),
            jpeg_quality: self.jpeg_compression_ratio,
            temp_dir: self.temp_dir.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/write/options.rs"]
mod tests;
