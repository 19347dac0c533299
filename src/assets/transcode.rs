use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::codec::{BasisParams, ImageCodecs};
use super::format::{ImageFormat, WebpKind, sniff_image};
use super::workspace::TempWorkspace;
use crate::foundation::error::StowResult;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Which transcode stages an image may go through.
pub struct TranscodeOptions {
    /// Decode lossy WebP images to PNG.
    pub decode_webp: bool,
    /// Encode to KTX2/Basis Universal. Takes precedence over `jpeg_quality`.
    pub basis: Option<BasisParams>,
    /// Re-encode as JPEG at this quality when no basis encode is requested.
    pub jpeg_quality: Option<u8>,
    /// Parent directory for temp workspaces; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// One codec invocation in an image's transcode chain.
pub enum Stage {
    /// Lossy WebP to PNG.
    DecodeWebp,
    /// Raster to KTX2.
    EncodeBasis(BasisParams),
    /// Raster to JPEG at the given quality.
    ReencodeJpeg(u8),
}

impl Stage {
    /// Extension of the file this stage produces.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::DecodeWebp => ".png",
            Self::EncodeBasis(_) => ".ktx2",
            Self::ReencodeJpeg(_) => ".jpg",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::DecodeWebp => "decode_webp",
            Self::EncodeBasis(_) => "encode_basis",
            Self::ReencodeJpeg(_) => "reencode_jpeg",
        }
    }

    fn run(self, codecs: &dyn ImageCodecs, input: &Path, output: &Path) -> StowResult<()> {
        match self {
            Self::DecodeWebp => codecs.decode_webp(input, output),
            Self::EncodeBasis(params) => codecs.encode_basis(input, output, params),
            Self::ReencodeJpeg(quality) => codecs.reencode_jpeg(input, output, quality),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Final bytes of an image and the format they were sniffed as.
pub struct TranscodedImage {
    /// Encoded image bytes.
    pub source: Arc<Vec<u8>>,
    /// Format re-sniffed from `source`.
    pub format: ImageFormat,
}

impl TranscodedImage {
    /// Extension used when externalizing the image.
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

/// Stages an image of `format` goes through under `opts`, in order.
///
/// Basis encoding and JPEG re-compression are exclusive; basis wins when both are requested.
/// Images already in the GPU container skip both.
pub fn plan_stages(format: ImageFormat, opts: &TranscodeOptions) -> Vec<Stage> {
    let mut stages = Vec::new();
    let mut current = format;
    if opts.decode_webp && current == ImageFormat::Webp(WebpKind::Lossy) {
        stages.push(Stage::DecodeWebp);
        current = ImageFormat::Png;
    }
    if let Some(params) = opts.basis {
        if !current.is_gpu_container() {
            stages.push(Stage::EncodeBasis(params));
        }
    } else if let Some(quality) = opts.jpeg_quality
        && !current.is_gpu_container()
    {
        stages.push(Stage::ReencodeJpeg(quality));
    }
    stages
}

/// Run one image through sniff, the planned codec stages, and a final re-sniff.
///
/// Stages run strictly in sequence inside a private [`TempWorkspace`]. Each stage writes its
/// input, invokes the codec, reads the output back, and deletes both files.
#[tracing::instrument(skip_all, fields(bytes = source.len()))]
pub fn transcode_image(
    source: Arc<Vec<u8>>,
    opts: &TranscodeOptions,
    codecs: &dyn ImageCodecs,
) -> StowResult<TranscodedImage> {
    let sniffed = sniff_image(&source)?;
    let stages = plan_stages(sniffed, opts);
    if stages.is_empty() {
        return Ok(TranscodedImage {
            source,
            format: sniffed,
        });
    }

    let mut ws = match opts.temp_dir.as_deref() {
        Some(root) => TempWorkspace::new_in(root)?,
        None => TempWorkspace::new()?,
    };

    let mut source = source;
    let mut extension = sniffed.extension();
    for stage in stages {
        let input = ws.write(&source, extension)?;
        let output = ws.alloc(stage.output_extension());
        stage.run(codecs, &input, &output)?;
        let bytes = ws.read(&output)?;
        ws.release(&[input.as_path(), output.as_path()])?;

        tracing::debug!(
            stage = stage.name(),
            in_bytes = source.len(),
            out_bytes = bytes.len(),
            "transcode stage complete"
        );
        source = Arc::new(bytes);
        extension = stage.output_extension();
    }

    let format = sniff_image(&source)?;
    Ok(TranscodedImage { source, format })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/transcode.rs"]
mod tests;
