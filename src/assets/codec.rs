use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{StowError, StowResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Parameters for GPU-compressed texture encoding.
pub struct BasisParams {
    /// Treat the input as linear data instead of sRGB color.
    pub linear: bool,
    /// Encoder quality level (1..=255).
    pub quality: u8,
}

/// Codec capability consumed by the transcode pipeline.
///
/// Every call reads `input` and must leave its result at `output`. Calls block until the codec
/// finishes and may run concurrently for different images.
pub trait ImageCodecs: Sync {
    /// Decode a WebP file into a PNG.
    fn decode_webp(&self, input: &Path, output: &Path) -> StowResult<()>;

    /// Encode a raster file into a KTX2 container with Basis Universal payload.
    fn encode_basis(&self, input: &Path, output: &Path, params: BasisParams) -> StowResult<()>;

    /// Re-encode a raster file as JPEG at `quality` (1..=100).
    fn reencode_jpeg(&self, input: &Path, output: &Path, quality: u8) -> StowResult<()>;
}

#[derive(Clone, Debug)]
/// Production codecs: `dwebp` and `basisu` run as child processes; JPEG re-encoding runs
/// in-process through the `image` crate.
pub struct ExternalCodecs {
    /// `dwebp` executable.
    pub dwebp: PathBuf,
    /// `basisu` executable.
    pub basisu: PathBuf,
}

impl Default for ExternalCodecs {
    fn default() -> Self {
        Self {
            dwebp: PathBuf::from("dwebp"),
            basisu: PathBuf::from("basisu"),
        }
    }
}

impl ExternalCodecs {
    /// Codecs resolved from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageCodecs for ExternalCodecs {
    fn decode_webp(&self, input: &Path, output: &Path) -> StowResult<()> {
        let mut cmd = Command::new(&self.dwebp);
        cmd.arg(input).arg("-o").arg(output);
        run_tool(cmd, "dwebp", input)
    }

    fn encode_basis(&self, input: &Path, output: &Path, params: BasisParams) -> StowResult<()> {
        let mut cmd = Command::new(&self.basisu);
        cmd.args(["-ktx2", "-file"])
            .arg(input)
            .arg("-output_file")
            .arg(output)
            .args(["-q", &params.quality.to_string()]);
        if params.linear {
            cmd.arg("-linear");
        }
        run_tool(cmd, "basisu", input)
    }

    fn reencode_jpeg(&self, input: &Path, output: &Path, quality: u8) -> StowResult<()> {
        let img = image::open(input).map_err(|e| {
            StowError::transcode(format!("failed to decode '{}': {e}", input.display()))
        })?;
        let file = std::fs::File::create(output).map_err(|e| StowError::io("create", output, e))?;
        let mut writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality)
            .encode_image(&img.to_rgb8())
            .map_err(|e| {
                StowError::transcode(format!("jpeg encode failed for '{}': {e}", input.display()))
            })?;
        writer.flush().map_err(|e| StowError::io("write", output, e))
    }
}

/// Return `true` when `tool` can be spawned.
pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn run_tool(mut cmd: Command, tool: &str, input: &Path) -> StowResult<()> {
    let out = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            StowError::transcode(format!(
                "failed to spawn {tool} (is it installed and on PATH?): {e}"
            ))
        })?;
    if !out.status.success() {
        return Err(StowError::transcode(format!(
            "{tool} failed for '{}' ({}): {}",
            input.display(),
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    tracing::debug!(tool, input = %input.display(), "codec finished");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/codec.rs"]
mod tests;
