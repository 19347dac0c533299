use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use gltf_stow::{ExternalCodecs, WriteOptions};

#[derive(Parser, Debug)]
#[command(name = "gltf-stow", version)]
/// Rewrite a glTF document with its buffers, images, and shaders externalized.
struct Cli {
    /// Input glTF JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output glTF JSON. Separate resources are written next to it.
    #[arg(long)]
    out: PathBuf,

    /// JSON file with write options (`separateTextures`, `encodeBasis`, ...).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write buffers as separate files.
    #[arg(long, default_value_t = false)]
    separate_buffers: bool,

    /// Write images as separate files.
    #[arg(long, default_value_t = false)]
    separate_textures: bool,

    /// Write shaders as separate files.
    #[arg(long, default_value_t = false)]
    separate_shaders: bool,

    /// Write every resource kind as separate files.
    #[arg(long, default_value_t = false)]
    separate: bool,

    /// Embed non-separate images and shaders as data URIs.
    #[arg(long, default_value_t = false)]
    data_uris: bool,

    /// Encode images to KTX2 (requires `basisu` on PATH).
    #[arg(long, default_value_t = false)]
    encode_basis: bool,

    /// Basis Universal quality level (1..=255).
    #[arg(long)]
    basis_quality: Option<u8>,

    /// Encode Basis textures as linear data.
    #[arg(long, default_value_t = false)]
    basis_linear: bool,

    /// Decode lossy WebP images to PNG (requires `dwebp` on PATH).
    #[arg(long, default_value_t = false)]
    decode_webp: bool,

    /// Re-compress images as JPEG at this quality (1..=100).
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Collect buffers into one `<stem>.bin` next to the output.
    #[arg(long, default_value_t = false)]
    buffer_storage: bool,

    /// Document name used for derived file names. Defaults to the output file stem.
    #[arg(long)]
    name: Option<String>,

    /// Override rayon worker threads for image transcoding.
    #[arg(long)]
    threads: Option<usize>,

    /// `dwebp` executable.
    #[arg(long)]
    dwebp: Option<PathBuf>,

    /// `basisu` executable.
    #[arg(long)]
    basisu: Option<PathBuf>,

    /// Log pipeline progress at debug level.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = build_options(&cli)?;
    let mut codecs = ExternalCodecs::new();
    if let Some(dwebp) = &cli.dwebp {
        codecs.dwebp = dwebp.clone();
    }
    if let Some(basisu) = &cli.basisu {
        codecs.basisu = basisu.clone();
    }

    let mut doc = gltf_stow::load_document(&cli.in_path)?;
    let outputs = gltf_stow::write_resources(&mut doc, &opts, &codecs)?;

    let out_dir = cli.out.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

    if let Some(storage) = outputs.buffer_storage
        && !storage.is_empty()
    {
        let bin_name = format!("{}.bin", output_stem(&cli.out));
        match doc.buffers.as_mut_slice() {
            [only] if only.uri.is_none() => only.uri = Some(bin_name.clone()),
            buffers => tracing::warn!(
                buffers = buffers.len(),
                "buffer storage written but no single buffer to point at it"
            ),
        }
        let bin_path = out_dir.join(&bin_name);
        std::fs::write(&bin_path, storage.as_slice())
            .with_context(|| format!("write buffer storage '{}'", bin_path.display()))?;
    }

    outputs.separate_resources.write_all(out_dir)?;
    std::fs::write(&cli.out, doc.to_vec_pretty()?)
        .with_context(|| format!("write gltf '{}'", cli.out.display()))?;

    eprintln!(
        "wrote {} ({} separate resources)",
        cli.out.display(),
        outputs.separate_resources.len()
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file first, then flags OR-ed on top.
fn build_options(cli: &Cli) -> anyhow::Result<WriteOptions> {
    let mut opts = match &cli.config {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            WriteOptions::from_json(&bytes)?
        }
        None => WriteOptions::default(),
    };

    opts.separate_buffers |= cli.separate_buffers;
    opts.separate_textures |= cli.separate_textures;
    opts.separate_shaders |= cli.separate_shaders;
    opts.separate_resources |= cli.separate;
    opts.data_uris |= cli.data_uris;
    opts.encode_basis |= cli.encode_basis;
    opts.basis_linear |= cli.basis_linear;
    opts.decode_webp |= cli.decode_webp;
    opts.buffer_storage |= cli.buffer_storage;
    if let Some(q) = cli.basis_quality {
        opts.basis_quality = q;
    }
    if cli.jpeg_quality.is_some() {
        opts.jpeg_compression_ratio = cli.jpeg_quality;
    }
    if cli.threads.is_some() {
        opts.threads = cli.threads;
    }
    if let Some(name) = &cli.name {
        opts.name = Some(name.clone());
    }
    if opts.name.is_none() {
        opts.name = Some(output_stem(&cli.out));
    }
    Ok(opts)
}

fn output_stem(out: &Path) -> String {
    out.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}
