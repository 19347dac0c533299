//! gltf-stow externalizes the binary resources of a glTF document.
//!
//! Every buffer, image, and shader that carries in-memory bytes is written back out as one of:
//!
//! - a **bufferView** appended to the document's buffer pool,
//! - an inline base64 **data URI**,
//! - a **separate file** collected in [`SeparateResources`] for the caller to materialize.
//!
//! Images can be transcoded on the way out (lossy WebP decode, KTX2/Basis Universal encode, or
//! JPEG re-compression). Resources that share a `resourceId` are written once and every entity
//! with that id references the same target.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`load_document`] parses the JSON, then [`read_resources`] decodes data URIs and
//!    reads relative files into pending payloads.
//! 2. **Transcode**: images run through sniff, codec stages, and re-sniff in parallel on rayon.
//! 3. **Externalize**: images, then shaders, then unreachable bufferView/buffer pruning and a
//!    buffer merge, then buffers.
//! 4. **Finalize**: textures pointing at KTX2 images move to `KHR_texture_basisu`.
//!
//! External codecs (`dwebp`, `basisu`) are invoked through [`ExternalCodecs`]; any
//! [`ImageCodecs`] implementation can stand in for them.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod document;
mod foundation;
mod write;

pub use assets::codec::{BasisParams, ExternalCodecs, ImageCodecs, is_tool_on_path};
pub use assets::format::{
    ImageFormat, KTX2_IDENTIFIER, WebpKind, mime_type_for_extension, sniff_image,
};
pub use assets::transcode::{Stage, TranscodeOptions, TranscodedImage, plan_stages, transcode_image};
pub use assets::workspace::TempWorkspace;
pub use document::load::{load_document, normalize_rel_path, parse_data_uri, read_resources};
pub use document::model::{
    Accessor, AccessorSparse, Buffer, BufferView, Document, GL_FRAGMENT_SHADER, GL_VERTEX_SHADER,
    Image, PendingResource, Program, Shader, ShaderStage, SparseBufferRef, Texture,
};
pub use document::passes::{DefaultGraphPasses, ElementKind, GraphPasses, MERGE_ALIGNMENT};
pub use document::pool::add_buffer;
pub use foundation::error::{StowError, StowResult};
pub use write::naming::{
    buffer_name, image_name, replace_extension, shader_name, split_extension, unique_relative_path,
};
pub use write::options::{DEFAULT_BASIS_QUALITY, ResourceKind, WriteOptions};
pub use write::orchestrator::{KHR_TEXTURE_BASISU, ResourceWriter, write_resources};
pub use write::sinks::{
    BufferStorage, ResourceOutputs, SeparateResources, WriteTarget, WrittenResourceMap,
};
pub use write::strategy::{
    Representation, ResourceRequest, ResourceSlot, WriteState, choose_representation, data_uri,
    externalize,
};
