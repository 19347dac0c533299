use std::sync::Arc;

use serde_json::{Map, Value};

use crate::foundation::error::{StowError, StowResult};

/// GL enum for a fragment shader stage (`shader.type`).
pub const GL_FRAGMENT_SHADER: u32 = 35632;
/// GL enum for a vertex shader stage (`shader.type`).
pub const GL_VERTEX_SHADER: u32 = 35633;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// In-memory payload of an entity awaiting externalization.
///
/// Never serialized. The writer consumes it and leaves the entity holding exactly one of `uri`
/// or `bufferView`.
pub struct PendingResource {
    /// Raw bytes of the resource.
    pub source: Arc<Vec<u8>>,
    /// Identity tag used to share one written target between entities.
    pub resource_id: Option<String>,
    /// Explicit relative output path, used verbatim when the resource is written separately.
    pub relative_path: Option<String>,
}

impl PendingResource {
    /// Wrap raw bytes with no identity and no explicit path.
    pub fn new(source: impl Into<Vec<u8>>) -> Self {
        Self {
            source: Arc::new(source.into()),
            resource_id: None,
            relative_path: None,
        }
    }

    /// Set the identity tag.
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Set the explicit relative output path.
    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }

    /// Derive the identity tag from the bytes so byte-identical payloads share one target.
    pub fn with_content_id(self) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_64(&self.source);
        self.with_resource_id(format!("xxh3:{hash:016x}"))
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A scene-description document: typed entity arrays plus any properties this crate does not
/// interpret, preserved as raw JSON.
pub struct Document {
    /// Binary buffers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    /// Byte ranges into buffers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    /// Typed views over bufferViews.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    /// Images referenced by textures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    /// Textures (image + sampler pairs).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<Texture>,
    /// GLSL shader sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shaders: Vec<Shader>,
    /// Programs linking one vertex and one fragment shader.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub programs: Vec<Program>,
    /// Names of extensions used anywhere in the document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    /// Names of extensions a reader must support to load the document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
    /// Every other top-level property (asset, scenes, nodes, meshes, materials, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Document {
    /// Parse a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> StowResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| StowError::serde(format!("failed to parse document json: {e}")))
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_vec_pretty(&self) -> StowResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| StowError::serde(format!("failed to serialize document json: {e}")))
    }

    /// Record `name` in `extensionsUsed`, and in `extensionsRequired` when `required`.
    pub fn use_extension(&mut self, name: &str, required: bool) {
        if !self.extensions_used.iter().any(|e| e == name) {
            self.extensions_used.push(name.to_string());
        }
        if required && !self.extensions_required.iter().any(|e| e == name) {
            self.extensions_required.push(name.to_string());
        }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A binary buffer.
pub struct Buffer {
    /// Length of the buffer in bytes.
    #[serde(default)]
    pub byte_length: u64,
    /// Location of the bytes: a data URI or a relative path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Optional user-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
    /// Bytes awaiting externalization.
    #[serde(skip)]
    pub pending: Option<PendingResource>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A byte range inside a buffer.
pub struct BufferView {
    /// Index of the buffer holding the bytes.
    pub buffer: usize,
    /// Offset into the buffer in bytes.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: u64,
    /// Length of the range in bytes.
    pub byte_length: u64,
    /// Stride for vertex attribute data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<u32>,
    /// GPU buffer binding hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Optional user-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// An accessor. Only its bufferView references are interpreted.
pub struct Accessor {
    /// Backing bufferView, absent for zero-initialized accessors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    /// Sparse substitution block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<AccessorSparse>,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Sparse storage of an accessor.
pub struct AccessorSparse {
    /// Indices of the substituted elements.
    pub indices: SparseBufferRef,
    /// Substituted values.
    pub values: SparseBufferRef,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// bufferView reference inside a sparse block.
pub struct SparseBufferRef {
    /// Referenced bufferView.
    pub buffer_view: usize,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// An image, stored either behind a URI or inside a bufferView.
pub struct Image {
    /// Data URI or relative path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// MIME type, required when the image lives in a bufferView.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// bufferView holding the encoded image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    /// Optional user-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
    /// Encoded bytes awaiting externalization.
    #[serde(skip)]
    pub pending: Option<PendingResource>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A texture: an image source plus sampler.
pub struct Texture {
    /// Source image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<usize>,
    /// Sampler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<usize>,
    /// Optional user-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extension objects keyed by extension name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Pipeline stage of a shader.
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl ShaderStage {
    /// Map a GL shader type enum to a stage.
    pub fn from_gl(kind: u32) -> Option<Self> {
        match kind {
            GL_VERTEX_SHADER => Some(Self::Vertex),
            GL_FRAGMENT_SHADER => Some(Self::Fragment),
            _ => None,
        }
    }

    /// Name suffix used when deriving shader file names.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Vertex => "VS",
            Self::Fragment => "FS",
        }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A GLSL shader source.
pub struct Shader {
    /// GL shader type ([`GL_VERTEX_SHADER`] or [`GL_FRAGMENT_SHADER`]).
    #[serde(rename = "type")]
    pub kind: u32,
    /// Data URI or relative path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// bufferView holding the source text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    /// Optional user-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
    /// Source bytes awaiting externalization.
    #[serde(skip)]
    pub pending: Option<PendingResource>,
}

impl Shader {
    /// Stage of this shader, if its type enum is recognized.
    pub fn stage(&self) -> Option<ShaderStage> {
        ShaderStage::from_gl(self.kind)
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A program linking a vertex and a fragment shader.
pub struct Program {
    /// Fragment shader index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_shader: Option<usize>,
    /// Vertex shader index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_shader: Option<usize>,
    /// Optional user-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Uninterpreted properties.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Program {
    /// Shader index bound to `stage`.
    pub fn shader_for(&self, stage: ShaderStage) -> Option<usize> {
        match stage {
            ShaderStage::Vertex => self.vertex_shader,
            ShaderStage::Fragment => self.fragment_shader,
        }
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
