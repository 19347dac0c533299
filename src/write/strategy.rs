use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::assets::format::mime_type_for_extension;
use crate::document::model::{Document, Image, Shader};
use crate::document::pool::add_buffer;

use super::naming::{split_extension, unique_relative_path};
use super::sinks::{SeparateResources, WriteTarget, WrittenResourceMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// How a resource's bytes are carried in the output.
pub enum Representation {
    /// Appended to the buffer pool behind a new bufferView.
    BufferView,
    /// Inlined as a base64 data URI.
    DataUri,
    /// Written to the separate-resource sink and referenced by relative path.
    SeparateFile,
}

/// Separate files win over data URIs; bufferViews are the default.
pub fn choose_representation(separate: bool, data_uri: bool) -> Representation {
    if separate {
        Representation::SeparateFile
    } else if data_uri {
        Representation::DataUri
    } else {
        Representation::BufferView
    }
}

/// Encode `bytes` as `data:<mime>;base64,<payload>` with the MIME type for `extension`.
pub fn data_uri(extension: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type_for_extension(extension),
        STANDARD.encode(bytes)
    )
}

#[derive(Debug, Default)]
/// Mutable state shared by every externalization in one write invocation.
pub struct WriteState {
    /// Targets already produced, by `resourceId`.
    pub written: WrittenResourceMap,
    /// Files produced so far.
    pub separate: SeparateResources,
}

#[derive(Clone, Copy, Debug)]
/// One resource to externalize.
pub struct ResourceRequest<'a> {
    /// Final bytes.
    pub source: &'a Arc<Vec<u8>>,
    /// Identity tag; a repeat of a written identity reuses its target.
    pub resource_id: Option<&'a str>,
    /// Explicit relative path for separate files, suffixed only when other bytes already hold it.
    pub relative_path: Option<&'a str>,
    /// Base name for a derived relative path.
    pub name: &'a str,
    /// Extension including the dot.
    pub extension: &'a str,
}

/// Produce the target for `request` under `representation`.
///
/// A `resourceId` that was already written returns the cached target without touching the
/// document or the sinks. Data URIs are never cached; a repeat identity re-encodes the same
/// bytes.
pub fn externalize(
    doc: &mut Document,
    state: &mut WriteState,
    request: &ResourceRequest<'_>,
    representation: Representation,
) -> WriteTarget {
    if let Some(id) = request.resource_id
        && let Some(target) = state.written.get(id)
    {
        tracing::debug!(resource_id = id, "reusing written resource");
        return target.clone();
    }

    let target = match representation {
        Representation::DataUri => {
            return WriteTarget::Uri(data_uri(request.extension, request.source));
        }
        Representation::BufferView => {
            WriteTarget::BufferView(add_buffer(doc, Arc::clone(request.source)))
        }
        Representation::SeparateFile => {
            let path = separate_path(&state.separate, request);
            state.separate.insert(path.clone(), Arc::clone(request.source));
            WriteTarget::Uri(path)
        }
    };

    if let Some(id) = request.resource_id {
        state.written.insert(id, target.clone());
    }
    target
}

/// Relative path for a separate file.
///
/// An explicit path is kept unless the sink already holds different bytes under it; then it gets
/// the same numeric suffix a derived name would.
fn separate_path(taken: &SeparateResources, request: &ResourceRequest<'_>) -> String {
    let Some(path) = request.relative_path else {
        return unique_relative_path(taken, request.name, request.extension);
    };
    match taken.get(path) {
        Some(existing) if existing != request.source.as_slice() => {
            let (stem, extension) = split_extension(path);
            let renamed = unique_relative_path(taken, stem, extension);
            tracing::debug!(path, renamed = %renamed, "explicit path taken by other bytes");
            renamed
        }
        _ => path.to_string(),
    }
}

/// Entities that reference their bytes through exactly one of `uri` or `bufferView`.
pub trait ResourceSlot {
    /// Point the entity at `target`, clearing the other reference.
    fn apply_target(&mut self, target: &WriteTarget);
}

fn point_at(target: &WriteTarget, uri: &mut Option<String>, buffer_view: &mut Option<usize>) {
    match target {
        WriteTarget::BufferView(view) => {
            *uri = None;
            *buffer_view = Some(*view);
        }
        WriteTarget::Uri(target_uri) => {
            *buffer_view = None;
            *uri = Some(target_uri.clone());
        }
    }
}

impl ResourceSlot for Image {
    fn apply_target(&mut self, target: &WriteTarget) {
        point_at(target, &mut self.uri, &mut self.buffer_view);
    }
}

impl ResourceSlot for Shader {
    fn apply_target(&mut self, target: &WriteTarget) {
        point_at(target, &mut self.uri, &mut self.buffer_view);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/write/strategy.rs"]
mod tests;
