//! File-name derivation for externalized resources.
//!
//! Names are base names without extension. [`unique_relative_path`] turns a base name into a
//! relative path that does not collide with anything already in the separate-resource sink.

use crate::document::model::{Buffer, Document, Image};

use super::sinks::SeparateResources;

fn explicit(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}

fn indexed(explicit_name: Option<&str>, doc_name: Option<&str>, fallback: &str, index: usize) -> String {
    if let Some(name) = explicit(explicit_name) {
        return name.to_string();
    }
    match explicit(doc_name) {
        Some(doc) => format!("{doc}{index}"),
        None => format!("{fallback}{index}"),
    }
}

/// Base name for buffer `index`: its own name, else `<doc><index>`, else `buffer<index>`.
pub fn buffer_name(doc_name: Option<&str>, buffer: &Buffer, index: usize) -> String {
    indexed(buffer.name.as_deref(), doc_name, "buffer", index)
}

/// Base name for image `index`: its own name, else `<doc><index>`, else `image<index>`.
pub fn image_name(doc_name: Option<&str>, image: &Image, index: usize) -> String {
    indexed(image.name.as_deref(), doc_name, "image", index)
}

/// Base name for shader `index`.
///
/// Order: the shader's own name, then `<programName><VS|FS>` of the first program using it,
/// then `<doc><VS|FS><programIndex>`, then lower-case `<vs|fs><programIndex>`. Shaders with no
/// owning program (or an unknown stage) fall back to `shader<index>`.
pub fn shader_name(doc: &Document, doc_name: Option<&str>, index: usize) -> String {
    let Some(shader) = doc.shaders.get(index) else {
        return format!("shader{index}");
    };
    if let Some(name) = explicit(shader.name.as_deref()) {
        return name.to_string();
    }
    let Some(stage) = shader.stage() else {
        return format!("shader{index}");
    };
    let owner = doc
        .programs
        .iter()
        .enumerate()
        .find(|(_, program)| program.shader_for(stage) == Some(index));
    let Some((program_index, program)) = owner else {
        return format!("shader{index}");
    };

    let suffix = stage.suffix();
    if let Some(program_name) = explicit(program.name.as_deref()) {
        return format!("{program_name}{suffix}");
    }
    match explicit(doc_name) {
        Some(doc) => format!("{doc}{suffix}{program_index}"),
        None => format!("{suffix}{program_index}").to_lowercase(),
    }
}

/// `<name><extension>`, or `<name>_<n><extension>` with the smallest `n >= 1` that is free.
pub fn unique_relative_path(taken: &SeparateResources, name: &str, extension: &str) -> String {
    let candidate = format!("{name}{extension}");
    if !taken.contains(&candidate) {
        return candidate;
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{name}_{n}{extension}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Split `relative_path` into its stem (directories included) and its extension (dot included).
pub fn split_extension(relative_path: &str) -> (&str, &str) {
    let file_start = relative_path.rfind('/').map_or(0, |i| i + 1);
    let stem_end = relative_path[file_start..]
        .rfind('.')
        .filter(|&dot| dot > 0)
        .map_or(relative_path.len(), |dot| file_start + dot);
    relative_path.split_at(stem_end)
}

/// Swap the extension of `relative_path` for `extension` (which includes the dot).
pub fn replace_extension(relative_path: &str, extension: &str) -> String {
    let (stem, _) = split_extension(relative_path);
    format!("{stem}{extension}")
}

#[cfg(test)]
#[path = "../../tests/unit/write/naming.rs"]
mod tests;
