use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{StowError, StowResult};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Where an externalized resource ended up.
pub enum WriteTarget {
    /// Index of the bufferView holding the bytes.
    BufferView(usize),
    /// Data URI or relative path.
    Uri(String),
}

#[derive(Clone, Debug, Default)]
/// `resourceId` to target map for one write invocation. Append-only.
pub struct WrittenResourceMap {
    targets: HashMap<String, WriteTarget>,
}

impl WrittenResourceMap {
    /// Target already produced for `resource_id`.
    pub fn get(&self, resource_id: &str) -> Option<&WriteTarget> {
        self.targets.get(resource_id)
    }

    /// Record the target of `resource_id`. The first recorded target wins.
    pub fn insert(&mut self, resource_id: &str, target: WriteTarget) {
        self.targets
            .entry(resource_id.to_string())
            .or_insert(target);
    }

    /// Number of recorded identities.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Return `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Files the caller must materialize, keyed by relative path.
pub struct SeparateResources {
    files: BTreeMap<String, Arc<Vec<u8>>>,
}

impl SeparateResources {
    /// Return `true` when `relative_path` is taken.
    pub fn contains(&self, relative_path: &str) -> bool {
        self.files.contains_key(relative_path)
    }

    /// Store `bytes` under `relative_path` unless the path is already taken.
    ///
    /// Returns `false` when an earlier entry holds the path; that entry is kept.
    pub fn insert(&mut self, relative_path: String, bytes: Arc<Vec<u8>>) -> bool {
        match self.files.entry(relative_path) {
            Entry::Vacant(slot) => {
                slot.insert(bytes);
                true
            }
            Entry::Occupied(slot) => {
                if slot.get().as_slice() != bytes.as_slice() {
                    tracing::warn!(path = %slot.key(), "separate resource path already holds other bytes");
                }
                false
            }
        }
    }

    /// Bytes stored under `relative_path`.
    pub fn get(&self, relative_path: &str) -> Option<&[u8]> {
        self.files.get(relative_path).map(|b| b.as_slice())
    }

    /// Iterate `(relative_path, bytes)` in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Return `true` when there are no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file below `dir`, creating parent directories as needed.
    pub fn write_all(&self, dir: &Path) -> StowResult<()> {
        for (relative_path, bytes) in &self.files {
            let path = dir.join(relative_path);
            ensure_parent_dir(&path)?;
            std::fs::write(&path, bytes.as_slice()).map_err(|e| StowError::io("write", &path, e))?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// One growable byte region receiving every buffer when buffers are stored in memory.
pub struct BufferStorage {
    data: Vec<u8>,
}

impl BufferStorage {
    /// Append `bytes`, returning the offset they start at.
    pub fn append(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(bytes);
        offset
    }

    /// Accumulated bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of accumulated bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return `true` when nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the accumulated bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

#[derive(Clone, Debug, Default)]
/// Side outputs of a write invocation.
pub struct ResourceOutputs {
    /// Files to materialize next to the document.
    pub separate_resources: SeparateResources,
    /// Combined buffer bytes, present when `bufferStorage` was requested.
    pub buffer_storage: Option<BufferStorage>,
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> StowResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StowError::io("create", parent, e))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/write/sinks.rs"]
mod tests;
