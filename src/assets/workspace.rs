use std::path::{Path, PathBuf};

use crate::foundation::error::{StowError, StowResult};

/// Private scratch directory for one image's transcode chain.
///
/// Every allocated file name is unique within the workspace, and each workspace lives in its own
/// freshly created directory, so concurrent transcodes never collide. Stages release their files
/// once the output has been read back; the directory itself is removed on drop, including when a
/// stage fails midway.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: tempfile::TempDir,
    next: u32,
}

impl TempWorkspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> StowResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("gltf-stow-")
            .tempdir()
            .map_err(|e| StowError::filesystem(format!("failed to create temp dir: {e}")))?;
        Ok(Self { dir, next: 0 })
    }

    /// Create a workspace under `root`.
    pub fn new_in(root: &Path) -> StowResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("gltf-stow-")
            .tempdir_in(root)
            .map_err(|e| StowError::io("create temp dir in", root, e))?;
        Ok(Self { dir, next: 0 })
    }

    /// Directory holding this workspace's files.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Reserve a fresh file path with `extension` (including the leading dot).
    pub fn alloc(&mut self, extension: &str) -> PathBuf {
        let n = self.next;
        self.next += 1;
        self.dir.path().join(format!("stage{n}{extension}"))
    }

    /// Write `bytes` to a freshly allocated file.
    pub fn write(&mut self, bytes: &[u8], extension: &str) -> StowResult<PathBuf> {
        let path = self.alloc(extension);
        std::fs::write(&path, bytes).map_err(|e| StowError::io("write", &path, e))?;
        Ok(path)
    }

    /// Read a stage output back into memory.
    pub fn read(&self, path: &Path) -> StowResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| StowError::io("read", path, e))
    }

    /// Delete files a stage no longer needs.
    pub fn release(&self, paths: &[&Path]) -> StowResult<()> {
        for path in paths {
            std::fs::remove_file(path).map_err(|e| StowError::io("delete", path, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/workspace.rs"]
mod tests;
