//! Artifact writer
//!
//! The composed grammar and its dispatch module are written as a pair. Each
//! artifact goes to a temporary file next to its destination, and the
//! temporaries are renamed into place only after every one of them was
//! written. A failed run leaves the previous outputs (or none) behind, never
//! a truncated file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::error::{ComposeError, Result};

/// What happened to one output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// New content was written
    Written,
    /// The file already held identical bytes and was left untouched
    Unchanged,
}

/// One file to write
#[derive(Debug, Clone, Copy)]
pub struct Artifact<'a> {
    /// Destination path
    pub path: &'a Path,
    /// Full content
    pub contents: &'a str,
}

impl<'a> Artifact<'a> {
    /// Create an artifact
    pub fn new(path: &'a Path, contents: &'a str) -> Self {
        Self { path, contents }
    }
}

/// Result of writing one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Destination path
    pub path: PathBuf,
    /// Whether it was rewritten
    pub status: FileStatus,
}

/// Writes artifacts together or not at all
#[derive(Debug, Clone, Copy)]
pub struct ArtifactWriter {
    skip_unchanged: bool,
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ArtifactWriter {
    /// Create a writer
    pub fn new(skip_unchanged: bool) -> Self {
        Self { skip_unchanged }
    }

    /// Write every artifact, renaming into place only after all were staged
    pub fn write_all<const N: usize>(
        &self,
        artifacts: [Artifact<'_>; N],
    ) -> Result<[WrittenFile; N]> {
        let mut staged: Vec<(usize, NamedTempFile)> = Vec::with_capacity(N);
        let mut statuses = [FileStatus::Unchanged; N];

        for (idx, artifact) in artifacts.iter().enumerate() {
            if self.skip_unchanged && is_current(artifact) {
                log_debug!("{} is up to date", artifact.path.display());
                continue;
            }
            staged.push((idx, stage(artifact)?));
        }

        for (idx, temp) in staged {
            let path = artifacts[idx].path;
            temp.persist(path)
                .map_err(|e| ComposeError::io(path, e.error))?;
            statuses[idx] = FileStatus::Written;
            log_debug!("wrote {}", path.display());
        }

        Ok(std::array::from_fn(|idx| WrittenFile {
            path: artifacts[idx].path.to_path_buf(),
            status: statuses[idx],
        }))
    }
}

fn is_current(artifact: &Artifact<'_>) -> bool {
    fs::read(artifact.path)
        .map(|existing| existing == artifact.contents.as_bytes())
        .unwrap_or(false)
}

fn stage(artifact: &Artifact<'_>) -> Result<NamedTempFile> {
    let dir = match artifact.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| ComposeError::io(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ComposeError::io(dir, e))?;
    temp.write_all(artifact.contents.as_bytes())
        .and_then(|_| temp.flush())
        .map_err(|e| ComposeError::io(temp.path(), e))?;
    Ok(temp)
}
