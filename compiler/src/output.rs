// output.rs — Output staging
//
// Phases write into a temporary directory next to the final output. Only
// after the run succeeds are results moved into place, so a failed run never
// leaves a partial output behind: dropping the staging area removes it.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const METADATA_SIDECAR_SUFFIX: &str = ".meta.json";
pub const BITCODE_SIDECAR_SUFFIX: &str = ".bc";

#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a staging directory in the parent directory of `output`.
    pub fn new(output: &Path) -> io::Result<Self> {
        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;
        let dir = tempfile::Builder::new()
            .prefix(".ncc-stage-")
            .tempdir_in(&parent)?;
        tracing::trace!(dir = %dir.path().display(), "created staging area");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Move `staged` to `dest`, replacing any existing file.
    pub fn persist(&self, staged: &Path, dest: &Path) -> io::Result<()> {
        if std::fs::rename(staged, dest).is_err() {
            std::fs::copy(staged, dest)?;
        }
        tracing::debug!(dest = %dest.display(), "persisted output");
        Ok(())
    }

    /// Write `bytes` directly to `dest` through a staged file.
    pub fn persist_bytes(&self, bytes: &[u8], dest: &Path) -> io::Result<()> {
        let name = dest
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("output"));
        let staged = self.dir().join(name);
        std::fs::write(&staged, bytes)?;
        self.persist(&staged, dest)
    }
}

/// `<output>` with `suffix` appended to its file name.
pub fn sidecar_path(output: &Path, suffix: &str) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    output.with_file_name(name)
}
