//! Opaque files shipped with the application
//!
//! Unit definitions and the proxy site are loaded as raw bytes and written
//! to their destination untouched. Nothing here parses or templates them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ArtifactSpec;

/// Errors reading or installing a blob
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The source tree does not contain the file
    #[error("'{name}' not found in source tree at {}", .path.display())]
    Missing { name: String, path: PathBuf },

    #[error("failed to read '{name}' from {}: {source}", .path.display())]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{name}' to {}: {source}", .path.display())]
    Write {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A named byte blob with a declared destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub name: String,
    pub bytes: Vec<u8>,
    pub destination: PathBuf,
}

impl Blob {
    /// Load `spec` from `source_dir`, to be installed as `dest_dir/<name>`
    pub fn load(spec: &ArtifactSpec, source_dir: &Path, dest_dir: &Path) -> Result<Self, BlobError> {
        let path = source_dir.join(&spec.source);
        if !path.is_file() {
            return Err(BlobError::Missing {
                name: spec.name.clone(),
                path,
            });
        }

        let bytes = fs::read(&path).map_err(|source| BlobError::Read {
            name: spec.name.clone(),
            path: path.clone(),
            source,
        })?;

        log::debug!("Loaded {} ({} bytes) from {}", spec.name, bytes.len(), path.display());

        Ok(Self {
            name: spec.name.clone(),
            bytes,
            destination: dest_dir.join(&spec.name),
        })
    }

    /// Whether the destination already holds exactly these bytes
    pub fn is_current(&self) -> bool {
        fs::read(&self.destination).is_ok_and(|existing| existing == self.bytes)
    }

    /// Write the bytes to the destination, replacing whatever is there
    ///
    /// A symlink at the destination is replaced, not followed.
    pub fn install(&self) -> Result<(), BlobError> {
        let write_err = |source: io::Error| BlobError::Write {
            name: self.name.clone(),
            path: self.destination.clone(),
            source,
        };

        if let Some(parent) = self.destination.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        if self.destination.is_symlink() {
            fs::remove_file(&self.destination).map_err(write_err)?;
        }
        fs::write(&self.destination, &self.bytes).map_err(write_err)?;

        log::debug!("Installed {} -> {}", self.name, self.destination.display());
        Ok(())
    }
}
