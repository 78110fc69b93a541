//! Content fingerprint of the binary artifacts in an install tree.

use crate::{SupervisorError, SupervisorResult};

use std::fmt;
use std::io::Read;
use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Concatenated hex SHA-256 digests of every binary artifact, in path order.
///
/// Stands in for "installed version": two trees with equal fingerprints
/// carry byte-identical binaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of artifacts that went into this fingerprint.
    pub fn artifact_count(&self) -> usize {
        // 32-byte digest, hex encoded
        self.0.len() / 64
    }

    /// Short form for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hashes binary artifacts selected by file extension.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    extensions: Vec<String>,
}

impl Fingerprinter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Whether the file counts as a binary artifact.
    pub fn is_binary(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|known| *known == ext)
            })
            .unwrap_or(false)
    }

    /// Fingerprint every binary under `dir`.
    ///
    /// Entries are visited sorted by file name so the result does not depend
    /// on the file system's enumeration order. Blocks for the whole walk.
    pub fn fingerprint(&self, dir: &Path) -> SupervisorResult<Fingerprint> {
        let mut digests = String::new();

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| SupervisorError::Fingerprint {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

            if !entry.file_type().is_file() || !self.is_binary(entry.path()) {
                continue;
            }

            let digest = sha256_file(entry.path()).map_err(|e| SupervisorError::Fingerprint {
                path: entry.path().to_path_buf(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;
            digests.push_str(&digest);
        }

        Ok(Fingerprint(digests))
    }

    /// Fingerprint on the blocking pool so the runtime keeps serving output forwarding.
    pub async fn fingerprint_async(&self, dir: &Path) -> SupervisorResult<Fingerprint> {
        let hasher = self.clone();
        let dir_owned: PathBuf = dir.to_path_buf();

        tokio::task::spawn_blocking(move || hasher.fingerprint(&dir_owned))
            .await
            .map_err(|e| SupervisorError::Fingerprint {
                path: dir.to_path_buf(),
                message: format!("hashing task failed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?
    }
}

/// SHA-256 hex digest of a file, read in 64 KB chunks.
fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
