//! On-disk snapshots of the flat vector index.
//!
//! The index file is a single rkyv-encoded [`IndexSnapshot`]. Every write
//! replaces the whole file: the snapshot is written to a sibling `.tmp`
//! file, fsynced, and renamed over the target, and the directory is fsynced
//! after the rename. A crash leaves either the old or the new snapshot and
//! never a torn one.
//!
//! A blake3 checksum over the dimension and the raw vector data guards
//! against bit rot that still happens to decode.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use ragify_core::{Error, Result};
use rkyv::rancor;
use rkyv::util::AlignedVec;

/// Bumped whenever the snapshot layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Serialized form of a flat index.
#[derive(Debug, Clone, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct IndexSnapshot {
    /// Layout version, see [`FORMAT_VERSION`].
    pub format_version: u32,

    /// Vector dimension.
    pub dimension: u32,

    /// Number of stored vectors.
    pub count: u64,

    /// blake3 over the dimension and vector data.
    pub checksum: [u8; 32],

    /// Row-major vector data, `count * dimension` floats.
    pub vectors: Vec<f32>,
}

impl IndexSnapshot {
    /// Build a snapshot of `vectors` (row-major) with the given dimension.
    pub fn new(dimension: usize, vectors: &[f32]) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::invalid_data("index dimension must be positive"));
        }
        if vectors.len() % dimension != 0 {
            return Err(Error::invalid_data(format!(
                "vector data length {} is not a multiple of dimension {dimension}",
                vectors.len()
            )));
        }
        let dimension = u32::try_from(dimension)
            .map_err(|_| Error::invalid_data(format!("dimension {dimension} too large")))?;

        Ok(Self {
            format_version: FORMAT_VERSION,
            dimension,
            count: (vectors.len() / dimension as usize) as u64,
            checksum: checksum(dimension, vectors),
            vectors: vectors.to_vec(),
        })
    }

    /// Check internal consistency after decoding.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::parse(format!(
                "unsupported index format version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.dimension == 0 {
            return Err(Error::parse("index snapshot has zero dimension"));
        }
        let expected_len = self.count as usize * self.dimension as usize;
        if self.vectors.len() != expected_len {
            return Err(Error::parse(format!(
                "index snapshot holds {} floats, expected {expected_len}",
                self.vectors.len()
            )));
        }
        if checksum(self.dimension, &self.vectors) != self.checksum {
            return Err(Error::parse("index snapshot checksum mismatch"));
        }
        Ok(())
    }
}

fn checksum(dimension: u32, vectors: &[f32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&dimension.to_le_bytes());
    for value in vectors {
        hasher.update(&value.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Atomically write a snapshot to `path`.
///
/// On failure before the rename the temporary file is removed and `path` is
/// left as it was.
pub fn save_snapshot(path: &Path, snapshot: &IndexSnapshot) -> Result<()> {
    let bytes = rkyv::to_bytes::<rancor::Error>(snapshot)
        .map_err(|e| Error::Serialization(format!("Failed to encode index snapshot: {e}")))?;

    let tmp = tmp_path(path);
    if let Err(e) = write_synced(&tmp, &bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::io_with_path(e, path));
    }
    sync_parent_dir(path)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| Error::io_with_path(e, path))?;
    file.write_all(bytes)
        .map_err(|e| Error::io_with_path(e, path))?;
    file.sync_all().map_err(|e| Error::io_with_path(e, path))
}

/// Flush the directory entry created by the rename.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(|e| Error::io_with_path(e, parent))
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

/// Load and validate a snapshot from `path`.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<IndexSnapshot>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io_with_path(e, path)),
    };

    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(&bytes);

    let snapshot = rkyv::from_bytes::<IndexSnapshot, rancor::Error>(&aligned)
        .map_err(|e| Error::parse(format!("Failed to decode index snapshot: {e}")))?;
    snapshot.validate()?;

    Ok(Some(snapshot))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

// ============================================================================
// Tests
// ============================================================================
