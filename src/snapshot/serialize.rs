use crate::fs::FileSystem;
use crate::surface::{SurfaceRecord, SurfaceReport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Persisted fingerprint of one package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot version for forward compatibility
    pub version: u32,
    /// Timestamp when snapshot was created
    pub created_at: String,
    pub package: String,
    /// Records in canonical-name order.
    pub records: Vec<SurfaceRecord>,
    pub errors: Vec<String>,
}

impl Snapshot {
    pub fn from_report(package: &str, report: &SurfaceReport) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: chrono_lite_now(),
            package: package.to_string(),
            records: report.records.values().cloned().collect(),
            errors: report.errors.iter().cloned().collect(),
        }
    }
}

pub fn save_snapshot(
    fs: &dyn FileSystem,
    snapshot: &Snapshot,
    path: &Path,
) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs.write(path, &json)?;
    Ok(())
}

pub fn load_snapshot(fs: &dyn FileSystem, path: &Path) -> Result<Snapshot, SnapshotError> {
    let content = fs.read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    Ok(snapshot)
}

/// Simple timestamp function (no chrono dependency)
fn chrono_lite_now() -> String {
    use std::time::SystemTime;
    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", duration.as_secs())
}
