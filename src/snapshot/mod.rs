mod diff;
mod serialize;

pub use diff::{Rename, SnapshotDiff, compute_diff, format_diff_json, format_diff_markdown};
pub use serialize::{SNAPSHOT_VERSION, Snapshot, SnapshotError, load_snapshot, save_snapshot};
