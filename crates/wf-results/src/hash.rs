//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use wf_flowsheet::Database;
use wf_project::Study;

/// Run id of `study` against `database` for a run kind (`"solve"`,
/// `"sweep"`).
///
/// Sweep and solve runs of the same study get different ids, so both can
/// sit in the cache. Changing any unit parameter in the database changes
/// the id.
pub fn compute_run_id(
    study: &Study,
    database: &Database,
    kind: &str,
    solver_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    let study_json = serde_json::to_string(study).unwrap_or_default();
    hasher.update(study_json.as_bytes());
    let database_json = serde_json::to_string(database).unwrap_or_default();
    hasher.update(database_json.as_bytes());
    hasher.update(kind.as_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
