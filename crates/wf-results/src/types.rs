//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub study_name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub run_type: RunType,
    pub solver_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RunType {
    Solve,
    Sweep { samples: usize, failed: usize },
}

impl RunManifest {
    /// Manifest stamped with the current time.
    pub fn now(run_id: RunId, study_name: &str, run_type: RunType, solver_version: &str) -> Self {
        Self {
            run_id,
            study_name: study_name.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_type,
            solver_version: solver_version.to_string(),
        }
    }
}
