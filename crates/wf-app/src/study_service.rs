//! Study loading, validation and introspection.

use std::path::Path;

use wf_flowsheet::Database;
use wf_project::Study;

use crate::error::{AppError, AppResult};
use crate::run_service::build_case;

/// Summary of a study for display.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySummary {
    pub name: String,
    pub solutes: Vec<String>,
    /// Units of the built train, in creation order.
    pub units: Vec<String>,
    pub degrees_of_freedom: i64,
    pub has_costing: bool,
    /// Sample count of the declared sweep, if any.
    pub sweep_samples: Option<usize>,
}

/// Load a study file (YAML, or JSON by extension) and validate it.
pub fn load_study(path: &Path) -> AppResult<Study> {
    if !path.exists() {
        return Err(AppError::StudyNotFound(path.to_path_buf()));
    }
    Ok(wf_project::load(path)?)
}

pub fn validate_study(study: &Study) -> AppResult<()> {
    wf_project::validate_study(study).map_err(|e| AppError::Validation(e.to_string()))
}

/// Summarize a study by building its train against `db`.
pub fn summarize(study: &Study, db: &Database) -> AppResult<StudySummary> {
    let case = build_case(study, db)?;
    let sweep_samples = match &study.sweep {
        Some(sweep) => Some(sweep.spec.sample_count()?),
        None => None,
    };

    Ok(StudySummary {
        name: study.name.clone(),
        solutes: study.feed.solutes.iter().map(|s| s.name.clone()).collect(),
        units: case.units().iter().map(|u| u.name.clone()).collect(),
        degrees_of_freedom: case.degrees_of_freedom(),
        has_costing: study.costing.is_some(),
        sweep_samples,
    })
}
