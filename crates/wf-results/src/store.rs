//! Run storage API.

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST: &str = "manifest.json";
const RESULTS: &str = "results.csv";
const REPORT: &str = "report.txt";

#[derive(Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store next to a study file, under `.waterflow/runs`.
    pub fn for_study(study_path: &Path) -> ResultsResult<Self> {
        let study_dir = study_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "study path has no parent directory".to_string(),
            })?;
        let runs_dir = study_dir.join(".waterflow").join("runs");
        Self::new(runs_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    /// Write the manifest, the delimited result table and an optional
    /// text report.
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        results_csv: &str,
        report: Option<&str>,
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        fs::write(run_dir.join(RESULTS), results_csv)?;
        match report {
            Some(text) => fs::write(run_dir.join(REPORT), text)?,
            None => {
                let stale = run_dir.join(REPORT);
                if stale.exists() {
                    fs::remove_file(stale)?;
                }
            }
        }

        // manifest last: a run counts as cached only once it is complete
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST), manifest_json)?;

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join(MANIFEST);

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_results(&self, run_id: &str) -> ResultsResult<String> {
        let results_path = self.run_dir(run_id).join(RESULTS);

        if !results_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        Ok(fs::read_to_string(results_path)?)
    }

    pub fn load_report(&self, run_id: &str) -> ResultsResult<Option<String>> {
        if !self.has_run(run_id) {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let report_path = self.run_dir(run_id).join(REPORT);
        if !report_path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(report_path)?))
    }

    /// Runs of one study, oldest first.
    pub fn list_runs(&self, study_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && manifest.study_name == study_name
                {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
