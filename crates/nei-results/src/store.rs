//! On-disk run cache.
//!
//! Each run lives in `<root>/<run_id>/` as a pretty `manifest.json` plus one
//! JSON record per committed column in `timeseries.jsonl`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{RunManifest, TimeseriesRecord};
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone)]
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

    /// Store next to a case file, under `.nei/runs`.
    pub fn for_case(case_path: &Path) -> ResultsResult<Self> {
        let case_dir = case_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "case path has no parent directory".to_string(),
            })?;
        Self::new(case_dir.join(".nei").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[TimeseriesRecord],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let mut timeseries = String::new();
        for record in records {
            timeseries.push_str(&serde_json::to_string(record)?);
            timeseries.push('\n');
        }
        fs::write(run_dir.join("timeseries.jsonl"), timeseries)?;

        // manifest last: has_run only sees fully written runs
        fs::write(
            run_dir.join("manifest.json"),
            serde_json::to_string_pretty(manifest)?,
        )?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_dir(run_id).join("manifest.json");
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_timeseries(&self, run_id: &str) -> ResultsResult<Vec<TimeseriesRecord>> {
        let path = self.run_dir(run_id).join("timeseries.jsonl");
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let mut records = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }

    /// Manifests of stored runs, optionally restricted to one case name, oldest first.
    pub fn list_runs(&self, case_name: Option<&str>) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            if let Ok(manifest) = self.load_manifest(&run_id)
                && case_name.is_none_or(|name| manifest.case_name == name)
            {
                runs.push(manifest);
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
