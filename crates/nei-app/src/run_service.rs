//! Run execution and caching service.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use nei_core::Element;
use nei_core::units::{k, s};
use nei_project::{build_rate_table, compile_case};
use nei_results::{
    RunManifest, RunStatus, RunStore, TimeseriesRecord, compute_run_id, records_from_state,
};
use nei_sim::{Nei, SimError};
use tracing::{info, warn};

use crate::case_service;
use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};

/// Version baked into run ids; bumping it invalidates every cached run.
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: SOLVER_VERSION.to_string(),
        }
    }
}

pub struct RunRequest<'a> {
    pub case_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub table_time_s: f64,
    pub solve_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: &str,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message: Some(message.to_string()),
        });
    }
}

/// Run the case at `request.case_path`, or load it from the run cache.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// [`ensure_run`] with stage events.
///
/// Only complete runs are served from the cache. A run that fails after
/// committing columns is still stored, with [`RunStatus::Failed`], and the call
/// returns [`AppError::RunFailed`].
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(&mut progress_cb, RunStage::LoadingCase, started, "Loading case");
    let case = case_service::load_case(request.case_path)?;

    emit_progress(&mut progress_cb, RunStage::CheckingCache, started, "Checking run cache");
    let run_id = compute_run_id(&case, &request.options.solver_version);
    let store = RunStore::for_case(request.case_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        let load_started = Instant::now();
        match store.load_manifest(&run_id) {
            Ok(manifest) if manifest.status == RunStatus::Complete => {
                emit_progress(
                    &mut progress_cb,
                    RunStage::LoadingCachedResult,
                    started,
                    "Loading cached run",
                );
                timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
                timing.total_time_s = started.elapsed().as_secs_f64();
                info!(run_id = %run_id, case = %case.name, "loaded cached run");
                emit_progress(&mut progress_cb, RunStage::Completed, started, "Loaded cached run");
                return Ok(RunResponse {
                    run_id,
                    manifest,
                    loaded_from_cache: true,
                    timing,
                });
            }
            Ok(manifest) => {
                warn!(run_id = %run_id, status = ?manifest.status, "cached run is incomplete, recomputing");
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "cached run is unreadable, recomputing");
            }
        }
    }

    let compile_started = Instant::now();
    let compiled = compile_case(&case)?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::BuildingRateTable,
        started,
        "Building rate table",
    );
    let table_started = Instant::now();
    let table = build_rate_table(&compiled)?;
    timing.table_time_s = table_started.elapsed().as_secs_f64();

    emit_progress(&mut progress_cb, RunStage::Simulating, started, "Simulating");
    let solve_started = Instant::now();
    let mut nei = Nei::new(compiled.config.clone(), Arc::new(table))?;
    let outcome = nei.simulate().map(|_| ());
    timing.solve_time_s = solve_started.elapsed().as_secs_f64();

    let status = match outcome {
        Ok(()) => RunStatus::Complete,
        Err(SimError::Run {
            step,
            element,
            source,
        }) => RunStatus::Failed {
            step,
            message: SimError::Run {
                step,
                element,
                source,
            }
            .to_string(),
        },
        Err(err) => return Err(err.into()),
    };
    let state = nei
        .results()
        .ok_or_else(|| AppError::Simulation("run produced no results".to_string()))?;

    let manifest = RunManifest {
        run_id: run_id.clone(),
        case_name: case.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        solver_version: request.options.solver_version.clone(),
        rate_model: compiled.model.clone(),
        elements: compiled
            .elements()
            .iter()
            .map(|e| e.symbol().to_string())
            .collect(),
        max_steps: compiled.config.max_steps,
        columns: state.index(),
        status,
    };

    emit_progress(&mut progress_cb, RunStage::SavingResults, started, "Saving results");
    let save_started = Instant::now();
    store.save_run(&manifest, &records_from_state(state))?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();

    if let RunStatus::Failed { message, .. } = &manifest.status {
        return Err(AppError::RunFailed {
            run_id,
            columns: manifest.columns,
            message: message.clone(),
        });
    }

    info!(
        run_id = %run_id,
        case = %case.name,
        columns = manifest.columns,
        total_s = timing.total_time_s,
        "run stored"
    );
    emit_progress(&mut progress_cb, RunStage::Completed, started, "Run completed");

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

/// Stored runs of the case at `case_path`, most recent first.
pub fn list_runs(case_path: &Path) -> AppResult<Vec<RunManifest>> {
    let case = case_service::load_case(case_path)?;
    let store = RunStore::for_case(case_path)?;
    let mut runs = store.list_runs(Some(&case.name))?;
    runs.reverse();
    Ok(runs)
}

pub fn load_run(
    case_path: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<TimeseriesRecord>)> {
    let store = RunStore::for_case(case_path)?;
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_timeseries(run_id)?;
    Ok((manifest, records))
}

/// Temperature selector for [`equilibrium`]; give at most one.
#[derive(Debug, Clone, Copy, Default)]
pub struct EquilibriumRequest {
    pub temperature_k: Option<f64>,
    pub time_s: Option<f64>,
}

/// Equilibrium fractions of every element of a case.
///
/// With no selector the case's temperature must be constant.
pub fn equilibrium(
    case_path: &Path,
    request: EquilibriumRequest,
) -> AppResult<BTreeMap<Element, Vec<f64>>> {
    let case = case_service::load_case(case_path)?;
    let compiled = compile_case(&case)?;
    let table = build_rate_table(&compiled)?;
    let nei = Nei::new(compiled.config, Arc::new(table))?;
    Ok(nei.equilibrium_fractions(request.temperature_k.map(k), request.time_s.map(s))?)
}
