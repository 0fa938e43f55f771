//! Drives providers through the quantifier, one stack at a time.

use intensity_quant::{QuantParams, StackQuantifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::experiment::{ExperimentLayout, StackLocation, INTERMEDIATES_DIR};
use super::image_provider::MaskedImageProvider;
use super::provider::{MeasurementProvider, SliceWindow};
use super::report::{ReportWriter, SliceRow};
use super::table_provider::TableProvider;
use crate::error::{CollaboratorError, RunError, StackError};
use crate::models::{AnalysisConfig, MeasurementSource};

/// Rows of one successfully quantified stack
#[derive(Debug, Clone)]
pub struct StackReport {
    pub location: StackLocation,
    pub rows: Vec<SliceRow>,
    /// Slice at which the background froze, if it did
    pub frozen_at: Option<u32>,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunSummary {
    pub results_path: PathBuf,
    pub stacks_completed: usize,
    pub rows_written: usize,
    pub failures: Vec<(StackLocation, StackError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Quantify every slice a provider yields, in ascending order.
///
/// A fresh quantifier state is used per call. The first error aborts the
/// stack and no rows are returned for it.
pub fn quantify_stack<P: MeasurementProvider + ?Sized>(
    provider: &mut P,
    params: &QuantParams,
    location: &StackLocation,
) -> Result<StackReport, StackError> {
    let _span = tracing::info_span!(
        "stack",
        position = %location.position,
        wavelength = %location.wavelength
    )
    .entered();

    let mut quantifier = StackQuantifier::new(params.clone());
    let mut rows = Vec::with_capacity(provider.stack_len() as usize);
    let mut frozen_at = None;

    for slice_index in 1..=provider.stack_len() {
        let sample = provider.sample(slice_index)?;
        let record = quantifier.push(&sample.measurement)?;

        if record.background_frozen && frozen_at.is_none() {
            frozen_at = Some(slice_index);
            tracing::info!(
                slice = slice_index,
                foreground_area = record.foreground_area_percent,
                background = record.background_used,
                "Background frozen"
            );
        }
        tracing::debug!(
            slice = slice_index,
            background_used = record.background_used,
            normalized = record.normalized_integrated_density,
            frozen = record.background_frozen,
            "Slice quantified"
        );

        rows.push(SliceRow {
            elapsed_minutes: sample.elapsed_minutes,
            record,
        });
    }

    Ok(StackReport {
        location: location.clone(),
        rows,
        frozen_at,
    })
}

/// Pick and open the provider for a stack according to the config
pub fn open_provider(
    config: &AnalysisConfig,
    location: &StackLocation,
    intermediates: Option<&Path>,
) -> Result<Box<dyn MeasurementProvider>, CollaboratorError> {
    let window = SliceWindow::new(config.start_slice, config.max_slices);
    let use_table = match config.source {
        MeasurementSource::Table => true,
        MeasurementSource::Images => false,
        MeasurementSource::Auto => TableProvider::exists_in(&location.dir),
    };

    if use_table {
        tracing::debug!(dir = %location.dir.display(), "Using measurement table");
        return Ok(Box::new(TableProvider::open(&location.dir, window)?));
    }

    let mut provider = MaskedImageProvider::open(&location.dir, window)?;
    if let Some(dir) = intermediates {
        provider = provider.with_intermediates(dir, location.file_prefix());
    }
    Ok(Box::new(provider))
}

/// Open the provider for a stack and quantify it
pub fn analyze_stack(
    config: &AnalysisConfig,
    location: &StackLocation,
    intermediates: Option<&Path>,
) -> Result<StackReport, StackError> {
    let mut provider = open_provider(config, location, intermediates)?;
    quantify_stack(provider.as_mut(), &config.quant_params(), location)
}

fn prepare_intermediates(config: &AnalysisConfig, dir: PathBuf) -> Result<Option<PathBuf>, RunError> {
    if !config.save_intermediates {
        return Ok(None);
    }
    std::fs::create_dir_all(&dir).map_err(|e| CollaboratorError::io(&dir, e))?;
    Ok(Some(dir))
}

/// Write completed stacks in order and collect failures
fn write_results(
    results_path: PathBuf,
    outcomes: Vec<(StackLocation, Result<StackReport, StackError>)>,
) -> Result<RunSummary, RunError> {
    let report_err = |source: std::io::Error| RunError::Report {
        path: results_path.clone(),
        source,
    };

    let mut writer = ReportWriter::create(&results_path).map_err(report_err)?;
    let mut stacks_completed = 0;
    let mut failures = Vec::new();

    for (location, outcome) in outcomes {
        match outcome {
            Ok(report) => {
                writer
                    .write_stack(&location.position, location.wavelength, &report.rows)
                    .map_err(report_err)?;
                stacks_completed += 1;
                tracing::info!(
                    position = %location.position,
                    wavelength = %location.wavelength,
                    slices = report.rows.len(),
                    frozen_at = ?report.frozen_at,
                    "Stack complete"
                );
            }
            Err(e) => {
                tracing::error!(
                    position = %location.position,
                    wavelength = %location.wavelength,
                    error = %e,
                    "Stack aborted"
                );
                failures.push((location, e));
            }
        }
    }

    let rows_written = writer.rows_written();
    writer.finish().map_err(report_err)?;

    Ok(RunSummary {
        results_path,
        stacks_completed,
        rows_written,
        failures,
    })
}

/// Analyze a single stack directory (`.../<position>/<wavelength>`).
///
/// Results go to `<stack>/<results_file>`.
pub fn run_single(config: &AnalysisConfig, stack_dir: &Path) -> Result<RunSummary, RunError> {
    let location = StackLocation::from_stack_dir(stack_dir)?;
    let intermediates_dir = location
        .project_dir()
        .unwrap_or(location.dir.as_path())
        .join(INTERMEDIATES_DIR);
    let intermediates = prepare_intermediates(config, intermediates_dir)?;

    let outcome = analyze_stack(config, &location, intermediates.as_deref());
    write_results(
        location.dir.join(&config.results_file),
        vec![(location, outcome)],
    )
}

/// Analyze every position of a project for the configured wavelength.
///
/// Stacks run concurrently on blocking tasks, at most `config.effective_jobs()`
/// at a time, each with its own quantifier state. Results are written in
/// position order to `<project>/<results_file>`; a failing stack is reported
/// in the summary without affecting the others.
pub async fn run_batch(config: Arc<AnalysisConfig>, project: &Path) -> Result<RunSummary, RunError> {
    let layout = ExperimentLayout::open(project)?;
    let stacks = layout.stacks(config.wavelength)?;
    if stacks.is_empty() {
        tracing::warn!(
            project = %project.display(),
            wavelength = %config.wavelength,
            "No stacks found"
        );
    }
    let intermediates = prepare_intermediates(&config, layout.intermediates_dir())?;

    let jobs = config.effective_jobs();
    tracing::info!(stacks = stacks.len(), jobs, "Starting batch analysis");

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();
    let total = stacks.len();

    for (order, location) in stacks.into_iter().enumerate() {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RunError::Internal(e.to_string()))?;
        let config = config.clone();
        let intermediates = intermediates.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome = analyze_stack(&config, &location, intermediates.as_deref());
            (order, location, outcome)
        });
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        let (order, location, outcome) = joined.map_err(|e| RunError::Internal(e.to_string()))?;
        outcomes.push((order, location, outcome));
    }
    outcomes.sort_by_key(|(order, _, _)| *order);

    write_results(
        layout.root().join(&config.results_file),
        outcomes
            .into_iter()
            .map(|(_, location, outcome)| (location, outcome))
            .collect(),
    )
}
