//! One model run and the scripts applied to its results.

use crate::config::RunConfig;
use crate::errors::{ModelRunError, ModelRunResult};
use crate::handle::ModelHandle;
use crate::registry::{ModelRegistry, MODEL_REGISTRY};
use crate::report::ReportFormatter;
use crate::results::ResultsStore;
use crate::runner::ModelRunner;
use crate::script::{MergeSummary, ScriptBridge};
use crate::series_table::SeriesTable;
use crate::timeseries::Years;
use std::path::Path;
use tracing::info;

/// Ties the stages of a run together: load a model and its data, run it once, apply any
/// number of scripts to the results and render the report.
///
/// A failing stage never modifies results computed earlier.
#[derive(Debug)]
pub struct Session {
    handle: ModelHandle,
    table: SeriesTable,
    years: Years,
    results: Option<ResultsStore>,
    bridge: ScriptBridge,
    formatter: ReportFormatter,
}

impl Session {
    /// Load `model` from the global registry and bind the data file onto it.
    ///
    /// Unqualified model names are looked up in the configured namespace.
    pub fn open(config: &RunConfig, model: &str, data: impl AsRef<Path>) -> ModelRunResult<Self> {
        Self::open_from(&MODEL_REGISTRY, config, model, data)
    }

    pub fn open_from(
        registry: &ModelRegistry,
        config: &RunConfig,
        model: &str,
        data: impl AsRef<Path>,
    ) -> ModelRunResult<Self> {
        let name = config.qualify_model_name(model);
        let mut handle = ModelHandle::load_from(registry, &name)?;
        let (table, years) = config.loader().load(data, &mut handle)?;

        info!("Opened session for '{}'", name);
        Ok(Self {
            handle,
            table,
            years,
            results: None,
            bridge: config.script_bridge(),
            formatter: config.formatter(),
        })
    }

    pub fn model_name(&self) -> &str {
        self.handle.name()
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Series read from the data file
    pub fn table(&self) -> &SeriesTable {
        &self.table
    }

    pub fn years(&self) -> &Years {
        &self.years
    }

    /// Results of the run, once the model has been run
    pub fn results(&self) -> Option<&ResultsStore> {
        self.results.as_ref()
    }

    /// Run the model and keep its outputs as the results.
    pub fn run_model(&mut self) -> ModelRunResult<&ResultsStore> {
        let results = ModelRunner::new().execute(&mut self.handle)?;
        Ok(self.results.insert(results))
    }

    /// Apply script text to the results.
    pub fn run_script(&mut self, source: &str) -> ModelRunResult<MergeSummary> {
        let horizon = self.handle.horizon();
        let results = self
            .results
            .as_mut()
            .ok_or_else(|| ModelRunError::script(source, "run the model before applying scripts"))?;
        self.bridge.apply(results, horizon, source)
    }

    /// Apply a script file to the results.
    pub fn run_script_file(&mut self, path: impl AsRef<Path>) -> ModelRunResult<MergeSummary> {
        let path = path.as_ref();
        let horizon = self.handle.horizon();
        let results = self.results.as_mut().ok_or_else(|| {
            ModelRunError::script(
                &path.display().to_string(),
                "run the model before applying scripts",
            )
        })?;
        self.bridge.apply_file(results, horizon, path)
    }

    /// Render the results as a tab separated report.
    pub fn report(&self) -> ModelRunResult<String> {
        let results = self.results.as_ref().ok_or_else(|| ModelRunError::ModelExecution {
            model: self.handle.name().to_string(),
            cause: "model has not been run".to_string(),
        })?;
        self.formatter.render(results, &self.years)
    }
}
