//! Run configuration read from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the standard
//! behaviour:
//!
//! ```toml
//! model_namespace = "models"
//! data_dir = "data"
//! scripts_dir = "scripts"
//!
//! [data]
//! skip_pipe_comments = true
//!
//! [years]
//! policy = "header"        # or "synthesized" with `start = 2015`
//!
//! [report]
//! rounding = "grouped"     # or "plain"
//!
//! [script]
//! engine = "series"
//! horizon_name = "LL"
//! ```

use crate::attribute::HORIZON_ATTRIBUTE;
use crate::errors::{ModelRunError, ModelRunResult};
use crate::loader::DataLoader;
use crate::registry::{qualified_name, DEFAULT_NAMESPACE};
use crate::report::{ReportFormatter, RoundingPolicy};
use crate::script::{ScriptBridge, DEFAULT_SCRIPT_ENGINE};
use crate::timeseries::YearPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Namespace prepended to unqualified model names
    pub model_namespace: String,
    pub data_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub data: DataConfig,
    pub years: YearPolicy,
    pub report: ReportConfig,
    pub script: ScriptConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Treat lines starting with `|` as comments
    pub skip_pipe_comments: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub rounding: RoundingPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptConfig {
    /// Registered name of the script engine
    pub engine: String,
    /// Variable name under which scripts see the horizon
    pub horizon_name: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_namespace: DEFAULT_NAMESPACE.to_string(),
            data_dir: PathBuf::from("data"),
            scripts_dir: PathBuf::from("scripts"),
            data: DataConfig::default(),
            years: YearPolicy::default(),
            report: ReportConfig::default(),
            script: ScriptConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            skip_pipe_comments: true,
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            engine: DEFAULT_SCRIPT_ENGINE.to_string(),
            horizon_name: HORIZON_ATTRIBUTE.to_string(),
        }
    }
}

impl RunConfig {
    /// Read a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ModelRunResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ModelRunError::FileNotFound(path.to_path_buf()),
            _ => ModelRunError::Io(e),
        })?;
        Self::from_toml_str(&raw)
            .map_err(|e| ModelRunError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(raw: &str) -> ModelRunResult<Self> {
        toml::from_str(raw).map_err(|e| ModelRunError::Config(e.message().to_string()))
    }

    /// Qualify a model name with the configured namespace unless it already has one.
    pub fn qualify_model_name(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            qualified_name(&self.model_namespace, name)
        }
    }

    pub fn loader(&self) -> DataLoader {
        DataLoader::new()
            .with_year_policy(self.years)
            .with_pipe_comments(self.data.skip_pipe_comments)
    }

    pub fn formatter(&self) -> ReportFormatter {
        ReportFormatter::new(self.report.rounding)
    }

    pub fn script_bridge(&self) -> ScriptBridge {
        ScriptBridge::named(&self.script.engine).with_horizon_name(&self.script.horizon_name)
    }
}
