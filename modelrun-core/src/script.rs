//! Post-processing of results with script text.
//!
//! The [`ScriptBridge`] hands the current results to a [`ScriptEngine`] as a bag of named
//! variables, evaluates the script and merges every series the script leaves behind back
//! into the results. Engines are opaque to this crate and selected by name from the
//! engines registered with [`register_script_engine!`](crate::register_script_engine).

use crate::attribute::HORIZON_ATTRIBUTE;
use crate::errors::{panic_message, ModelRunError, ModelRunResult};
use crate::results::ResultsStore;
use crate::timeseries::{FloatValue, Series};
use indexmap::IndexMap;
use std::error::Error;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info};

/// Name of the engine used when none is configured
pub const DEFAULT_SCRIPT_ENGINE: &str = "series";

/// A value held by a script variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Integer(i64),
    Number(FloatValue),
    Bool(bool),
    Text(String),
    Series(Series),
}

impl ScriptValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Integer(_) => "integer",
            ScriptValue::Number(_) => "number",
            ScriptValue::Bool(_) => "bool",
            ScriptValue::Text(_) => "text",
            ScriptValue::Series(_) => "series",
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            ScriptValue::Series(values) => Some(values),
            _ => None,
        }
    }
}

impl From<Series> for ScriptValue {
    fn from(value: Series) -> Self {
        ScriptValue::Series(value)
    }
}

impl From<FloatValue> for ScriptValue {
    fn from(value: FloatValue) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        ScriptValue::Integer(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

/// Named variables exchanged with a script engine, in insertion order.
pub type VariableBag = IndexMap<String, ScriptValue>;

/// An interpreter for script text.
pub trait ScriptEngine: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate `source` with `bag` as the initial variables and return every variable
    /// defined once the script finishes.
    fn evaluate(
        &self,
        bag: VariableBag,
        source: &str,
    ) -> Result<VariableBag, Box<dyn Error + Send + Sync>>;
}

/// Constructs a script engine
pub type ScriptEngineFactory = fn() -> Box<dyn ScriptEngine>;

/// Compile-time script engine registration, collected via `inventory`.
#[derive(Debug, Clone, Copy)]
pub struct ScriptEngineRegistration {
    pub name: &'static str,
    pub factory: ScriptEngineFactory,
}

impl ScriptEngineRegistration {
    pub const fn new(name: &'static str, factory: ScriptEngineFactory) -> Self {
        Self { name, factory }
    }
}

inventory::collect!(ScriptEngineRegistration);

/// Register a script engine type under a name.
///
/// The type must implement [`Default`] and [`ScriptEngine`].
#[macro_export]
macro_rules! register_script_engine {
    ($engine:ty, name = $name:expr $(,)?) => {
        ::inventory::submit! {
            $crate::script::ScriptEngineRegistration::new(
                $name,
                || ::std::boxed::Box::new(<$engine as ::std::default::Default>::default()),
            )
        }
    };
}

/// Construct the registered engine with the given name.
pub fn script_engine_by_name(name: &str) -> Option<Box<dyn ScriptEngine>> {
    inventory::iter::<ScriptEngineRegistration>
        .into_iter()
        .find(|registration| registration.name == name)
        .map(|registration| (registration.factory)())
}

/// Names of every registered engine, sorted.
pub fn script_engine_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = inventory::iter::<ScriptEngineRegistration>
        .into_iter()
        .map(|registration| registration.name)
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// What a script application changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Series that did not exist before, in the order they were appended
    pub added: Vec<String>,
    /// Existing series whose values changed
    pub updated: Vec<String>,
}

impl MergeSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

/// Applies scripts to a [`ResultsStore`].
#[derive(Debug)]
pub struct ScriptBridge {
    engine_name: String,
    engine: Option<Box<dyn ScriptEngine>>,
    horizon_name: String,
}

impl ScriptBridge {
    /// Use an engine from the registry.
    ///
    /// An unknown name is only reported when a script is applied.
    pub fn named(engine_name: &str) -> Self {
        Self {
            engine_name: engine_name.to_string(),
            engine: script_engine_by_name(engine_name),
            horizon_name: HORIZON_ATTRIBUTE.to_string(),
        }
    }

    pub fn with_engine(engine: Box<dyn ScriptEngine>) -> Self {
        Self {
            engine_name: engine.name().to_string(),
            engine: Some(engine),
            horizon_name: HORIZON_ATTRIBUTE.to_string(),
        }
    }

    /// Name under which the horizon is exposed to scripts
    pub fn with_horizon_name(mut self, horizon_name: &str) -> Self {
        self.horizon_name = horizon_name.to_string();
        self
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    /// Evaluate `source` against `store` and merge the resulting series.
    ///
    /// Every series variable left by the script must have `horizon` values. Existing names
    /// are overwritten in place and new names appended. The horizon variable is never
    /// merged. On any failure `store` is left exactly as it was.
    pub fn apply(
        &self,
        store: &mut ResultsStore,
        horizon: usize,
        source: &str,
    ) -> ModelRunResult<MergeSummary> {
        if source.trim().is_empty() {
            return Err(ModelRunError::script(source, "script is empty"));
        }
        let engine = self.engine.as_ref().ok_or_else(|| {
            ModelRunError::script(
                source,
                format!("no script engine named '{}'", self.engine_name),
            )
        })?;

        let mut bag: VariableBag = store
            .iter()
            .map(|(name, values)| (name.to_string(), ScriptValue::Series(values.clone())))
            .collect();
        bag.insert(self.horizon_name.clone(), ScriptValue::Integer(horizon as i64));

        let returned = catch_unwind(AssertUnwindSafe(|| engine.evaluate(bag, source)))
            .map_err(|payload| {
                ModelRunError::script(
                    source,
                    format!("script engine panicked: {}", panic_message(payload)),
                )
            })?
            .map_err(|e| ModelRunError::script(source, e))?;

        let mut merged = store.clone();
        let mut summary = MergeSummary::default();
        for (name, value) in returned {
            if name == self.horizon_name {
                continue;
            }
            let values = match value {
                ScriptValue::Series(values) => values,
                other => {
                    debug!("Skipping {} variable '{}'", other.type_name(), name);
                    continue;
                }
            };
            if values.len() != horizon {
                return Err(ModelRunError::script(
                    source,
                    format!(
                        "variable '{}' has {} values but the horizon is {}",
                        name,
                        values.len(),
                        horizon
                    ),
                ));
            }

            match merged.get(&name) {
                None => summary.added.push(name.clone()),
                Some(existing) if *existing != values => summary.updated.push(name.clone()),
                Some(_) => {}
            }
            merged
                .insert(name, values)
                .map_err(|e| ModelRunError::script(source, e))?;
        }

        *store = merged;
        info!(
            "Script added {} and updated {} series",
            summary.added.len(),
            summary.updated.len()
        );
        Ok(summary)
    }

    /// Read a script file and [`apply`](ScriptBridge::apply) it.
    pub fn apply_file(
        &self,
        store: &mut ResultsStore,
        horizon: usize,
        path: impl AsRef<Path>,
    ) -> ModelRunResult<MergeSummary> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ModelRunError::FileNotFound(path.to_path_buf()),
            _ => ModelRunError::Io(e),
        })?;
        debug!("Applying script {}", path.display());
        self.apply(store, horizon, &source)
    }
}
