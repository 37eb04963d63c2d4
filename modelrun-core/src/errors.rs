use std::path::PathBuf;
use thiserror::Error;

/// Error type for every stage of a model run.
///
/// Each fault is wrapped at the boundary nearest its origin with the context needed to
/// diagnose it (model name, attribute, file and line, or script text).
#[derive(Error, Debug)]
pub enum ModelRunError {
    #[error("Could not load model '{name}': {cause}")]
    ModelLoad { name: String, cause: String },
    #[error("Model '{model}' has no bindable attribute named '{name}'")]
    UnknownAttribute { model: String, name: String },
    #[error("Attribute '{name}' on model '{model}' expects a {expected} value, got a {found} value")]
    AttributeType {
        model: String,
        name: String,
        expected: String,
        found: String,
    },
    #[error("Series '{name}' has {found} values but the horizon is {expected}")]
    HorizonMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("{path}:{line}: {message}")]
    DataFormat {
        path: String,
        line: usize,
        message: String,
    },
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Error executing model '{model}': {cause}")]
    ModelExecution { model: String, cause: String },
    #[error("Error executing script: {cause}\n--- script ---\n{script}")]
    Script { script: String, cause: String },
    #[error("Years list is empty. Load a data file with a LATA header before rendering a report")]
    EmptyHorizon,
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ModelRunError {
    /// Wrap a script fault together with the script text that caused it.
    pub fn script(script: &str, cause: impl ToString) -> Self {
        ModelRunError::Script {
            script: script.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Convenience type for `Result<T, ModelRunError>`.
pub type ModelRunResult<T> = Result<T, ModelRunError>;

/// Extract a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}
