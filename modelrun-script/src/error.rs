use thiserror::Error;

/// Error raised while reading or running a script.
///
/// Every variant carries the 1-based line it was raised on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptLangError {
    #[error("line {line}: unrecognised input '{text}'")]
    Lex { line: usize, text: String },
    #[error("line {line}: syntax error: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {message}")]
    Runtime { line: usize, message: String },
}

impl ScriptLangError {
    pub fn line(&self) -> usize {
        match self {
            ScriptLangError::Lex { line, .. }
            | ScriptLangError::Parse { line, .. }
            | ScriptLangError::Runtime { line, .. } => *line,
        }
    }
}

pub type ScriptLangResult<T> = Result<T, ScriptLangError>;
