//! A small array language for post-processing model results.
//!
//! Scripts see every result series as a variable along with the horizon, and may define new
//! series or overwrite existing ones:
//!
//! ```text
//! PKB_growth = growth(PKB)
//! G = zeros(LL)
//! for i in 1..LL {
//!     G[i] = G[i - 1] + PKB[i] - PKB[i - 1]
//! }
//! ```
//!
//! Linking this crate registers the engine as `series`.

pub mod ast;
mod builtins;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use engine::{run, SeriesScriptEngine, ENGINE_NAME};
pub use error::{ScriptLangError, ScriptLangResult};
