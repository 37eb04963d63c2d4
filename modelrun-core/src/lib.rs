pub mod attribute;
pub mod config;
#[cfg(test)]
mod example_models;
pub mod handle;
pub mod loader;
pub mod model;
pub mod registry;
pub mod report;
pub mod results;
pub mod runner;
pub mod script;
pub mod series_table;
pub mod session;
pub mod timeseries;

pub mod errors;

pub use errors::{ModelRunError, ModelRunResult};
