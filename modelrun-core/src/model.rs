//! The interface every runnable model implements.
//!
//! A model is a unit of computation over named series. It declares which attributes can be
//! bound (inputs), which it produces (outputs) and the horizon they share. The values live in
//! an [`AttributeStore`] that the runtime hands to [`Model::run`], so a model holds only its
//! own parameters.
//!
//! Models are constructed with no arguments through the [`registry`](crate::registry).
//!
//! # Example
//!
//! ```rust
//! use modelrun_core::attribute::{AttributeDefinition, AttributeStore};
//! use modelrun_core::errors::ModelRunResult;
//! use modelrun_core::model::Model;
//!
//! #[derive(Debug, Default)]
//! struct Halve;
//!
//! impl Model for Halve {
//!     fn definitions(&self) -> Vec<AttributeDefinition> {
//!         vec![
//!             AttributeDefinition::horizon(),
//!             AttributeDefinition::series_input("X"),
//!             AttributeDefinition::series_output("H"),
//!         ]
//!     }
//!
//!     fn run(&self, attributes: &mut AttributeStore) -> ModelRunResult<()> {
//!         let halved = attributes.input("X")? / 2.0;
//!         attributes.set_series("H", halved)
//!     }
//! }
//! ```

use crate::attribute::{AttributeDefinition, AttributeStore};
use crate::errors::ModelRunResult;
use std::fmt::Debug;

pub trait Model: Debug + Send + Sync {
    /// Declarations of every bindable attribute, in the order results are reported.
    ///
    /// Exactly one definition must be the horizon.
    fn definitions(&self) -> Vec<AttributeDefinition>;

    /// Compute the outputs from the bound inputs.
    ///
    /// Called at most once per loaded model.
    fn run(&self, attributes: &mut AttributeStore) -> ModelRunResult<()>;
}
