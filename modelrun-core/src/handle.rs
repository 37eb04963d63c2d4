use crate::attribute::{AttributeDefinition, AttributeKind, AttributeStore, AttributeValue};
use crate::errors::{panic_message, ModelRunError, ModelRunResult};
use crate::model::Model;
use crate::registry::{ModelRegistry, MODEL_REGISTRY};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// A live model instance together with the values of its bindable attributes.
///
/// The handle is the only way the runtime touches a model: data is bound with
/// [`set_attribute`](ModelHandle::set_attribute), the computation is triggered with
/// [`run`](ModelHandle::run) and results are read back with
/// [`get_attribute`](ModelHandle::get_attribute).
#[derive(Debug)]
pub struct ModelHandle {
    name: String,
    model: Box<dyn Model>,
    attributes: AttributeStore,
    executed: bool,
}

impl ModelHandle {
    /// Instantiate a model from the global registry by its qualified name.
    pub fn load(name: &str) -> ModelRunResult<Self> {
        Self::load_from(&MODEL_REGISTRY, name)
    }

    /// Instantiate a model from the given registry by its qualified name.
    ///
    /// Fails with [`ModelRunError::ModelLoad`] if the name is unknown, the factory panics or
    /// the model's attribute declarations are invalid.
    pub fn load_from(registry: &ModelRegistry, name: &str) -> ModelRunResult<Self> {
        let entry = registry.get(name).ok_or_else(|| ModelRunError::ModelLoad {
            name: name.to_string(),
            cause: "no model registered with this name".to_string(),
        })?;

        let model = catch_unwind(AssertUnwindSafe(|| entry.instantiate())).map_err(|payload| {
            ModelRunError::ModelLoad {
                name: name.to_string(),
                cause: format!("constructor panicked: {}", panic_message(payload)),
            }
        })?;

        Self::from_model(name, model)
    }

    /// Wrap an already constructed model
    pub fn from_model(name: &str, model: Box<dyn Model>) -> ModelRunResult<Self> {
        let attributes = AttributeStore::new(name, model.definitions()).map_err(|cause| {
            ModelRunError::ModelLoad {
                name: name.to_string(),
                cause,
            }
        })?;
        debug!(
            "Loaded model '{}' with {} bindable attributes",
            name,
            attributes.definitions().len()
        );

        Ok(Self {
            name: name.to_string(),
            model,
            attributes,
            executed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        self.attributes.definitions()
    }

    /// Names of every bindable attribute, horizon included, in declaration order.
    pub fn bindable_attribute_names(&self) -> Vec<String> {
        self.definitions().iter().map(|d| d.name.clone()).collect()
    }

    pub fn horizon_name(&self) -> &str {
        self.attributes.horizon_name()
    }

    pub fn horizon(&self) -> usize {
        self.attributes.horizon()
    }

    pub fn set_horizon(&mut self, horizon: usize) {
        self.attributes.set_horizon(horizon);
    }

    /// Bind a value onto a declared attribute.
    ///
    /// On error no attribute is modified.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> ModelRunResult<()> {
        self.attributes.set(name, value.into())
    }

    pub fn get_attribute(&self, name: &str) -> ModelRunResult<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn has_run(&self) -> bool {
        self.executed
    }

    /// Run the model's computation.
    ///
    /// A model is run at most once; running again requires a freshly loaded handle.
    /// Errors and panics raised by the model are reported as
    /// [`ModelRunError::ModelExecution`], after which the attribute values are unspecified.
    pub fn run(&mut self) -> ModelRunResult<()> {
        if self.executed {
            return Err(self.execution_error("model has already been run; load it again"));
        }
        self.executed = true;

        let model = &self.model;
        let attributes = &mut self.attributes;
        let outcome = catch_unwind(AssertUnwindSafe(|| model.run(attributes)));

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(ModelRunError::ModelExecution { cause, .. })) => {
                Err(self.execution_error(cause))
            }
            Ok(Err(err)) => Err(self.execution_error(err)),
            Err(payload) => Err(self.execution_error(format!(
                "model panicked: {}",
                panic_message(payload)
            ))),
        }
    }

    /// Series attributes the model declares as outputs, in declaration order.
    pub fn output_attribute_names(&self) -> Vec<String> {
        self.definitions()
            .iter()
            .filter(|d| d.kind == AttributeKind::Series && d.role.is_output())
            .map(|d| d.name.clone())
            .collect()
    }

    fn execution_error(&self, cause: impl ToString) -> ModelRunError {
        ModelRunError::ModelExecution {
            model: self.name.clone(),
            cause: cause.to_string(),
        }
    }
}
