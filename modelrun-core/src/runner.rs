use crate::errors::{ModelRunError, ModelRunResult};
use crate::handle::ModelHandle;
use crate::results::ResultsStore;
use tracing::{info, warn};

/// Runs a bound model and collects its outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRunner;

impl ModelRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run the model once and copy every output series it produced into a new
    /// [`ResultsStore`], in declaration order.
    ///
    /// Outputs the model never wrote are skipped. An output whose length differs from the
    /// horizon is reported as a [`ModelRunError::ModelExecution`].
    pub fn execute(&self, handle: &mut ModelHandle) -> ModelRunResult<ResultsStore> {
        handle.run()?;

        let horizon = handle.horizon();
        let mut results = ResultsStore::new(horizon);

        for name in handle.output_attribute_names() {
            let values = handle.attributes().series(&name)?;
            if values.is_empty() && horizon > 0 {
                warn!("Model '{}' left output '{}' unset", handle.name(), name);
                continue;
            }
            results
                .insert(name.as_str(), values.clone())
                .map_err(|e| ModelRunError::ModelExecution {
                    model: handle.name().to_string(),
                    cause: e.to_string(),
                })?;
        }

        info!(
            "Model '{}' produced {} series over a horizon of {}",
            handle.name(),
            results.len(),
            horizon
        );
        Ok(results)
    }
}
