//! Registry of constructible models.
//!
//! Models are looked up by a fully qualified name, `<namespace>.<Name>` (for example
//! `models.Doubler`). Registrations come from two places:
//!
//! - compile time, with [`register_model!`](crate::register_model), collected via `inventory`
//! - runtime, with [`ModelRegistry::register`]
//!
//! The global instance is [`MODEL_REGISTRY`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use modelrun_core::register_model;
//!
//! register_model!(Doubler, name = "Doubler", description = "Y = 2 * X");
//! ```

use crate::model::Model;
use indexmap::IndexMap;
use std::sync::{Arc, LazyLock, RwLock};

/// Namespace that catalog models are registered under
pub const DEFAULT_NAMESPACE: &str = "models";

/// Constructs a fresh, zero-initialised model
pub type ModelFactory = fn() -> Box<dyn Model>;

type RuntimeFactory = Arc<dyn Fn() -> Box<dyn Model> + Send + Sync>;

/// Join a namespace and a model name.
pub fn qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Compile-time model registration.
///
/// Holds `&'static str`s so that it can be built in a const context and submitted to
/// `inventory`.
#[derive(Debug, Clone, Copy)]
pub struct StaticModelRegistration {
    pub namespace: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub factory: ModelFactory,
}

impl StaticModelRegistration {
    pub const fn new(
        namespace: &'static str,
        name: &'static str,
        description: &'static str,
        factory: ModelFactory,
    ) -> Self {
        Self {
            namespace,
            name,
            description,
            factory,
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(self.namespace, self.name)
    }
}

inventory::collect!(StaticModelRegistration);

/// Register a model type under [`DEFAULT_NAMESPACE`].
///
/// The type must implement [`Default`] and [`Model`].
#[macro_export]
macro_rules! register_model {
    ($model:ty, name = $name:expr, description = $desc:expr $(,)?) => {
        ::inventory::submit! {
            $crate::registry::StaticModelRegistration::new(
                $crate::registry::DEFAULT_NAMESPACE,
                $name,
                $desc,
                || ::std::boxed::Box::new(<$model as ::std::default::Default>::default()),
            )
        }
    };
}

/// A model available for loading.
#[derive(Clone)]
pub struct ModelEntry {
    pub name: String,
    pub description: String,
    factory: RuntimeFactory,
}

impl ModelEntry {
    /// Construct a new instance of the model
    pub fn instantiate(&self) -> Box<dyn Model> {
        (self.factory)()
    }
}

impl std::fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Registry for model factories.
///
/// Static registrations are immutable and lock-free; runtime registrations are protected
/// by a `RwLock`.
pub struct ModelRegistry {
    include_static: bool,
    runtime: RwLock<IndexMap<String, ModelEntry>>,
}

impl ModelRegistry {
    /// A registry that sees both static and runtime registrations.
    pub fn new() -> Self {
        Self {
            include_static: true,
            runtime: RwLock::new(IndexMap::new()),
        }
    }

    /// A registry that only contains models registered on it at runtime.
    pub fn empty() -> Self {
        Self {
            include_static: false,
            runtime: RwLock::new(IndexMap::new()),
        }
    }

    fn static_entries(&self) -> impl Iterator<Item = &'static StaticModelRegistration> {
        let include_static = self.include_static;
        inventory::iter::<StaticModelRegistration>
            .into_iter()
            .filter(move |_| include_static)
    }

    /// Look up a model by its qualified name.
    pub fn get(&self, name: &str) -> Option<ModelEntry> {
        if let Some(registration) = self.static_entries().find(|r| r.qualified_name() == name) {
            let factory = registration.factory;
            return Some(ModelEntry {
                name: registration.qualified_name(),
                description: registration.description.to_string(),
                factory: Arc::new(factory),
            });
        }

        let runtime = self.runtime.read().unwrap_or_else(|e| e.into_inner());
        runtime.get(name).cloned()
    }

    /// Register a model factory at runtime under a qualified name.
    ///
    /// # Errors
    ///
    /// Returns `Err` with a message if the name is already registered.
    pub fn register<F>(&self, name: &str, description: &str, factory: F) -> Result<(), String>
    where
        F: Fn() -> Box<dyn Model> + Send + Sync + 'static,
    {
        if self.static_entries().any(|r| r.qualified_name() == name) {
            return Err(format!(
                "Model '{}' is already registered as a static model",
                name
            ));
        }

        let mut runtime = self.runtime.write().unwrap_or_else(|e| e.into_inner());
        if runtime.contains_key(name) {
            return Err(format!(
                "Model '{}' is already registered as a runtime model",
                name
            ));
        }

        runtime.insert(
            name.to_string(),
            ModelEntry {
                name: name.to_string(),
                description: description.to_string(),
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    /// All registered models, sorted by name.
    pub fn list(&self) -> Vec<ModelEntry> {
        let mut result: Vec<ModelEntry> = self
            .static_entries()
            .map(|registration| {
                let factory = registration.factory;
                ModelEntry {
                    name: registration.qualified_name(),
                    description: registration.description.to_string(),
                    factory: Arc::new(factory),
                }
            })
            .collect();

        let runtime = self.runtime.read().unwrap_or_else(|e| e.into_inner());
        result.extend(runtime.values().cloned());

        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// Names of the models registered under `namespace`, without the namespace prefix.
    pub fn names_in(&self, namespace: &str) -> Vec<String> {
        let prefix = qualified_name(namespace, "");
        self.list()
            .into_iter()
            .filter_map(|entry| entry.name.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        let runtime = self.runtime.read().unwrap_or_else(|e| e.into_inner());
        self.static_entries().count() + runtime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every runtime registration.
    ///
    /// Static registrations cannot be removed.
    pub fn clear_runtime(&self) {
        let mut runtime = self.runtime.write().unwrap_or_else(|e| e.into_inner());
        runtime.clear();
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global model registry instance.
pub static MODEL_REGISTRY: LazyLock<ModelRegistry> = LazyLock::new(ModelRegistry::new);
