//! Project-type registry.
//!
//! A `Registry` is a constructed value wired up during process
//! initialization and passed to `load`/`create` explicitly; there is no
//! ambient package-level registry. Duplicate registration is a programmer
//! error and panics at boot rather than surfacing as a runtime user error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::ProjectTypeConfig;

#[derive(Default)]
pub struct Registry {
    types: HashMap<String, Arc<ProjectTypeConfig>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Registers a project-type configuration under its own name.
    ///
    /// # Panics
    ///
    /// Panics if a configuration with the same name is already registered.
    pub fn register(&mut self, config: ProjectTypeConfig) {
        let name = config.name().to_string();
        if self.types.contains_key(&name) {
            panic!("project type already registered: {}", name);
        }
        self.types.insert(name, Arc::new(config));
    }

    pub fn get(&self, name: &str) -> Option<Arc<ProjectTypeConfig>> {
        self.types.get(name).map(Arc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
