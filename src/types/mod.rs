//! Built-in project-type configurations, registered at process start.
//!
//! A project type bundles everything that parameterizes the engine for one
//! kind of project: phases and their artifact allow-lists, the transition
//! graph, the per-state event determiners, and the record initializer.

pub mod exploration;
pub mod standard;

use crate::core::registry::Registry;

/// Registry with the stock project types wired in. Configuration errors
/// here are programmer errors caught at boot, hence the panics.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(standard::config().expect("standard project type configuration"));
    registry.register(exploration::config().expect("exploration project type configuration"));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_stock_types() {
        let registry = builtin_registry();
        assert_eq!(registry.type_names(), vec!["exploration", "standard"]);
    }
}
