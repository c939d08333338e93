//! Core modules for Helmsman's state machine and persistence engine.
//!
//! Everything a caller needs flows through here: the persisted data model,
//! the validation pipeline, the transition graph, project-type
//! configuration, and the atomic load/save cycle.

pub mod collections;
pub mod config;
pub mod error;
pub mod fs;
pub mod machine;
pub mod output;
pub mod persist;
pub mod project;
pub mod record;
pub mod registry;
pub mod time;
pub mod validate;
