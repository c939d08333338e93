//! Helmsman: persistent, validated state machines for multi-agent projects.
//!
//! **Helmsman tracks multi-phase, multi-agent software projects as
//! crash-safe state files.**
//!
//! A project moves through typed phases (planning, implementation, review,
//! finalize) and spawns tasks within them; every transition is guarded,
//! auditable, and survives arbitrary interruption, because the state file is
//! the sole source of truth for resuming work.
//!
//! # Core Principles
//!
//! - **Local-first**: the whole project state is one file, read in full and
//!   replaced atomically
//! - **Always valid on disk**: validation completes before any byte is
//!   written; the rename is the only operation that publishes a new version
//! - **Declarative transitions**: project types describe states, events,
//!   guards, branches, and entry/exit actions; the engine just executes them
//! - **No silent fallbacks**: missing files, unknown project types, and
//!   unmapped branch values are hard errors
//!
//! # Architecture
//!
//! - [`core::record`] holds the schema-pure persisted model; runtime
//!   behavior (attached configuration, the live machine) lives on
//!   [`core::project::Project`]
//! - [`core::machine`] is the transition graph; [`core::config`] and
//!   [`core::registry`] parameterize it per project type
//! - [`core::persist`] is the load/save/create cycle over the
//!   [`core::fs::StateFs`] abstraction
//! - [`types`] carries the stock project types (`standard`, `exploration`)
//!
//! # Example
//!
//! ```no_run
//! use helmsman::core::fs::{OsFs, WorkContext};
//! use helmsman::core::persist;
//! use helmsman::types;
//!
//! let registry = types::builtin_registry();
//! let ctx = WorkContext::new(".");
//! let fs = OsFs;
//!
//! let mut project = persist::load(&ctx, &fs, &registry)?;
//! let event = project.advance()?;
//! persist::save(&ctx, &fs, &mut project)?;
//! println!("fired {} -> {}", event, project.state());
//! # Ok::<(), helmsman::core::error::HelmsmanError>(())
//! ```

pub mod core;
pub mod types;
