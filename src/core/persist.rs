//! Persistence engine: the atomic load/save cycle that keeps on-disk state
//! always valid.
//!
//! Load is deserialize → validate → attach; save is sync → validate →
//! serialize → write-to-temp → atomic rename. Validation always completes
//! before any byte reaches disk, and the rename is the only operation that
//! makes a new version visible, so a reader never observes a half-written
//! state file. There is no cross-process lock; one writer per checkout is
//! the surrounding system's convention.

use std::io;
use std::path::{Path, PathBuf};

use crate::core::error::HelmsmanError;
use crate::core::fs::{StateFs, WorkContext};
use crate::core::project::Project;
use crate::core::record::ProjectRecord;
use crate::core::registry::Registry;
use crate::core::time;
use crate::core::validate;

/// State file name under the working root.
pub const STATE_FILE: &str = "state.yaml";

/// Transient sibling used during save.
pub const STATE_TMP_FILE: &str = "state.yaml.tmp";

pub fn state_path(ctx: &WorkContext) -> PathBuf {
    ctx.root().join(STATE_FILE)
}

pub fn state_tmp_path(ctx: &WorkContext) -> PathBuf {
    ctx.root().join(STATE_TMP_FILE)
}

fn io_stage(stage: &str, path: &Path, err: io::Error) -> HelmsmanError {
    HelmsmanError::IoError(io::Error::new(
        err.kind(),
        format!("{} {}: {}", stage, path.display(), err),
    ))
}

/// Loads the project from the working root's state file.
///
/// A missing file is a hard error (no implicit empty project), as is an
/// unknown project type (the engine never falls back to a default). The
/// machine is positioned at the persisted state verbatim. Metadata schema
/// checks are skipped on load so schema evolution cannot brick historical
/// state; structural and artifact-type checks still run.
pub fn load(
    ctx: &WorkContext,
    fs: &dyn StateFs,
    registry: &Registry,
) -> Result<Project, HelmsmanError> {
    let path = state_path(ctx);
    let bytes = fs
        .read_file(&path)
        .map_err(|e| io_stage("failed to read state file", &path, e))?;

    let record: ProjectRecord = serde_yaml::from_slice(&bytes).map_err(|e| {
        HelmsmanError::SerializationError(format!(
            "failed to parse state file {}: {}",
            path.display(),
            e
        ))
    })?;

    validate::validate_structure(&record)?;

    let config = registry
        .get(&record.project_type)
        .ok_or_else(|| HelmsmanError::UnknownProjectType(record.project_type.clone()))?;

    config.validate_record(&record, false)?;
    Project::attach(record, config)
}

/// Saves the project back to the state file.
///
/// The live machine state is mirrored into the record and `updated_at` is
/// bumped before validation; any validation failure aborts with the on-disk
/// file untouched. The serialized bytes go to a `.tmp` sibling which is then
/// renamed over the real path; a failed rename removes the temp file and
/// returns the error.
pub fn save(ctx: &WorkContext, fs: &dyn StateFs, project: &mut Project) -> Result<(), HelmsmanError> {
    project.sync_statechart();
    project.record.updated_at = time::now_epoch_z();

    validate::validate_structure(&project.record)?;
    project.config().validate_record(&project.record, true)?;

    let bytes = serde_yaml::to_string(&project.record)
        .map_err(|e| HelmsmanError::SerializationError(format!("failed to serialize state: {}", e)))?
        .into_bytes();

    let tmp = state_tmp_path(ctx);
    let path = state_path(ctx);
    fs.write_file(&tmp, &bytes)
        .map_err(|e| io_stage("failed to write temp state file", &tmp, e))?;
    if let Err(e) = fs.rename(&tmp, &path) {
        // Leave no transient sibling behind; the original file is intact.
        let _ = fs.remove(&tmp);
        return Err(io_stage("failed to rename state file into place", &path, e));
    }
    Ok(())
}

/// Derives `(project_type, name)` from a branch name.
///
/// Convention: `<type>/<rest>` where `<type>` is a registered project type;
/// anything else maps to `standard` with the whole branch as the name seed.
/// The name seed is sanitized to a kebab-case identifier.
pub fn derive_type_and_name(registry: &Registry, branch: &str) -> (String, String) {
    if let Some((prefix, rest)) = branch.split_once('/') {
        if registry.contains(prefix) && !rest.is_empty() {
            return (prefix.to_string(), kebabify(rest));
        }
    }
    ("standard".to_string(), kebabify(branch))
}

/// Lowercases and collapses anything outside `[a-z0-9]` into single hyphens,
/// with no leading or trailing hyphen.
pub fn kebabify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Creates a new project and performs its first save.
///
/// The record starts with an empty phase map; the type's initializer
/// populates the initial phase set before the machine is built at the
/// configured initial state. Creating over an existing state file is an
/// error.
pub fn create(
    ctx: &WorkContext,
    fs: &dyn StateFs,
    registry: &Registry,
    branch: &str,
    description: &str,
) -> Result<Project, HelmsmanError> {
    let path = state_path(ctx);
    if fs.stat(&path).is_ok() {
        return Err(HelmsmanError::ValidationError(format!(
            "state file already exists: {}",
            path.display()
        )));
    }

    let (type_name, name) = derive_type_and_name(registry, branch);
    let config = registry
        .get(&type_name)
        .ok_or_else(|| HelmsmanError::UnknownProjectType(type_name.clone()))?;

    let mut record = ProjectRecord::new(
        &name,
        &type_name,
        branch,
        description,
        config.initial_state().as_str(),
    );
    config.initialize(&mut record)?;

    let mut project = Project::attach(record, config)?;
    save(ctx, fs, &mut project)?;
    Ok(project)
}
