//! Two-tier schema validation for project records.
//!
//! Tier one is structural: required fields, identifier regexes, enum
//! membership, numeric bounds, and project-wide task id uniqueness. It runs
//! on both load and save, is a pure function of the record, and fails
//! all-or-nothing with a message naming the offending field and constraint.
//!
//! Tier two is per-phase metadata: each project type may supply a
//! `MetadataSchema` per phase. Metadata checks run on save only, so schema
//! evolution never breaks loading of historical state; they do prevent
//! saving state that has drifted from the current schema. A phase with
//! non-empty metadata and no configured schema is rejected — the engine does
//! not silently accept unknown shapes.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use crate::core::error::HelmsmanError;
use crate::core::record::{Metadata, MetadataValue, ProjectRecord, TaskState};

/// Kebab-case identifier: lowercase, digits, hyphens, no leading hyphen.
static KEBAB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("kebab identifier regex"));

/// Gap-numbered task id: exactly three digits.
static TASK_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3}$").expect("task id regex"));

/// Agent roles a task may be assigned to. Empty means unassigned.
pub const AGENT_ROLES: &[&str] = &["planner", "implementer", "reviewer", "finalizer"];

/// Expected shape of one metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    String,
    Number,
    Bool,
    List,
    Map,
    Any,
}

impl MetadataKind {
    fn matches(self, value: &MetadataValue) -> bool {
        match self {
            MetadataKind::String => matches!(value, MetadataValue::String(_)),
            MetadataKind::Number => matches!(value, MetadataValue::Number(_)),
            MetadataKind::Bool => matches!(value, MetadataValue::Bool(_)),
            MetadataKind::List => matches!(value, MetadataValue::List(_)),
            MetadataKind::Map => matches!(value, MetadataValue::Map(_)),
            MetadataKind::Any => true,
        }
    }

    fn name(self) -> &'static str {
        match self {
            MetadataKind::String => "string",
            MetadataKind::Number => "number",
            MetadataKind::Bool => "bool",
            MetadataKind::List => "list",
            MetadataKind::Map => "map",
            MetadataKind::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub kind: MetadataKind,
    pub required: bool,
}

/// Per-phase metadata schema: an allow-list of keys with expected kinds.
/// An empty schema permits only empty metadata.
#[derive(Debug, Clone, Default)]
pub struct MetadataSchema {
    fields: BTreeMap<String, FieldSpec>,
}

impl MetadataSchema {
    pub fn new() -> Self {
        MetadataSchema::default()
    }

    pub fn field(mut self, name: &str, kind: MetadataKind) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldSpec {
                kind,
                required: false,
            },
        );
        self
    }

    pub fn required_field(mut self, name: &str, kind: MetadataKind) -> Self {
        self.fields
            .insert(name.to_string(), FieldSpec { kind, required: true });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub fn is_kebab_case(s: &str) -> bool {
    KEBAB_RE.is_match(s)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), HelmsmanError> {
    if value.is_empty() {
        return Err(HelmsmanError::ValidationError(format!(
            "field '{}' must not be empty",
            field
        )));
    }
    Ok(())
}

fn require_kebab(field: &str, value: &str) -> Result<(), HelmsmanError> {
    require_non_empty(field, value)?;
    if !is_kebab_case(value) {
        return Err(HelmsmanError::ValidationError(format!(
            "field '{}' must be a kebab-case identifier, got '{}'",
            field, value
        )));
    }
    Ok(())
}

fn validate_task(phase_name: &str, task: &TaskState) -> Result<(), HelmsmanError> {
    if !TASK_ID_RE.is_match(&task.id) {
        return Err(HelmsmanError::ValidationError(format!(
            "phase '{}': task id '{}' must be a 3-digit gap-numbered string",
            phase_name, task.id
        )));
    }
    require_non_empty(&format!("phase '{}' task '{}' name", phase_name, task.id), &task.name)?;
    if task.phase != phase_name {
        return Err(HelmsmanError::ValidationError(format!(
            "task '{}' declares phase '{}' but lives in phase '{}'",
            task.id, task.phase, phase_name
        )));
    }
    if task.iteration < 1 {
        return Err(HelmsmanError::ValidationError(format!(
            "task '{}': iteration must be >= 1, got {}",
            task.id, task.iteration
        )));
    }
    if !task.assigned_agent.is_empty() && !AGENT_ROLES.contains(&task.assigned_agent.as_str()) {
        return Err(HelmsmanError::ValidationError(format!(
            "task '{}': assigned_agent '{}' is not a recognized agent role",
            task.id, task.assigned_agent
        )));
    }
    require_non_empty(&format!("task '{}' created_at", task.id), &task.created_at)?;
    require_non_empty(&format!("task '{}' updated_at", task.id), &task.updated_at)?;
    Ok(())
}

/// Structural validation: the universal schema every record must satisfy,
/// independent of project type. Pure; calling it twice yields the same
/// result.
pub fn validate_structure(record: &ProjectRecord) -> Result<(), HelmsmanError> {
    require_kebab("name", &record.name)?;
    require_kebab("type", &record.project_type)?;
    require_non_empty("branch", &record.branch)?;
    require_non_empty("created_at", &record.created_at)?;
    require_non_empty("updated_at", &record.updated_at)?;
    require_non_empty("statechart.current_state", &record.statechart.current_state)?;
    require_non_empty("statechart.updated_at", &record.statechart.updated_at)?;

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (phase_name, phase) in &record.phases {
        require_kebab("phase name", phase_name)?;
        if phase.iteration < 1 {
            return Err(HelmsmanError::ValidationError(format!(
                "phase '{}': iteration must be >= 1, got {}",
                phase_name, phase.iteration
            )));
        }
        require_non_empty(&format!("phase '{}' created_at", phase_name), &phase.created_at)?;
        for artifact in phase.inputs.iter().chain(phase.outputs.iter()) {
            require_non_empty(
                &format!("phase '{}' artifact type", phase_name),
                &artifact.artifact_type,
            )?;
            require_non_empty(
                &format!("phase '{}' artifact path", phase_name),
                &artifact.path,
            )?;
        }
        for task in &phase.tasks {
            validate_task(phase_name, task)?;
            if !seen_ids.insert(task.id.as_str()) {
                return Err(HelmsmanError::ValidationError(format!(
                    "duplicate task id '{}' (task ids are unique within a project)",
                    task.id
                )));
            }
        }
    }
    Ok(())
}

/// Metadata validation for one phase's metadata map against its configured
/// schema. `None` (no schema configured) rejects any non-empty metadata.
pub fn validate_metadata(
    phase_name: &str,
    metadata: &Metadata,
    schema: Option<&MetadataSchema>,
) -> Result<(), HelmsmanError> {
    if metadata.is_empty() {
        return Ok(());
    }
    let schema = match schema {
        Some(s) if !s.is_empty() => s,
        _ => {
            return Err(HelmsmanError::MetadataError(format!(
                "phase '{}': metadata present but no metadata schema is configured",
                phase_name
            )));
        }
    };
    for (key, value) in metadata {
        match schema.fields.get(key) {
            None => {
                return Err(HelmsmanError::MetadataError(format!(
                    "phase '{}': metadata key '{}' is not declared in the schema",
                    phase_name, key
                )));
            }
            Some(spec) if !spec.kind.matches(value) => {
                return Err(HelmsmanError::MetadataError(format!(
                    "phase '{}': metadata key '{}' expects {}, got {}",
                    phase_name,
                    key,
                    spec.kind.name(),
                    value.kind_name()
                )));
            }
            Some(_) => {}
        }
    }
    for (key, spec) in &schema.fields {
        if spec.required && !metadata.contains_key(key) {
            return Err(HelmsmanError::MetadataError(format!(
                "phase '{}': required metadata key '{}' is missing",
                phase_name, key
            )));
        }
    }
    Ok(())
}
