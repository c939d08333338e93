//! Persisted data model for Helmsman projects.
//!
//! A `ProjectRecord` is the single source of truth for a project: it is read
//! in full, mutated in memory, and written back in full. Everything here is
//! schema-pure serde data; runtime behavior (attached configuration, live
//! machine) lives on the `Project` wrapper, not on these types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::collections;
use crate::core::error::HelmsmanError;
use crate::core::time;

/// Phase lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl PhaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Failed => "failed",
            PhaseStatus::Skipped => "skipped",
        }
    }
}

/// Task lifecycle status. Tasks are never deleted, only marked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Abandoned,
}

/// Open metadata value: string, number, bool, list, or map.
///
/// Accessors return `Option` rather than panicking on a kind mismatch, so
/// guard and action code can probe metadata safely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetadataValue]> {
        match self {
            MetadataValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, MetadataValue>> {
        match self {
            MetadataValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Kind name used in validation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            MetadataValue::String(_) => "string",
            MetadataValue::Number(_) => "number",
            MetadataValue::Bool(_) => "bool",
            MetadataValue::List(_) => "list",
            MetadataValue::Map(_) => "map",
        }
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// A file-backed input or output of a phase or task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactState {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub path: String,
    pub approved: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl ArtifactState {
    pub fn new(artifact_type: &str, path: &str) -> Self {
        ArtifactState {
            artifact_type: artifact_type.to_string(),
            path: path.to_string(),
            approved: false,
            created_at: time::now_epoch_z(),
            metadata: BTreeMap::new(),
        }
    }
}

/// A unit of work within a phase, gap-numbered for insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskState {
    pub id: String,
    pub name: String,
    pub phase: String,
    pub status: TaskStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub iteration: u32,
    pub assigned_agent: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ArtifactState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ArtifactState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl TaskState {
    pub fn new(id: &str, name: &str, phase: &str, assigned_agent: &str) -> Self {
        let now = time::now_epoch_z();
        TaskState {
            id: id.to_string(),
            name: name.to_string(),
            phase: phase.to_string(),
            status: TaskStatus::Pending,
            created_at: now.clone(),
            started_at: None,
            updated_at: now,
            completed_at: None,
            iteration: 1,
            assigned_agent: assigned_agent.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// A named stage of a project's lifecycle with its own status, artifacts,
/// and tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseState {
    pub status: PhaseStatus,
    pub enabled: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,
    pub iteration: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ArtifactState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ArtifactState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl PhaseState {
    /// A freshly initialized phase: pending, disabled, iteration 1.
    pub fn pending() -> Self {
        PhaseState {
            status: PhaseStatus::Pending,
            enabled: false,
            created_at: time::now_epoch_z(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            iteration: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            tasks: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// First output artifact of the given type, if any.
    pub fn output_of_type(&self, artifact_type: &str) -> Option<&ArtifactState> {
        self.outputs
            .iter()
            .find(|a| a.artifact_type == artifact_type)
    }

    /// True iff an output artifact of the given type exists and is approved.
    pub fn has_approved_output(&self, artifact_type: &str) -> bool {
        self.output_of_type(artifact_type)
            .is_some_and(|a| a.approved)
    }

    pub fn task(&self, id: &str) -> Result<&TaskState, HelmsmanError> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| HelmsmanError::NotFound(format!("task not found: {}", id)))
    }

    pub fn task_mut(&mut self, id: &str) -> Result<&mut TaskState, HelmsmanError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| HelmsmanError::NotFound(format!("task not found: {}", id)))
    }

    pub fn input(&self, index: i64) -> Result<&ArtifactState, HelmsmanError> {
        collections::indexed_get(&self.inputs, index)
    }

    pub fn output(&self, index: i64) -> Result<&ArtifactState, HelmsmanError> {
        collections::indexed_get(&self.outputs, index)
    }

    pub fn remove_input(&mut self, index: i64) -> Result<ArtifactState, HelmsmanError> {
        collections::indexed_remove(&mut self.inputs, index)
    }

    pub fn remove_output(&mut self, index: i64) -> Result<ArtifactState, HelmsmanError> {
        collections::indexed_remove(&mut self.outputs, index)
    }
}

/// Serialized mirror of the live machine's state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatechartState {
    pub current_state: String,
    pub updated_at: String,
}

/// Root persisted entity. One per project, one per state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub branch: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub phases: BTreeMap<String, PhaseState>,
    pub statechart: StatechartState,
}

impl ProjectRecord {
    pub fn new(
        name: &str,
        project_type: &str,
        branch: &str,
        description: &str,
        initial_state: &str,
    ) -> Self {
        let now = time::now_epoch_z();
        ProjectRecord {
            name: name.to_string(),
            project_type: project_type.to_string(),
            branch: branch.to_string(),
            description: description.to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
            phases: BTreeMap::new(),
            statechart: StatechartState {
                current_state: initial_state.to_string(),
                updated_at: now,
            },
        }
    }

    pub fn phase(&self, name: &str) -> Result<&PhaseState, HelmsmanError> {
        collections::keyed_get(&self.phases, "phase", name)
    }

    pub fn phase_mut(&mut self, name: &str) -> Result<&mut PhaseState, HelmsmanError> {
        collections::keyed_get_mut(&mut self.phases, "phase", name)
    }

    /// Looks up a task by id across every phase.
    pub fn task(&self, id: &str) -> Result<&TaskState, HelmsmanError> {
        self.phases
            .values()
            .flat_map(|p| p.tasks.iter())
            .find(|t| t.id == id)
            .ok_or_else(|| HelmsmanError::NotFound(format!("task not found: {}", id)))
    }

    pub fn task_mut(&mut self, id: &str) -> Result<&mut TaskState, HelmsmanError> {
        self.phases
            .values_mut()
            .flat_map(|p| p.tasks.iter_mut())
            .find(|t| t.id == id)
            .ok_or_else(|| HelmsmanError::NotFound(format!("task not found: {}", id)))
    }

    /// All task ids across phases, in no particular order.
    pub fn task_ids(&self) -> Vec<&str> {
        self.phases
            .values()
            .flat_map(|p| p.tasks.iter())
            .map(|t| t.id.as_str())
            .collect()
    }

    /// Next gap-numbered task id: highest existing id plus 10, 3 digits.
    /// Starts at "010" for an empty project.
    pub fn next_task_id(&self) -> String {
        let max = self
            .task_ids()
            .iter()
            .filter_map(|id| id.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{:03}", max + 10)
    }
}

/// Midpoint id between two gap-numbered ids, when a gap exists.
/// `task_id_between("010", "020")` is `Some("015")`; adjacent ids yield `None`.
pub fn task_id_between(low: &str, high: &str) -> Option<String> {
    let low_n = low.parse::<u32>().ok()?;
    let high_n = high.parse::<u32>().ok()?;
    if high_n <= low_n + 1 {
        return None;
    }
    Some(format!("{:03}", low_n + (high_n - low_n) / 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_tasks(ids: &[&str]) -> ProjectRecord {
        let mut record = ProjectRecord::new("demo", "standard", "standard/demo", "", "Start");
        let mut phase = PhaseState::pending();
        for id in ids {
            phase.tasks.push(TaskState::new(id, "t", "planning", ""));
        }
        record.phases.insert("planning".to_string(), phase);
        record
    }

    #[test]
    fn test_next_task_id_starts_at_010() {
        let record = record_with_tasks(&[]);
        assert_eq!(record.next_task_id(), "010");
    }

    #[test]
    fn test_next_task_id_steps_by_ten() {
        let record = record_with_tasks(&["010", "020"]);
        assert_eq!(record.next_task_id(), "030");
    }

    #[test]
    fn test_next_task_id_after_intermediate_insertion() {
        let record = record_with_tasks(&["010", "015", "020"]);
        assert_eq!(record.next_task_id(), "030");
    }

    #[test]
    fn test_task_id_between_finds_midpoint() {
        assert_eq!(task_id_between("010", "020"), Some("015".to_string()));
        assert_eq!(task_id_between("010", "012"), Some("011".to_string()));
    }

    #[test]
    fn test_task_id_between_exhausted_gap() {
        assert_eq!(task_id_between("010", "011"), None);
        assert_eq!(task_id_between("020", "010"), None);
    }

    #[test]
    fn test_task_lookup_across_phases() {
        let record = record_with_tasks(&["010"]);
        assert_eq!(record.task("010").unwrap().id, "010");
        let err = record.task("999").unwrap_err();
        assert!(err.to_string().contains("task not found: 999"));
    }

    #[test]
    fn test_phase_scoped_task_lookup() {
        let record = record_with_tasks(&["010"]);
        let phase = record.phase("planning").unwrap();
        assert_eq!(phase.task("010").unwrap().name, "t");
        assert!(phase.task("020").is_err());
    }

    #[test]
    fn test_metadata_value_accessors() {
        let v = MetadataValue::Bool(true);
        assert_eq!(v.as_bool(), Some(true));
        assert_eq!(v.as_str(), None);
        assert_eq!(v.as_number(), None);

        let v = MetadataValue::String("pass".to_string());
        assert_eq!(v.as_str(), Some("pass"));
        assert_eq!(v.as_bool(), None);
    }

    #[test]
    fn test_artifact_index_accessors() {
        let mut phase = PhaseState::pending();
        phase
            .outputs
            .push(ArtifactState::new("task_list", "plans/tasks.md"));
        assert_eq!(phase.output(0).unwrap().path, "plans/tasks.md");
        assert!(phase.output(1).is_err());
        assert!(phase.input(0).is_err());
        assert!(phase.remove_output(-1).is_err());
        assert_eq!(phase.outputs.len(), 1);
        phase.remove_output(0).unwrap();
        assert!(phase.outputs.is_empty());
    }

    #[test]
    fn test_approved_output_gate() {
        let mut phase = PhaseState::pending();
        assert!(!phase.has_approved_output("task_list"));
        phase
            .outputs
            .push(ArtifactState::new("task_list", "plans/tasks.md"));
        assert!(!phase.has_approved_output("task_list"));
        phase.outputs[0].approved = true;
        assert!(phase.has_approved_output("task_list"));
    }
}
