//! The live project wrapper: one schema-pure record plus the runtime pieces
//! that never touch disk (attached type configuration and the positioned
//! machine).
//!
//! Mutations happen through the accessors here and through direct record
//! edits; `advance` is the only operation that moves the statechart.

use std::sync::Arc;

use crate::core::config::ProjectTypeConfig;
use crate::core::error::HelmsmanError;
use crate::core::machine::{Event, Machine, State};
use crate::core::record::{ArtifactState, ProjectRecord, TaskState};
use crate::core::time;

pub struct Project {
    pub record: ProjectRecord,
    config: Arc<ProjectTypeConfig>,
    machine: Machine,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl Project {
    /// Wires a record to its type configuration, rebuilding the machine at
    /// the record's persisted state verbatim (no re-derivation).
    pub fn attach(
        record: ProjectRecord,
        config: Arc<ProjectTypeConfig>,
    ) -> Result<Self, HelmsmanError> {
        let machine = config.build_machine(&record.statechart.current_state)?;
        Ok(Project {
            record,
            config,
            machine,
        })
    }

    pub fn state(&self) -> &State {
        self.machine.state()
    }

    pub fn config(&self) -> &Arc<ProjectTypeConfig> {
        &self.config
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Copies the machine's live state and timestamp back into the record.
    /// Called by `save` before validation so the persisted statechart always
    /// mirrors the machine.
    pub fn sync_statechart(&mut self) {
        self.record.statechart.current_state = self.machine.state().as_str().to_string();
        self.record.statechart.updated_at = time::now_epoch_z();
    }

    /// Automatic advancement: asks the type's event determiner for the
    /// current state which event applies, then fires it through the machine
    /// (guard check, exit action, state change, entry action). Returns the
    /// fired event.
    pub fn advance(&mut self) -> Result<Event, HelmsmanError> {
        let state = self.machine.state().clone();
        let determiner = self.config.determiner_for(&state).ok_or_else(|| {
            HelmsmanError::TransitionError(format!(
                "no event determiner configured for state '{}'",
                state
            ))
        })?;
        let event = determiner(&self.record)?;
        self.machine.fire(&event, &mut self.record)?;
        Ok(event)
    }

    /// Appends a gap-numbered task to a phase. The id is the next multiple
    /// of ten after the highest existing id, project-wide.
    pub fn add_task(
        &mut self,
        phase_name: &str,
        name: &str,
        assigned_agent: &str,
    ) -> Result<String, HelmsmanError> {
        let id = self.record.next_task_id();
        self.add_task_with_id(phase_name, &id, name, assigned_agent)?;
        Ok(id)
    }

    /// Appends a task with an explicit id, for inserting between existing
    /// gap numbers ("015" between "010" and "020"). Ids are unique within
    /// the project.
    pub fn add_task_with_id(
        &mut self,
        phase_name: &str,
        id: &str,
        name: &str,
        assigned_agent: &str,
    ) -> Result<(), HelmsmanError> {
        if self.record.task(id).is_ok() {
            return Err(HelmsmanError::ValidationError(format!(
                "task id '{}' already exists",
                id
            )));
        }
        let task = TaskState::new(id, name, phase_name, assigned_agent);
        let phase = self.record.phase_mut(phase_name)?;
        phase.tasks.push(task);
        Ok(())
    }

    /// Appends an output artifact to a phase, checked against the type's
    /// allow-list up front so the violation surfaces at the call site rather
    /// than at save.
    pub fn add_output(
        &mut self,
        phase_name: &str,
        artifact_type: &str,
        path: &str,
    ) -> Result<(), HelmsmanError> {
        let config = self.config.phase_config(phase_name).ok_or_else(|| {
            HelmsmanError::NotFound(format!("phase not found: {}", phase_name))
        })?;
        if !config.output_types.iter().any(|t| t == artifact_type) {
            return Err(HelmsmanError::ValidationError(format!(
                "phase '{}': output artifact type '{}' is not allowed (allowed: {:?})",
                phase_name, artifact_type, config.output_types
            )));
        }
        let phase = self.record.phase_mut(phase_name)?;
        phase.outputs.push(ArtifactState::new(artifact_type, path));
        Ok(())
    }

    pub fn add_input(
        &mut self,
        phase_name: &str,
        artifact_type: &str,
        path: &str,
    ) -> Result<(), HelmsmanError> {
        let config = self.config.phase_config(phase_name).ok_or_else(|| {
            HelmsmanError::NotFound(format!("phase not found: {}", phase_name))
        })?;
        if !config.input_types.iter().any(|t| t == artifact_type) {
            return Err(HelmsmanError::ValidationError(format!(
                "phase '{}': input artifact type '{}' is not allowed (allowed: {:?})",
                phase_name, artifact_type, config.input_types
            )));
        }
        let phase = self.record.phase_mut(phase_name)?;
        phase.inputs.push(ArtifactState::new(artifact_type, path));
        Ok(())
    }

    /// Marks the first output artifact of the given type approved.
    pub fn approve_output(
        &mut self,
        phase_name: &str,
        artifact_type: &str,
    ) -> Result<(), HelmsmanError> {
        let phase = self.record.phase_mut(phase_name)?;
        let artifact = phase
            .outputs
            .iter_mut()
            .find(|a| a.artifact_type == artifact_type)
            .ok_or_else(|| {
                HelmsmanError::NotFound(format!(
                    "artifact not found: {} (phase '{}')",
                    artifact_type, phase_name
                ))
            })?;
        artifact.approved = true;
        Ok(())
    }
}
