//! Project-type configuration: the bundle that parameterizes the state
//! machine per project kind.
//!
//! A configuration carries the initial state, per-phase artifact allow-lists
//! and metadata schemas, the transition graph (with branches expanded into
//! ordinary transitions), a per-state event determiner, and the initializer
//! that populates a fresh record's phase set.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::HelmsmanError;
use crate::core::machine::{Branch, Event, Machine, State, Transition, TransitionTable};
use crate::core::record::ProjectRecord;
use crate::core::validate::{self, MetadataSchema};

/// Per-phase configuration: allowed artifact types and optional metadata
/// schema.
#[derive(Debug, Clone, Default)]
pub struct PhaseConfig {
    pub name: String,
    pub input_types: Vec<String>,
    pub output_types: Vec<String>,
    pub metadata_schema: Option<MetadataSchema>,
}

impl PhaseConfig {
    pub fn new(name: &str) -> Self {
        PhaseConfig {
            name: name.to_string(),
            ..PhaseConfig::default()
        }
    }

    pub fn input_type(mut self, artifact_type: &str) -> Self {
        self.input_types.push(artifact_type.to_string());
        self
    }

    pub fn output_type(mut self, artifact_type: &str) -> Self {
        self.output_types.push(artifact_type.to_string());
        self
    }

    pub fn metadata_schema(mut self, schema: MetadataSchema) -> Self {
        self.metadata_schema = Some(schema);
        self
    }
}

/// Per-state function proposing the next event during automatic advancement.
pub type EventDeterminer =
    Arc<dyn Fn(&ProjectRecord) -> Result<Event, HelmsmanError> + Send + Sync>;

/// Populates the initial phase set when a project is first created.
pub type Initializer = Arc<dyn Fn(&mut ProjectRecord) -> Result<(), HelmsmanError> + Send + Sync>;

pub struct ProjectTypeConfig {
    name: String,
    initial_state: State,
    phase_configs: Vec<PhaseConfig>,
    table: Arc<TransitionTable>,
    determiners: HashMap<State, EventDeterminer>,
    initializer: Initializer,
}

impl ProjectTypeConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    pub fn phase_configs(&self) -> &[PhaseConfig] {
        &self.phase_configs
    }

    pub fn phase_config(&self, name: &str) -> Option<&PhaseConfig> {
        self.phase_configs.iter().find(|p| p.name == name)
    }

    pub fn determiner_for(&self, state: &State) -> Option<&EventDeterminer> {
        self.determiners.get(state)
    }

    /// Runs the type's initializer against a fresh record.
    pub fn initialize(&self, record: &mut ProjectRecord) -> Result<(), HelmsmanError> {
        (self.initializer)(record)
    }

    /// Constructs a machine positioned at `current_state`, which must be
    /// reachable from the configured initial state.
    pub fn build_machine(&self, current_state: &str) -> Result<Machine, HelmsmanError> {
        let state = State::new(current_state);
        let reachable = self.table.reachable_states(&self.initial_state);
        if !reachable.contains(&state) {
            return Err(HelmsmanError::ValidationError(format!(
                "state '{}' is not reachable from initial state '{}' for project type '{}'",
                current_state, self.initial_state, self.name
            )));
        }
        Ok(Machine::new(state, Arc::clone(&self.table)))
    }

    /// Phase-scoped checks across every phase present in the record: phases
    /// unknown to the configuration error, artifact types must be in the
    /// phase allow-lists, and (with `check_metadata`) metadata must satisfy
    /// the phase schema. Phases declared in the configuration but absent
    /// from the record are skipped, supporting incremental activation.
    pub fn validate_record(
        &self,
        record: &ProjectRecord,
        check_metadata: bool,
    ) -> Result<(), HelmsmanError> {
        for (phase_name, phase) in &record.phases {
            let config = self.phase_config(phase_name).ok_or_else(|| {
                HelmsmanError::ValidationError(format!(
                    "phase '{}' is not defined for project type '{}'",
                    phase_name, self.name
                ))
            })?;
            for artifact in &phase.inputs {
                if !config.input_types.contains(&artifact.artifact_type) {
                    return Err(HelmsmanError::ValidationError(format!(
                        "phase '{}': input artifact type '{}' is not allowed (allowed: {:?})",
                        phase_name, artifact.artifact_type, config.input_types
                    )));
                }
            }
            for artifact in &phase.outputs {
                if !config.output_types.contains(&artifact.artifact_type) {
                    return Err(HelmsmanError::ValidationError(format!(
                        "phase '{}': output artifact type '{}' is not allowed (allowed: {:?})",
                        phase_name, artifact.artifact_type, config.output_types
                    )));
                }
            }
            if check_metadata {
                validate::validate_metadata(
                    phase_name,
                    &phase.metadata,
                    config.metadata_schema.as_ref(),
                )?;
            }
        }
        Ok(())
    }
}

/// Builder for `ProjectTypeConfig`. `build` fails on duplicate transitions
/// or a determiner collision; both are configuration errors caught at boot.
pub struct ProjectTypeConfigBuilder {
    name: String,
    initial_state: State,
    phase_configs: Vec<PhaseConfig>,
    transitions: Vec<Transition>,
    determiners: HashMap<State, EventDeterminer>,
    initializer: Option<Initializer>,
    error: Option<HelmsmanError>,
}

impl ProjectTypeConfigBuilder {
    pub fn new(name: &str, initial_state: &str) -> Self {
        ProjectTypeConfigBuilder {
            name: name.to_string(),
            initial_state: State::new(initial_state),
            phase_configs: Vec::new(),
            transitions: Vec::new(),
            determiners: HashMap::new(),
            initializer: None,
            error: None,
        }
    }

    pub fn phase(mut self, config: PhaseConfig) -> Self {
        self.phase_configs.push(config);
        self
    }

    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Adds a branch: its arms expand into ordinary transitions and its
    /// discriminator becomes the automatic determiner for the branch state.
    pub fn branch(mut self, branch: Branch) -> Self {
        self.transitions.extend(branch.expand());
        let from = branch.from.clone();
        let determiner: EventDeterminer = Arc::new(move |record| branch.determine(record));
        if self.determiners.insert(from.clone(), determiner).is_some() && self.error.is_none() {
            self.error = Some(HelmsmanError::ValidationError(format!(
                "determiner already defined for state '{}'",
                from
            )));
        }
        self
    }

    pub fn determiner<F>(mut self, state: &str, f: F) -> Self
    where
        F: Fn(&ProjectRecord) -> Result<Event, HelmsmanError> + Send + Sync + 'static,
    {
        let state = State::new(state);
        if self
            .determiners
            .insert(state.clone(), Arc::new(f))
            .is_some()
            && self.error.is_none()
        {
            self.error = Some(HelmsmanError::ValidationError(format!(
                "determiner already defined for state '{}'",
                state
            )));
        }
        self
    }

    pub fn initializer<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ProjectRecord) -> Result<(), HelmsmanError> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<ProjectTypeConfig, HelmsmanError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let table = TransitionTable::build(self.transitions)?;
        let initializer = self.initializer.unwrap_or_else(|| Arc::new(|_| Ok(())));
        Ok(ProjectTypeConfig {
            name: self.name,
            initial_state: self.initial_state,
            phase_configs: self.phase_configs,
            table: Arc::new(table),
            determiners: self.determiners,
            initializer,
        })
    }
}
