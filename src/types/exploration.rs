//! The `exploration` project type: a lightweight linear lifecycle for
//! spikes and investigations. Two phases (exploration, summary), no review
//! branch.

use std::sync::Arc;

use crate::core::config::{PhaseConfig, ProjectTypeConfig, ProjectTypeConfigBuilder};
use crate::core::error::HelmsmanError;
use crate::core::machine::{action_fn, guard_fn, Action, Event, Transition};
use crate::core::record::{PhaseState, PhaseStatus, ProjectRecord};
use crate::core::time;
use crate::core::validate::{MetadataKind, MetadataSchema};

pub const TYPE_NAME: &str = "exploration";

pub const STATE_EXPLORATION: &str = "ExplorationActive";
pub const STATE_SUMMARY: &str = "SummaryActive";
pub const STATE_DONE: &str = "Done";

pub const EVENT_COMPLETE_EXPLORATION: &str = "CompleteExploration";
pub const EVENT_COMPLETE_SUMMARY: &str = "CompleteSummary";

pub const PHASES: &[&str] = &["exploration", "summary"];

fn phase_completed_event(
    record: &ProjectRecord,
    phase_name: &str,
    event: &str,
) -> Result<Event, HelmsmanError> {
    let phase = record.phase(phase_name)?;
    if phase.status == PhaseStatus::Completed {
        Ok(Event::new(event))
    } else {
        Err(HelmsmanError::TransitionError(format!(
            "phase '{}' is not completed (status: {})",
            phase_name,
            phase.status.as_str()
        )))
    }
}

fn complete_phase_action(phase_name: &'static str) -> Arc<dyn Action> {
    action_fn(&format!("complete-{}", phase_name), move |record| {
        let phase = record.phase_mut(phase_name)?;
        phase.completed_at = Some(time::now_epoch_z());
        Ok(())
    })
}

fn start_phase_action(phase_name: &'static str) -> Arc<dyn Action> {
    action_fn(&format!("start-{}", phase_name), move |record| {
        let phase = record.phase_mut(phase_name)?;
        phase.enabled = true;
        phase.status = PhaseStatus::InProgress;
        phase.started_at = Some(time::now_epoch_z());
        Ok(())
    })
}

pub fn config() -> Result<ProjectTypeConfig, HelmsmanError> {
    ProjectTypeConfigBuilder::new(TYPE_NAME, STATE_EXPLORATION)
        .phase(
            PhaseConfig::new("exploration")
                .input_type("question")
                .output_type("findings")
                .metadata_schema(
                    MetadataSchema::new()
                        .field("hypothesis", MetadataKind::String)
                        .field("abandoned_threads", MetadataKind::List),
                ),
        )
        .phase(
            PhaseConfig::new("summary")
                .input_type("findings")
                .output_type("summary"),
        )
        .transition(
            Transition::new(STATE_EXPLORATION, EVENT_COMPLETE_EXPLORATION, STATE_SUMMARY)
                .guard(guard_fn("findings-approved", |record| {
                    record
                        .phase("exploration")
                        .is_ok_and(|p| p.has_approved_output("findings"))
                }))
                .on_exit(complete_phase_action("exploration"))
                .on_entry(start_phase_action("summary")),
        )
        .transition(
            Transition::new(STATE_SUMMARY, EVENT_COMPLETE_SUMMARY, STATE_DONE)
                .on_exit(complete_phase_action("summary")),
        )
        .determiner(STATE_EXPLORATION, |record| {
            phase_completed_event(record, "exploration", EVENT_COMPLETE_EXPLORATION)
        })
        .determiner(STATE_SUMMARY, |record| {
            phase_completed_event(record, "summary", EVENT_COMPLETE_SUMMARY)
        })
        .initializer(|record| {
            for phase_name in PHASES {
                record
                    .phases
                    .insert((*phase_name).to_string(), PhaseState::pending());
            }
            Ok(())
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::Project;
    use crate::core::record::ArtifactState;

    fn fresh_project() -> Project {
        let config = Arc::new(config().unwrap());
        let mut record = ProjectRecord::new(
            "spike",
            TYPE_NAME,
            "exploration/spike",
            "",
            STATE_EXPLORATION,
        );
        config.initialize(&mut record).unwrap();
        Project::attach(record, config).unwrap()
    }

    #[test]
    fn test_linear_lifecycle() {
        let mut p = fresh_project();
        {
            let phase = p.record.phase_mut("exploration").unwrap();
            phase.status = PhaseStatus::Completed;
            let mut findings = ArtifactState::new("findings", "notes/findings.md");
            findings.approved = true;
            phase.outputs.push(findings);
        }
        assert_eq!(p.advance().unwrap().as_str(), EVENT_COMPLETE_EXPLORATION);
        assert_eq!(p.state().as_str(), STATE_SUMMARY);

        p.record.phase_mut("summary").unwrap().status = PhaseStatus::Completed;
        assert_eq!(p.advance().unwrap().as_str(), EVENT_COMPLETE_SUMMARY);
        assert_eq!(p.state().as_str(), STATE_DONE);
    }

    #[test]
    fn test_unapproved_findings_block_exit() {
        let mut p = fresh_project();
        p.record.phase_mut("exploration").unwrap().status = PhaseStatus::Completed;
        let err = p.advance().unwrap_err();
        assert!(err.to_string().contains("guard 'findings-approved' rejected"));
        assert_eq!(p.state().as_str(), STATE_EXPLORATION);
    }
}
