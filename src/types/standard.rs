//! The `standard` project type: planning → implementation → review →
//! finalize, with a review branch that either approves into finalize or
//! rejects back into implementation for another iteration.
//!
//! Determiners follow one pattern: the agent marks the active phase
//! `completed`, then `advance()` proposes the phase-completion event and the
//! guard checks the phase's exit criteria (e.g. an approved `task_list`
//! output before planning may complete). The review state is a branch
//! discriminated on the review phase's `assessment` metadata.

use std::sync::Arc;

use crate::core::config::{PhaseConfig, ProjectTypeConfig, ProjectTypeConfigBuilder};
use crate::core::error::HelmsmanError;
use crate::core::machine::{
    action_fn, guard_fn, Action, Branch, BranchArm, Discriminator, Event, Transition,
};
use crate::core::record::{PhaseState, PhaseStatus, ProjectRecord, TaskStatus};
use crate::core::time;
use crate::core::validate::{MetadataKind, MetadataSchema};

pub const TYPE_NAME: &str = "standard";

pub const STATE_PLANNING: &str = "PlanningActive";
pub const STATE_IMPLEMENTATION: &str = "ImplementationActive";
pub const STATE_REVIEW: &str = "ReviewActive";
pub const STATE_FINALIZE: &str = "FinalizeActive";
pub const STATE_DONE: &str = "Done";

pub const EVENT_COMPLETE_PLANNING: &str = "CompletePlanning";
pub const EVENT_COMPLETE_IMPLEMENTATION: &str = "CompleteImplementation";
pub const EVENT_APPROVE_REVIEW: &str = "ApproveReview";
pub const EVENT_REJECT_REVIEW: &str = "RejectReview";
pub const EVENT_COMPLETE_FINALIZE: &str = "CompleteFinalize";

pub const PHASES: &[&str] = &["planning", "implementation", "review", "finalize"];

/// Determiner shared by the linear states: propose the completion event once
/// the agent has marked the phase completed.
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

/// Marks a phase's completion timestamp on exit.
fn complete_phase_action(phase_name: &'static str) -> Arc<dyn Action> {
    action_fn(&format!("complete-{}", phase_name), move |record| {
        let phase = record.phase_mut(phase_name)?;
        phase.completed_at = Some(time::now_epoch_z());
        Ok(())
    })
}

/// Enables a phase and marks it in progress on entry.
fn start_phase_action(phase_name: &'static str) -> Arc<dyn Action> {
    action_fn(&format!("start-{}", phase_name), move |record| {
        let phase = record.phase_mut(phase_name)?;
        phase.enabled = true;
        phase.status = PhaseStatus::InProgress;
        phase.started_at = Some(time::now_epoch_z());
        Ok(())
    })
}

/// Re-entry after a failed review: bump the iteration before restarting.
fn rework_phase_action(phase_name: &'static str) -> Arc<dyn Action> {
    action_fn(&format!("rework-{}", phase_name), move |record| {
        let phase = record.phase_mut(phase_name)?;
        phase.iteration += 1;
        phase.enabled = true;
        phase.status = PhaseStatus::InProgress;
        phase.started_at = Some(time::now_epoch_z());
        phase.completed_at = None;
        Ok(())
    })
}

pub fn config() -> Result<ProjectTypeConfig, HelmsmanError> {
    ProjectTypeConfigBuilder::new(TYPE_NAME, STATE_PLANNING)
        .phase(
            PhaseConfig::new("planning")
                .input_type("requirements")
                .output_type("task_list")
                .output_type("plan")
                .metadata_schema(MetadataSchema::new().field("notes", MetadataKind::String)),
        )
        .phase(
            PhaseConfig::new("implementation")
                .input_type("task_list")
                .output_type("changeset"),
        )
        .phase(
            PhaseConfig::new("review")
                .input_type("changeset")
                .output_type("review_report")
                .metadata_schema(
                    MetadataSchema::new()
                        .field("assessment", MetadataKind::String)
                        .field("notes", MetadataKind::String)
                        .field("findings", MetadataKind::List),
                ),
        )
        .phase(
            PhaseConfig::new("finalize")
                .input_type("review_report")
                .output_type("release_notes"),
        )
        .transition(
            Transition::new(STATE_PLANNING, EVENT_COMPLETE_PLANNING, STATE_IMPLEMENTATION)
                .guard(guard_fn("task-list-approved", |record| {
                    record
                        .phase("planning")
                        .is_ok_and(|p| p.has_approved_output("task_list"))
                }))
                .on_exit(complete_phase_action("planning"))
                .on_entry(start_phase_action("implementation")),
        )
        .transition(
            Transition::new(
                STATE_IMPLEMENTATION,
                EVENT_COMPLETE_IMPLEMENTATION,
                STATE_REVIEW,
            )
            .guard(guard_fn("all-tasks-terminal", |record| {
                record.phase("implementation").is_ok_and(|p| {
                    p.tasks
                        .iter()
                        .all(|t| matches!(t.status, TaskStatus::Completed | TaskStatus::Abandoned))
                })
            }))
            .on_exit(complete_phase_action("implementation"))
            .on_entry(start_phase_action("review")),
        )
        .branch(Branch::new(
            STATE_REVIEW,
            Discriminator::new("review-assessment", |record| {
                record
                    .phase("review")?
                    .metadata
                    .get("assessment")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        HelmsmanError::TransitionError(
                            "review phase has no 'assessment' metadata recorded".to_string(),
                        )
                    })
            }),
            vec![
                BranchArm::new("pass", EVENT_APPROVE_REVIEW, STATE_FINALIZE)
                    .guard(guard_fn("review-report-approved", |record| {
                        record
                            .phase("review")
                            .is_ok_and(|p| p.has_approved_output("review_report"))
                    }))
                    .on_exit(complete_phase_action("review"))
                    .on_entry(start_phase_action("finalize")),
                BranchArm::new("fail", EVENT_REJECT_REVIEW, STATE_IMPLEMENTATION)
                    .on_exit(complete_phase_action("review"))
                    .on_entry(rework_phase_action("implementation")),
            ],
        ))
        .transition(
            Transition::new(STATE_FINALIZE, EVENT_COMPLETE_FINALIZE, STATE_DONE)
                .on_exit(complete_phase_action("finalize")),
        )
        .determiner(STATE_PLANNING, |record| {
            phase_completed_event(record, "planning", EVENT_COMPLETE_PLANNING)
        })
        .determiner(STATE_IMPLEMENTATION, |record| {
            phase_completed_event(record, "implementation", EVENT_COMPLETE_IMPLEMENTATION)
        })
        .determiner(STATE_FINALIZE, |record| {
            phase_completed_event(record, "finalize", EVENT_COMPLETE_FINALIZE)
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
