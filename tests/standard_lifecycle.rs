//! End-to-end walk of the standard project type through the persistence
//! engine: create, block on guards, approve artifacts, advance, and verify
//! that each step survives a save/load cycle.

use helmsman::core::fs::{OsFs, WorkContext};
use helmsman::core::persist;
use helmsman::core::record::{MetadataValue, PhaseStatus, TaskStatus};
use helmsman::types;

#[test]
fn test_full_standard_lifecycle_with_persistence() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();
    let fs = OsFs;

    persist::create(&ctx, &fs, &registry, "standard/add-login", "login flow").unwrap();

    // Planning: advance refuses until the phase is completed AND the
    // task_list output is approved.
    let mut project = persist::load(&ctx, &fs, &registry).unwrap();
    let err = project.advance().unwrap_err();
    assert!(err.to_string().contains("not completed"));

    project.record.phase_mut("planning").unwrap().status = PhaseStatus::Completed;
    let err = project.advance().unwrap_err();
    assert!(err.to_string().contains("guard 'task-list-approved' rejected"));
    assert_eq!(project.state().as_str(), "PlanningActive");

    project
        .add_output("planning", "task_list", "plans/tasks.md")
        .unwrap();
    project.approve_output("planning", "task_list").unwrap();
    assert_eq!(project.advance().unwrap().as_str(), "CompletePlanning");
    persist::save(&ctx, &fs, &mut project).unwrap();

    // Reload mid-lifecycle: the persisted statechart is the machine's truth.
    let mut project = persist::load(&ctx, &fs, &registry).unwrap();
    assert_eq!(project.state().as_str(), "ImplementationActive");

    let id = project
        .add_task("implementation", "wire up session store", "implementer")
        .unwrap();
    assert_eq!(id, "010");
    project.record.task_mut("010").unwrap().status = TaskStatus::Completed;
    project.record.phase_mut("implementation").unwrap().status = PhaseStatus::Completed;
    assert_eq!(project.advance().unwrap().as_str(), "CompleteImplementation");
    persist::save(&ctx, &fs, &mut project).unwrap();

    // Review fails first: back to implementation with a bumped iteration.
    let mut project = persist::load(&ctx, &fs, &registry).unwrap();
    assert_eq!(project.state().as_str(), "ReviewActive");
    project.record.phase_mut("review").unwrap().metadata.insert(
        "assessment".to_string(),
        MetadataValue::String("fail".to_string()),
    );
    assert_eq!(project.advance().unwrap().as_str(), "RejectReview");
    assert_eq!(project.state().as_str(), "ImplementationActive");
    assert_eq!(project.record.phase("implementation").unwrap().iteration, 2);
    persist::save(&ctx, &fs, &mut project).unwrap();

    // Second pass through review succeeds.
    let mut project = persist::load(&ctx, &fs, &registry).unwrap();
    project.record.phase_mut("implementation").unwrap().status = PhaseStatus::Completed;
    assert_eq!(project.advance().unwrap().as_str(), "CompleteImplementation");
    {
        let review = project.record.phase_mut("review").unwrap();
        review.metadata.insert(
            "assessment".to_string(),
            MetadataValue::String("pass".to_string()),
        );
    }
    project
        .add_output("review", "review_report", "reviews/report.md")
        .unwrap();
    project.approve_output("review", "review_report").unwrap();
    assert_eq!(project.advance().unwrap().as_str(), "ApproveReview");
    assert_eq!(project.state().as_str(), "FinalizeActive");

    project.record.phase_mut("finalize").unwrap().status = PhaseStatus::Completed;
    assert_eq!(project.advance().unwrap().as_str(), "CompleteFinalize");
    assert_eq!(project.state().as_str(), "Done");
    persist::save(&ctx, &fs, &mut project).unwrap();

    let final_project = persist::load(&ctx, &fs, &registry).unwrap();
    assert_eq!(final_project.state().as_str(), "Done");
    assert_eq!(final_project.record.statechart.current_state, "Done");
}

#[test]
fn test_failed_advance_does_not_move_persisted_state() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();

    persist::create(&ctx, &OsFs, &registry, "standard/demo", "").unwrap();
    let mut project = persist::load(&ctx, &OsFs, &registry).unwrap();
    assert!(project.advance().is_err());
    persist::save(&ctx, &OsFs, &mut project).unwrap();

    let reloaded = persist::load(&ctx, &OsFs, &registry).unwrap();
    assert_eq!(reloaded.record.statechart.current_state, "PlanningActive");
}
