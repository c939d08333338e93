//! Metadata schema checks run on save, never on load: state persisted under
//! an older schema must keep loading, but must not be saved unchanged once
//! it no longer satisfies the current schema.

use helmsman::core::error::HelmsmanError;
use helmsman::core::fs::{OsFs, WorkContext};
use helmsman::core::persist;
use helmsman::core::record::MetadataValue;
use helmsman::types;

fn seed_with_rogue_metadata(root: &std::path::Path) {
    let ctx = WorkContext::new(root);
    let registry = types::builtin_registry();
    persist::create(&ctx, &OsFs, &registry, "standard/demo", "").unwrap();

    // Rewrite the file by hand, bypassing save-time validation, as if an
    // older schema had allowed implementation-phase metadata.
    let raw = std::fs::read_to_string(root.join("state.yaml")).unwrap();
    let mut record: helmsman::core::record::ProjectRecord = serde_yaml::from_str(&raw).unwrap();
    record
        .phase_mut("implementation")
        .unwrap()
        .metadata
        .insert("legacy_flag".to_string(), MetadataValue::Bool(true));
    std::fs::write(root.join("state.yaml"), serde_yaml::to_string(&record).unwrap()).unwrap();
}

#[test]
fn test_historical_metadata_still_loads() {
    let tmp = tempfile::tempdir().unwrap();
    seed_with_rogue_metadata(tmp.path());

    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();
    let project = persist::load(&ctx, &OsFs, &registry).unwrap();
    assert!(
        project
            .record
            .phase("implementation")
            .unwrap()
            .metadata
            .contains_key("legacy_flag")
    );
}

#[test]
fn test_drifted_metadata_cannot_be_saved() {
    let tmp = tempfile::tempdir().unwrap();
    seed_with_rogue_metadata(tmp.path());

    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();
    let mut project = persist::load(&ctx, &OsFs, &registry).unwrap();

    let err = persist::save(&ctx, &OsFs, &mut project).unwrap_err();
    assert!(matches!(err, HelmsmanError::MetadataError(_)));
    assert!(err.to_string().contains("implementation"));
}

#[test]
fn test_clearing_drifted_metadata_allows_save() {
    let tmp = tempfile::tempdir().unwrap();
    seed_with_rogue_metadata(tmp.path());

    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();
    let mut project = persist::load(&ctx, &OsFs, &registry).unwrap();
    project
        .record
        .phase_mut("implementation")
        .unwrap()
        .metadata
        .clear();
    persist::save(&ctx, &OsFs, &mut project).unwrap();
}

#[test]
fn test_schema_conformant_metadata_saves() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();

    let mut project = persist::create(&ctx, &OsFs, &registry, "standard/demo", "").unwrap();
    // The review phase schema declares 'assessment' as a string.
    project.record.phase_mut("review").unwrap().metadata.insert(
        "assessment".to_string(),
        MetadataValue::String("pass".to_string()),
    );
    persist::save(&ctx, &OsFs, &mut project).unwrap();

    let reloaded = persist::load(&ctx, &OsFs, &registry).unwrap();
    assert_eq!(
        reloaded
            .record
            .phase("review")
            .unwrap()
            .metadata
            .get("assessment")
            .and_then(|v| v.as_str()),
        Some("pass")
    );
}
