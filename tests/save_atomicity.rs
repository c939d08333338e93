use std::fs;
use std::io;
use std::path::Path;

use helmsman::core::error::HelmsmanError;
use helmsman::core::fs::{OsFs, StateFs, WorkContext};
use helmsman::core::persist;
use helmsman::core::record::MetadataValue;
use helmsman::types;

/// Delegates to the real filesystem but fails every rename, simulating a
/// crash at the publish step.
struct FailingRenameFs {
    inner: OsFs,
}

impl StateFs for FailingRenameFs {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_file(path, bytes)
    }

    fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Err(io::Error::other("simulated rename failure"))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.inner.remove(path)
    }

    fn stat(&self, path: &Path) -> io::Result<fs::Metadata> {
        self.inner.stat(path)
    }
}

#[test]
fn test_failed_validation_leaves_disk_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();

    persist::create(&ctx, &OsFs, &registry, "standard/demo", "").unwrap();
    let before = fs::read(tmp.path().join("state.yaml")).unwrap();

    let mut project = persist::load(&ctx, &OsFs, &registry).unwrap();
    // The implementation phase has no metadata schema, so this record can no
    // longer pass save-time validation.
    project
        .record
        .phase_mut("implementation")
        .unwrap()
        .metadata
        .insert("rogue".to_string(), MetadataValue::Bool(true));

    let err = persist::save(&ctx, &OsFs, &mut project).unwrap_err();
    assert!(matches!(err, HelmsmanError::MetadataError(_)));

    let after = fs::read(tmp.path().join("state.yaml")).unwrap();
    assert_eq!(before, after, "on-disk bytes must be byte-for-byte identical");
    assert!(
        !tmp.path().join("state.yaml.tmp").exists(),
        "no temp file may remain"
    );
}

#[test]
fn test_failed_rename_removes_temp_and_keeps_original() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();

    persist::create(&ctx, &OsFs, &registry, "standard/demo", "").unwrap();
    let before = fs::read(tmp.path().join("state.yaml")).unwrap();

    let failing = FailingRenameFs { inner: OsFs };
    let mut project = persist::load(&ctx, &OsFs, &registry).unwrap();
    project.record.description = "changed in memory".to_string();

    let err = persist::save(&ctx, &failing, &mut project).unwrap_err();
    assert!(err.to_string().contains("failed to rename state file"));

    let after = fs::read(tmp.path().join("state.yaml")).unwrap();
    assert_eq!(before, after);
    assert!(!tmp.path().join("state.yaml.tmp").exists());
}

#[test]
fn test_successful_save_leaves_no_temp() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();

    let mut project = persist::create(&ctx, &OsFs, &registry, "standard/demo", "").unwrap();
    project.record.description = "updated".to_string();
    persist::save(&ctx, &OsFs, &mut project).unwrap();

    assert!(!tmp.path().join("state.yaml.tmp").exists());
    let reloaded = persist::load(&ctx, &OsFs, &registry).unwrap();
    assert_eq!(reloaded.record.description, "updated");
}

#[test]
fn test_structural_failure_aborts_before_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = WorkContext::new(tmp.path());
    let registry = types::builtin_registry();

    persist::create(&ctx, &OsFs, &registry, "standard/demo", "").unwrap();
    let before = fs::read(tmp.path().join("state.yaml")).unwrap();

    let mut project = persist::load(&ctx, &OsFs, &registry).unwrap();
    project.record.name = "Not Kebab".to_string();
    let err = persist::save(&ctx, &OsFs, &mut project).unwrap_err();
    assert!(matches!(err, HelmsmanError::ValidationError(_)));

    let after = fs::read(tmp.path().join("state.yaml")).unwrap();
    assert_eq!(before, after);
    assert!(!tmp.path().join("state.yaml.tmp").exists());
}
