//! Tests for snapshot persistence across incremental runs.

use optlink::{
    BuildContext, DeclarationEvent, OptionType, ReferenceEvent, Settings, Snapshot,
};
use std::sync::Arc;
use tempfile::TempDir;

fn populated_context() -> BuildContext {
    let mut context = BuildContext::default();
    context.declare(
        DeclarationEvent::new(OptionType::Config, "CPL_DEBUG", "user/configoptions", 30)
            .with_choices(["ON", "OFF"])
            .with_default("OFF"),
    );
    context.declare(
        DeclarationEvent::new(OptionType::CreationOption, "COMPRESS", "drivers/gtiff", 12)
            .with_choices(["NONE", "LZW"])
            .with_since("3.1"),
    );
    context.reference(ReferenceEvent::new(OptionType::Config, "CPL_DEBUG", "user/guide"));
    context.set_document_title("user/guide", "User Guide");
    context.set_document_title("drivers/gtiff", "GTiff");
    context
}

#[test]
fn test_snapshot_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state/options.json");

    let context = populated_context();
    Snapshot::capture(&context).save(&path).unwrap();

    let restored = Snapshot::load(&path)
        .unwrap()
        .restore(Arc::new(Settings::default()))
        .unwrap();

    assert_eq!(restored.known_option_count(), 2);
    assert_eq!(restored.document_title("user/guide"), Some("User Guide"));
    assert_eq!(restored.build_index(None), context.build_index(None));
}

#[test]
fn test_restored_context_resolves_and_rebuilds() {
    let context = populated_context();
    let restored = Snapshot::capture(&context)
        .restore(Arc::new(Settings::default()))
        .unwrap();

    // Resolution re-runs from the restored reference log.
    let output = restored.resolve_pending();
    assert_eq!(output.stats.resolved, 1);

    // Incremental signals keep working after a restore.
    let mut restored = restored;
    restored.document_changed("drivers/gtiff");
    assert_eq!(restored.known_option_count(), 1);
}

#[test]
fn test_missing_snapshot_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.json");

    assert!(Snapshot::load(&path).is_err());
}

#[test]
fn test_snapshot_is_deterministic() {
    let a = Snapshot::capture(&populated_context());
    let b = Snapshot::capture(&populated_context());

    let a_json = serde_json::to_string(&a).unwrap();
    let b_json = serde_json::to_string(&b).unwrap();
    assert_eq!(a_json, b_json);
}
