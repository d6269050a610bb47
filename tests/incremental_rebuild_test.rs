//! Tests for incremental rebuild behavior: purge-then-redo semantics.

use optlink::{
    BuildContext, DeclarationEvent, OptionKey, OptionType, ReferenceEvent,
};

fn declare(context: &mut BuildContext, doc: &str, name: &str, line: u32, default: &str) -> String {
    context.declare(
        DeclarationEvent::new(OptionType::Config, name, doc, line).with_default(default),
    )
}

#[test]
fn test_reprocessing_a_document_replaces_its_options() {
    let mut context = BuildContext::default();
    declare(&mut context, "a", "X", 10, "1");
    declare(&mut context, "a", "Y", 20, "2");
    assert_eq!(context.known_option_count(), 2);

    // The document changed: Y was removed and X moved.
    context.document_changed("a");
    declare(&mut context, "a", "X", 14, "1");

    assert_eq!(context.known_option_count(), 1);
    assert!(context.diagnostics().is_empty(), "fresh re-registration must not conflict");

    let key = OptionKey::for_declaration(OptionType::Config, "X", "a");
    assert_eq!(context.registry().lookup(&key).unwrap().location.line, 14);
}

#[test]
fn test_purge_is_isolated_per_document() {
    let mut context = BuildContext::default();

    // Two documents each declare a scoped option of the same name.
    context.declare(DeclarationEvent::new(
        OptionType::CreationOption,
        "COMPRESS",
        "gtiff",
        12,
    ));
    context.declare(DeclarationEvent::new(
        OptionType::CreationOption,
        "COMPRESS",
        "png",
        8,
    ));
    context.reference(ReferenceEvent::new(OptionType::CreationOption, "COMPRESS", "gtiff"));
    context.reference(ReferenceEvent::new(OptionType::CreationOption, "COMPRESS", "png"));

    // No conflict: scoped names are independent per document.
    assert_eq!(context.known_option_count(), 2);
    assert!(context.diagnostics().is_empty());

    context.document_changed("gtiff");

    let png_key = OptionKey::for_declaration(OptionType::CreationOption, "COMPRESS", "png");
    let png = context.registry().lookup(&png_key).unwrap();
    assert_eq!(png.location.line, 8);
    assert_eq!(context.known_option_count(), 1);
    assert_eq!(context.pending_count(), 1);
}

#[test]
fn test_references_follow_their_documents_purge() {
    let mut context = BuildContext::default();
    declare(&mut context, "a", "X", 10, "1");
    context.reference(ReferenceEvent::new(OptionType::Config, "X", "b"));
    context.reference(ReferenceEvent::new(OptionType::Config, "X", "c"));

    // Document b dropped its mention on reparse.
    context.document_changed("b");

    let output = context.resolve_pending();
    assert_eq!(output.stats.total, 1);
    assert_eq!(output.references[0].reference.document.as_ref(), "c");

    let key = OptionKey::for_reference(OptionType::Config, "X", "c");
    let docs: Vec<&str> = context.references().documents_for(&key).collect();
    assert_eq!(docs, vec!["c"]);
}

#[test]
fn test_document_removed_purges_title_too() {
    let mut context = BuildContext::default();
    declare(&mut context, "gone", "X", 1, "1");
    context.set_document_title("gone", "Gone");

    context.document_removed("gone");

    assert_eq!(context.known_option_count(), 0);
    assert_eq!(context.document_title("gone"), None);
}

#[test]
fn test_reset_clears_everything() {
    let mut context = BuildContext::default();
    declare(&mut context, "a", "X", 10, "1");
    declare(&mut context, "c", "X", 5, "2"); // conflict diagnostic
    context.reference(ReferenceEvent::new(OptionType::Config, "X", "b"));

    context.reset();

    assert_eq!(context.known_option_count(), 0);
    assert_eq!(context.pending_count(), 0);
    assert!(context.diagnostics().is_empty());
    assert!(context.build_index(None).is_empty());
}
