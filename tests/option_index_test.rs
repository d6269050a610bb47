//! Tests for index generation and the end-to-end conflict scenario.

use optlink::{
    BuildContext, DeclarationEvent, Diagnostic, OptionType, ReferenceEvent, SourceLocation,
};

/// Document `A` declares global option `X` (default 1) at line 10; document
/// `B` references `X`; document `C` later declares `X` (default 2) at line
/// 5. The registry keeps A's declaration, C's loss is diagnosed with both
/// locations, and the index entry for `X` links to A with referencing
/// documents {A, B}.
#[test]
fn test_conflicting_redeclaration_scenario() {
    let mut context = BuildContext::default();

    context.declare(DeclarationEvent::new(OptionType::Config, "X", "A", 10).with_default("1"));
    context.reference(ReferenceEvent::new(OptionType::Config, "X", "B"));
    context.reference(ReferenceEvent::new(OptionType::Config, "X", "A"));
    context.declare(DeclarationEvent::new(OptionType::Config, "X", "C", 5).with_default("2"));

    // Registry holds A's declaration.
    let winner = context
        .registry()
        .lookup(&optlink::OptionKey::for_declaration(OptionType::Config, "X", "A"))
        .unwrap();
    assert_eq!(winner.metadata.default_value.as_deref(), Some("1"));
    assert_eq!(winner.location, SourceLocation::new("A", 10));

    // Exactly one conflict, naming both locations.
    let conflicts: Vec<&Diagnostic> = context
        .diagnostics()
        .iter()
        .filter(|d| matches!(d, Diagnostic::DuplicateOption { .. }))
        .collect();
    assert_eq!(conflicts.len(), 1);
    match conflicts[0] {
        Diagnostic::DuplicateOption { kept, rejected, .. } => {
            assert_eq!(*kept, SourceLocation::new("A", 10));
            assert_eq!(*rejected, SourceLocation::new("C", 5));
        }
        _ => unreachable!(),
    }

    // The index entry links to A; C is not a referencer.
    let entries = context.build_index(None);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.target.as_uri(), "A#config-x");
    let docs: Vec<&str> = entry.references.iter().map(|l| l.document.as_ref()).collect();
    assert_eq!(docs, vec!["A", "B"]);
}

#[test]
fn test_every_declared_option_appears_once() {
    let mut context = BuildContext::default();

    context.declare(DeclarationEvent::new(OptionType::Config, "CPL_DEBUG", "config", 1));
    context.declare(DeclarationEvent::new(
        OptionType::CreationOption,
        "COMPRESS",
        "gtiff",
        2,
    ));
    context.declare(DeclarationEvent::new(
        OptionType::OpenOption,
        "NUM_THREADS",
        "gtiff",
        3,
    ));

    let entries = context.build_index(None);
    assert_eq!(entries.len(), 3);

    // Unreferenced options still list their defining document.
    for entry in &entries {
        assert!(!entry.references.is_empty());
        assert!(
            entry
                .references
                .iter()
                .any(|link| link.document == entry.target.document)
        );
    }
}

#[test]
fn test_type_filter_and_unknown_type() {
    let mut context = BuildContext::default();
    context.declare(DeclarationEvent::new(
        OptionType::CreationOption,
        "COMPRESS",
        "gtiff",
        2,
    ));

    let creation = context.build_index(Some(&[OptionType::CreationOption]));
    assert_eq!(creation.len(), 1);

    // Nothing declared for the requested type: empty, no diagnostics.
    let layer = context.build_index(Some(&[OptionType::LayerCreationOption]));
    assert!(layer.is_empty());
    assert!(context.diagnostics().is_empty());
}

#[test]
fn test_reference_dedup_within_document() {
    let mut context = BuildContext::default();
    context.declare(DeclarationEvent::new(OptionType::Config, "X", "a", 1));

    // Three mentions in one document: three placeholders, one index link.
    for _ in 0..3 {
        context.reference(ReferenceEvent::new(OptionType::Config, "X", "guide"));
    }

    assert_eq!(context.pending_count(), 3);

    let entries = context.build_index(None);
    let docs: Vec<&str> = entries[0].references.iter().map(|l| l.document.as_ref()).collect();
    assert_eq!(docs, vec!["a", "guide"]);
}

#[test]
fn test_titles_drive_reference_ordering() {
    let mut context = BuildContext::default();
    context.declare(DeclarationEvent::new(OptionType::Config, "X", "m_doc", 1));
    context.reference(ReferenceEvent::new(OptionType::Config, "X", "z_doc"));
    context.reference(ReferenceEvent::new(OptionType::Config, "X", "a_doc"));

    context.set_document_title("z_doc", "Aardvark");
    context.set_document_title("a_doc", "Zebra");
    context.set_document_title("m_doc", "Middle");

    let entries = context.build_index(None);
    let docs: Vec<&str> = entries[0].references.iter().map(|l| l.document.as_ref()).collect();
    // Ordered by title: Aardvark, Middle, Zebra.
    assert_eq!(docs, vec!["z_doc", "m_doc", "a_doc"]);
}

#[test]
fn test_scoped_references_resolve_within_their_document() {
    let mut context = BuildContext::default();
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

    let in_gtiff = context.reference(ReferenceEvent::new(
        OptionType::CreationOption,
        "COMPRESS",
        "gtiff",
    ));
    let in_webp = context.reference(ReferenceEvent::new(
        OptionType::CreationOption,
        "COMPRESS",
        "webp",
    ));

    let output = context.resolve_pending();
    assert_eq!(output.stats.resolved, 1);
    assert_eq!(output.stats.unresolved, 1);

    assert_eq!(
        context.resolve(&in_gtiff).link_target().unwrap().as_uri(),
        "gtiff#co-compress"
    );
    // webp never declared its own COMPRESS: scoped lookups do not leak
    // across documents.
    assert!(!context.resolve(&in_webp).is_resolved());
}
