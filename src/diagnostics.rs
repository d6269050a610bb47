//! Non-fatal build diagnostics.
//!
//! Nothing in the registry or resolver aborts a build: every failure
//! degrades to rendering without the feature plus one of these values,
//! directed at the document/location responsible.

use crate::types::{CompactString, OptionKey, OptionType, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Two declarations at the same identity key with differing fields.
    /// The first-registered entry is kept.
    DuplicateOption {
        key: OptionKey,
        kept: SourceLocation,
        rejected: SourceLocation,
    },
    /// A reference that found no declaration after the whole corpus was
    /// merged. `known_options` is the registry size at resolution time.
    UnresolvedReference {
        option_type: OptionType,
        name: CompactString,
        document: CompactString,
        known_options: usize,
    },
    /// `since_version` did not parse as dotted integers; the version gate
    /// was skipped for this declaration.
    MalformedVersion {
        value: CompactString,
        location: SourceLocation,
    },
    /// The `required` attribute had an unrecognized spelling and was
    /// treated as false.
    UnrecognizedRequired {
        value: CompactString,
        location: SourceLocation,
    },
}

impl Diagnostic {
    /// Emit through tracing at warn level.
    pub fn emit(&self) {
        tracing::warn!(target: "optlink", "{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateOption {
                key,
                kept,
                rejected,
            } => write!(
                f,
                "duplicate declaration of {key} at {rejected}: keeping earlier declaration at {kept}"
            ),
            Diagnostic::UnresolvedReference {
                option_type,
                name,
                document,
                known_options,
            } => write!(
                f,
                "unresolved reference to {option_type} option {name} in {document} ({known_options} options known)"
            ),
            Diagnostic::MalformedVersion { value, location } => write!(
                f,
                "malformed version {value:?} at {location}: version gate skipped"
            ),
            Diagnostic::UnrecognizedRequired { value, location } => write!(
                f,
                "unrecognized required value {value:?} at {location}: treated as not required"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_both_locations() {
        let diag = Diagnostic::DuplicateOption {
            key: OptionKey::for_declaration(OptionType::Config, "CPL_DEBUG", "a"),
            kept: SourceLocation::new("a", 10),
            rejected: SourceLocation::new("c", 5),
        };
        let text = diag.to_string();
        assert!(text.contains("a:10"));
        assert!(text.contains("c:5"));
    }

    #[test]
    fn test_unresolved_mentions_known_count() {
        let diag = Diagnostic::UnresolvedReference {
            option_type: OptionType::Config,
            name: "MISSING".into(),
            document: "guide".into(),
            known_options: 17,
        };
        assert!(diag.to_string().contains("17 options known"));
    }
}
