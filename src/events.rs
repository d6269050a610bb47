//! Events consumed from the surrounding document pipeline.
//!
//! The host parses inline markup; the core only sees well-formed events.
//! Attribute values arrive as the raw strings the host extracted, so
//! normalization (choice lists, the required flag) happens here.

use crate::declaration::{OptionDecl, OptionMetadata};
use crate::diagnostics::Diagnostic;
use crate::types::{CompactString, OptionType, SourceLocation};

/// An option declared at one location in a document.
#[derive(Debug, Clone)]
pub struct DeclarationEvent {
    pub option_type: OptionType,
    pub name: String,
    pub document: String,
    pub line: u32,
    pub since: Option<String>,
    pub default: Option<String>,
    pub choices: Vec<String>,
    /// Raw attribute value. `None` means the attribute was absent;
    /// `Some("")` is the bare-flag spelling and means required.
    pub required: Option<String>,
}

impl DeclarationEvent {
    pub fn new(
        option_type: OptionType,
        name: impl Into<String>,
        document: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            option_type,
            name: name.into(),
            document: document.into(),
            line,
            since: None,
            default: None,
            choices: Vec::new(),
            required: None,
        }
    }

    pub fn with_since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_choices(mut self, choices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required(mut self, required: impl Into<String>) -> Self {
        self.required = Some(required.into());
        self
    }

    /// Normalize into an [`OptionDecl`], recording diagnostics for
    /// attribute values that had to be coerced.
    pub fn into_decl(self, diagnostics: &mut Vec<Diagnostic>) -> OptionDecl {
        let location = SourceLocation::new(self.document.as_str(), self.line);

        let required = match self.required.as_deref() {
            None => false,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                // Bare flag spelling counts as required.
                "" | "yes" | "true" | "1" => true,
                "no" | "false" | "0" => false,
                _ => {
                    diagnostics.push(Diagnostic::UnrecognizedRequired {
                        value: value.into(),
                        location: location.clone(),
                    });
                    false
                }
            },
        };

        let mut metadata = OptionMetadata {
            required,
            ..OptionMetadata::default()
        };
        if !self.choices.is_empty() {
            metadata.choices = self
                .choices
                .iter()
                .map(|c| CompactString::from(c.trim()))
                .collect();
        }
        if let Some(default) = self.default {
            metadata.default_value = Some(default.into());
        }
        if let Some(since) = self.since {
            metadata.since_version = Some(since.into());
        }

        OptionDecl::new(self.option_type, self.name.as_str(), location).with_metadata(metadata)
    }
}

/// An in-text mention of an option.
#[derive(Debug, Clone)]
pub struct ReferenceEvent {
    pub option_type: OptionType,
    pub name: String,
    pub document: String,
}

impl ReferenceEvent {
    pub fn new(
        option_type: OptionType,
        name: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        Self {
            option_type,
            name: name.into(),
            document: document.into(),
        }
    }
}

/// Everything a document's parse can emit, in document order.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    Declaration(DeclarationEvent),
    Reference(ReferenceEvent),
}

impl From<DeclarationEvent> for DocumentEvent {
    fn from(event: DeclarationEvent) -> Self {
        DocumentEvent::Declaration(event)
    }
}

impl From<ReferenceEvent> for DocumentEvent {
    fn from(event: ReferenceEvent) -> Self {
        DocumentEvent::Reference(event)
    }
}
