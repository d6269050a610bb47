//! Declared options and their rendered description fragments.
//!
//! A declaration carries free-form metadata (default value, enumerated
//! choices, introduced-in version, required flag) and produces the text
//! fragment a renderer embeds at the declaration site, e.g.
//! `**COMPRESS=[NONE/LZW/DEFLATE]**: (GDAL >= 3.1) Defaults to NONE.`

use crate::diagnostics::Diagnostic;
use crate::types::{CompactString, LinkTarget, OptionKey, OptionType, SourceLocation};
use serde::{Deserialize, Serialize};

/// Placeholder choice used when a declaration lists none.
pub const DEFAULT_CHOICE: &str = "value";

/// Free-form attributes attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionMetadata {
    pub default_value: Option<CompactString>,
    /// Never empty: normalizes to the single pseudo-choice `value`.
    pub choices: Vec<CompactString>,
    pub since_version: Option<CompactString>,
    pub required: bool,
}

impl Default for OptionMetadata {
    fn default() -> Self {
        Self {
            default_value: None,
            choices: vec![DEFAULT_CHOICE.into()],
            since_version: None,
            required: false,
        }
    }
}

impl OptionMetadata {
    pub fn with_default(mut self, value: impl Into<CompactString>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_choices(mut self, choices: impl IntoIterator<Item = impl Into<CompactString>>) -> Self {
        let choices: Vec<CompactString> = choices.into_iter().map(Into::into).collect();
        if !choices.is_empty() {
            self.choices = choices;
        }
        self
    }

    pub fn with_since(mut self, version: impl Into<CompactString>) -> Self {
        self.since_version = Some(version.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A single option declaration, owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDecl {
    pub option_type: OptionType,
    pub name: CompactString,
    pub location: SourceLocation,
    pub metadata: OptionMetadata,
}

impl OptionDecl {
    pub fn new(
        option_type: OptionType,
        name: impl Into<CompactString>,
        location: SourceLocation,
    ) -> Self {
        Self {
            option_type,
            name: name.into(),
            location,
            metadata: OptionMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: OptionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Identity key. The defining document is the declaration's location.
    pub fn key(&self) -> OptionKey {
        OptionKey::for_declaration(self.option_type, self.name.as_ref(), &self.location.document)
    }

    /// Anchor id within the defining document: `{type}-{name_lowercased}`.
    pub fn anchor_id(&self) -> String {
        format!("{}-{}", self.option_type.as_str(), self.name.to_lowercase())
    }

    /// Link destination for references to this declaration.
    pub fn link_target(&self) -> LinkTarget {
        LinkTarget::new(self.location.document.as_ref(), self.anchor_id())
    }

    /// Render the descriptive fragment for the declaration site.
    ///
    /// `project` names the product in the since caveat. `since_gate`, when
    /// set, suppresses the caveat for versions older than the gate; a
    /// malformed version on either side skips the gate check and keeps the
    /// caveat, recording a diagnostic.
    pub fn description(
        &self,
        project: &str,
        since_gate: Option<&str>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let mut text = format!("**{}", self.name);

        if self.metadata.choices.len() > 1 {
            text.push_str(&format!("=[{}]**: ", self.metadata.choices.join("/")));
        } else {
            let choice = self
                .metadata
                .choices
                .first()
                .map(AsRef::as_ref)
                .unwrap_or(DEFAULT_CHOICE);
            text.push_str(&format!("={choice}**: "));
        }

        if let Some(since) = &self.metadata.since_version {
            let include = match since_gate {
                None => true,
                Some(gate) => match version_at_least(since, gate) {
                    Some(at_least) => at_least,
                    None => {
                        diagnostics.push(Diagnostic::MalformedVersion {
                            value: since.clone(),
                            location: self.location.clone(),
                        });
                        true
                    }
                },
            };
            if include {
                text.push_str(&format!("({project} >= {since}) "));
            }
        }

        if self.metadata.required {
            text.push_str("(required) ");
        }

        if let Some(default) = &self.metadata.default_value {
            text.push_str(&format!("Defaults to {default}. "));
        }

        text
    }
}

/// Compare dotted version strings segment by segment.
///
/// Shorter versions are zero-padded, so `3.1` >= `3.1.0` holds both ways.
/// Returns `None` when either side has a non-numeric segment.
pub fn version_at_least(a: &str, b: &str) -> Option<bool> {
    let parse = |v: &str| -> Option<Vec<u64>> {
        v.split('.').map(|part| part.trim().parse::<u64>().ok()).collect()
    };

    let mut a_parts = parse(a)?;
    let mut b_parts = parse(b)?;

    while a_parts.len() < b_parts.len() {
        a_parts.push(0);
    }
    while b_parts.len() < a_parts.len() {
        b_parts.push(0);
    }

    for (a_seg, b_seg) in a_parts.iter().zip(&b_parts) {
        if a_seg < b_seg {
            return Some(false);
        }
        if a_seg > b_seg {
            return Some(true);
        }
    }

    Some(true)
}
