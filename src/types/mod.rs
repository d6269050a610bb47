use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compact owned string used throughout the index.
///
/// Document names and option names are stored once per entry and compared
/// often; `Box<str>` keeps them at pointer+length size without the spare
/// capacity of `String`.
pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

/// The kind of a declared option.
///
/// `Config` options are global: their names are unique across the whole
/// corpus. The four driver-level kinds are scoped: two documents may each
/// declare an option of the same name with different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionType {
    Config,
    CreationOption,
    DatasetCreationOption,
    LayerCreationOption,
    OpenOption,
}

impl OptionType {
    pub const ALL: [OptionType; 5] = [
        OptionType::Config,
        OptionType::CreationOption,
        OptionType::DatasetCreationOption,
        OptionType::LayerCreationOption,
        OptionType::OpenOption,
    ];

    /// Short spelling used in anchors and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Config => "config",
            OptionType::CreationOption => "co",
            OptionType::DatasetCreationOption => "dsco",
            OptionType::LayerCreationOption => "lco",
            OptionType::OpenOption => "oo",
        }
    }

    /// Whether option names of this type are unique across the corpus.
    pub fn is_global(&self) -> bool {
        matches!(self, OptionType::Config)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOptionType(pub String);

impl fmt::Display for UnknownOptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown option type: {}", self.0)
    }
}

impl std::error::Error for UnknownOptionType {}

impl FromStr for OptionType {
    type Err = UnknownOptionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "config" => Ok(OptionType::Config),
            "co" => Ok(OptionType::CreationOption),
            "dsco" => Ok(OptionType::DatasetCreationOption),
            "lco" => Ok(OptionType::LayerCreationOption),
            "oo" => Ok(OptionType::OpenOption),
            other => Err(UnknownOptionType(other.to_string())),
        }
    }
}

/// Where a declaration appeared: document name plus line number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub document: CompactString,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(document: impl Into<CompactString>, line: u32) -> Self {
        Self {
            document: document.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document, self.line)
    }
}

/// Identity of an option in the registry.
///
/// Global option types key on `(type, name)` alone; every other type keys on
/// `(document, type, name)` because its names are only unique within the
/// declaring document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKey {
    Global {
        option_type: OptionType,
        name: CompactString,
    },
    Scoped {
        document: CompactString,
        option_type: OptionType,
        name: CompactString,
    },
}

impl OptionKey {
    /// Key for a declaration appearing in `document`.
    pub fn for_declaration(
        option_type: OptionType,
        name: impl Into<CompactString>,
        document: &str,
    ) -> Self {
        if option_type.is_global() {
            OptionKey::Global {
                option_type,
                name: name.into(),
            }
        } else {
            OptionKey::Scoped {
                document: document.into(),
                option_type,
                name: name.into(),
            }
        }
    }

    /// Key a reference in `document` resolves against.
    ///
    /// Scoped references bind to the referencing document's own scope, so
    /// the construction is identical to a declaration key in that document.
    pub fn for_reference(
        option_type: OptionType,
        name: impl Into<CompactString>,
        document: &str,
    ) -> Self {
        Self::for_declaration(option_type, name, document)
    }

    pub fn option_type(&self) -> OptionType {
        match self {
            OptionKey::Global { option_type, .. } | OptionKey::Scoped { option_type, .. } => {
                *option_type
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            OptionKey::Global { name, .. } | OptionKey::Scoped { name, .. } => name,
        }
    }

    /// The scoping document, if this key is document-scoped.
    pub fn scope(&self) -> Option<&str> {
        match self {
            OptionKey::Global { .. } => None,
            OptionKey::Scoped { document, .. } => Some(document),
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKey::Global { option_type, name } => write!(f, "{option_type}:{name}"),
            OptionKey::Scoped {
                document,
                option_type,
                name,
            } => write!(f, "{document}:{option_type}:{name}"),
        }
    }
}

/// Resolved link destination: a document plus an anchor within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub document: CompactString,
    pub anchor: CompactString,
}

impl LinkTarget {
    pub fn new(document: impl Into<CompactString>, anchor: impl Into<CompactString>) -> Self {
        Self {
            document: document.into(),
            anchor: anchor.into(),
        }
    }

    /// `document#anchor` form for renderers that want a ready-made fragment URI.
    pub fn as_uri(&self) -> String {
        format!("{}#{}", self.document, self.anchor)
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.anchor)
    }
}
