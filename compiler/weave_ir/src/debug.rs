//! Debug location and debug level types.

use std::fmt;

use crate::ids::ScopeId;

/// A source position inside a debug scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DebugLoc {
    /// 1-based line in the synthetic source.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    /// Innermost lexical scope.
    pub scope: ScopeId,
}

/// Debug information detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugLevel {
    /// No debug information.
    None,
    /// Line tables only (file/line/column, no variables).
    LineTablesOnly,
    /// Full debug information (types, variables, scopes).
    #[default]
    Full,
}

impl DebugLevel {
    /// Check if debug info should be generated.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether local variables should be described.
    #[must_use]
    pub fn has_variables(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Parse the spelling used on the command line and in the environment.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" | "0" => Some(Self::None),
            "line-tables" | "1" => Some(Self::LineTablesOnly),
            "full" | "2" => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::LineTablesOnly => write!(f, "line-tables"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// What kind of debug scope a `ScopeId` denotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// The synthetic source file (root of every scope chain).
    File,
    /// A function's subprogram scope.
    Function { name: String },
    /// A lexical block nested in another scope.
    Lexical,
}
