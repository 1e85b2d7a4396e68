use std::fmt;

/// Machine-readable error codes surfaced by the engine and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    MergeValidation,
    EntityNotFound,
    InvalidLevel,
    ImportInvalid,
    StoreBusy,
    MergeFailed,
    MergeCancelled,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::MergeValidation => "E2001",
            Self::EntityNotFound => "E2002",
            Self::InvalidLevel => "E2003",
            Self::ImportInvalid => "E2004",
            Self::StoreBusy => "E5001",
            Self::MergeFailed => "E5002",
            Self::MergeCancelled => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Catalog not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::MergeValidation => "Not enough records selected",
            Self::EntityNotFound => "Record not found",
            Self::InvalidLevel => "Unknown hierarchy level",
            Self::ImportInvalid => "Invalid catalog document",
            Self::StoreBusy => "Catalog store busy",
            Self::MergeFailed => "Couldn't merge",
            Self::MergeCancelled => "Merge cancelled",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `cellar init` to create the catalog."),
            Self::ConfigParseError => Some("Fix syntax in .cellar/config.toml and retry."),
            Self::MergeValidation => {
                Some("Select the record to keep plus at least one other record.")
            }
            Self::EntityNotFound => Some("Refresh the list and select the records again."),
            Self::InvalidLevel => {
                Some("Use one of: country, region, appellation, sub-appellation, wine.")
            }
            Self::ImportInvalid => Some("Check the document structure and parent references."),
            Self::StoreBusy => Some("Retry after the other writer releases the catalog."),
            Self::MergeFailed => Some("Nothing was changed. Try again."),
            Self::MergeCancelled => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
