use std::fmt;
use tracing::warn;

/// A condition the pipeline recovered from without failing the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Filter key had the filter prefix but no integer id after it
    MalformedFilterKey { key: String },
    /// Filter key parsed but does not name a column of the table
    UnknownFilterColumn { key: String },
    /// Every requested value for a filter was empty
    EmptyFilterValues { key: String },
    /// Indicator-level post-filter was applied
    PostFilterApplied { column: String, values: Vec<String> },
    /// Post-filter named a column the table does not have
    UnknownPostFilterColumn { column: String },
    /// No rows left after filtering
    EmptyResult,
    /// Axis or value column could not be resolved; an empty chart was returned
    InsufficientFields { reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedFilterKey { key } => write!(f, "malformed filter key '{}'", key),
            Diagnostic::UnknownFilterColumn { key } => {
                write!(f, "filter '{}' does not name a column", key)
            }
            Diagnostic::EmptyFilterValues { key } => write!(f, "filter '{}' has no values", key),
            Diagnostic::PostFilterApplied { column, values } => {
                write!(f, "post-filter {}={:?} applied", column, values)
            }
            Diagnostic::UnknownPostFilterColumn { column } => {
                write!(f, "post-filter column '{}' not found", column)
            }
            Diagnostic::EmptyResult => write!(f, "filters removed every row"),
            Diagnostic::InsufficientFields { reason } => {
                write!(f, "insufficient fields: {}", reason)
            }
        }
    }
}

/// Side channel collecting recovered conditions for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(diagnostic = %diagnostic, "recovered");
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn contains(&self, diagnostic: &Diagnostic) -> bool {
        self.entries.contains(diagnostic)
    }
}
