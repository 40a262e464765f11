use infraguard_types::{ErrorKind, FatalError, Location};
use thiserror::Error;

/// Structural errors raised while building or resolving a graph. All of them are fatal for
/// a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("parse error{}: {message}", at(.location))]
    Parse {
        message: String,
        location: Option<Location>,
    },

    #[error("duplicate {kind} `{address}`{} (first declared{})", at(.second), at(.first))]
    Duplicate {
        kind: &'static str,
        address: String,
        first: Option<Location>,
        second: Option<Location>,
    },

    #[error("`{from}` references undeclared `{target}`{}", at(.location))]
    Reference {
        from: String,
        target: String,
        location: Option<Location>,
    },

    #[error("cannot resolve `{reference}`: {reason}")]
    UnresolvedReference { reference: String, reason: String },

    #[error("variable `{name}` has no value and no default{}", at(.location))]
    MissingVariable {
        name: String,
        location: Option<Location>,
    },

    #[error("variable `{name}` expects {expected}, got {found}{}", at(.location))]
    VariableType {
        name: String,
        expected: String,
        found: String,
        location: Option<Location>,
    },
}

fn at(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" at {loc}"),
        None => String::new(),
    }
}

impl GraphError {
    pub(crate) fn parse(message: impl Into<String>, location: Option<Location>) -> Self {
        GraphError::Parse {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn duplicate(
        kind: &'static str,
        address: String,
        first: &Option<Location>,
        second: &Option<Location>,
    ) -> Self {
        GraphError::Duplicate {
            kind,
            address,
            first: first.clone(),
            second: second.clone(),
        }
    }

    pub(crate) fn unresolved(reference: impl ToString, reason: impl Into<String>) -> Self {
        GraphError::UnresolvedReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::Parse { .. } => ErrorKind::Parse,
            GraphError::Duplicate { .. } => ErrorKind::Duplicate,
            GraphError::Reference { .. } => ErrorKind::Reference,
            GraphError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            GraphError::MissingVariable { .. } => ErrorKind::MissingVariable,
            GraphError::VariableType { .. } => ErrorKind::VariableType,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            GraphError::Parse { location, .. }
            | GraphError::Reference { location, .. }
            | GraphError::MissingVariable { location, .. }
            | GraphError::VariableType { location, .. } => location.as_ref(),
            GraphError::Duplicate { second, .. } => second.as_ref(),
            GraphError::UnresolvedReference { .. } => None,
        }
    }

    /// Report form of this error.
    pub fn to_fatal(&self) -> FatalError {
        FatalError {
            kind: self.kind(),
            message: self.to_string(),
            location: self.location().cloned(),
        }
    }
}
