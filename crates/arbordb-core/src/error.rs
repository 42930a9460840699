use derive_more::Display;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Internal errors indicate a defect; they are never retried and carry the
/// offending cardinality/state in the message.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a computer-origin invariant violation.
    pub(crate) fn computer_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Computer,
            message,
        )
    }

    /// Construct a sorter-origin invariant violation.
    pub(crate) fn sorter_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Sorter, message)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    #[display("internal")]
    Internal,
    #[display("invariant_violation")]
    InvariantViolation,
    #[display("unsupported")]
    Unsupported,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    #[display("computer")]
    Computer,
    #[display("index")]
    Index,
    #[display("producer")]
    Producer,
    #[display("sorter")]
    Sorter,
}

///
/// QueryError
/// Usage errors: the caller can recover by correcting the query.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("hierarchy constraint `{constraint}` cannot be opened inside an already open hierarchy scope")]
    NestedHierarchyScope { constraint: String },

    #[error("`{operation}` requires an open hierarchyOfSelf or hierarchyOfReference scope")]
    MissingHierarchyScope { operation: &'static str },

    #[error("hierarchy output name `{name}` is already registered for this scope")]
    DuplicateOutputName { name: String },

    #[error("statistics cannot be fabricated while a hierarchy scope is still open")]
    ScopeStillOpen,
}

///
/// HierarchyError
///

#[derive(Debug, ThisError)]
pub enum HierarchyError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_prefixes_origin_and_class() {
        let err = InternalError::computer_invariant("pivot filter matched 3 nodes");
        assert_eq!(
            err.display_with_class(),
            "computer:invariant_violation: pivot filter matched 3 nodes"
        );
    }

    #[test]
    fn query_errors_name_the_offending_constraint() {
        let err = QueryError::NestedHierarchyScope {
            constraint: "hierarchyOfReference(`brand`)".to_string(),
        };
        assert!(err.to_string().contains("hierarchyOfReference(`brand`)"));
    }
}
