//! Error types for the todo form.

use crate::config::ConfigError;
use thiserror::Error;
use todo_form_runtime::StoreError;

/// Result type alias for todo form operations.
pub type Result<T> = std::result::Result<T, TodoError>;

/// The two remote operations the form calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    /// The list query
    List,
    /// The create mutation
    Create,
}

impl RemoteOperation {
    /// Name of the GraphQL field backing this operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "listTodos",
            Self::Create => "createTodo",
        }
    }
}

impl std::fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the todo form
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// A remote call failed (transport, auth or server-side rejection).
    #[error("{operation} failed: {reason}")]
    RemoteCallFailed {
        /// Which call failed
        operation: RemoteOperation,
        /// What went wrong
        reason: String,
    },

    /// A form key other than `name` or `description`.
    #[error("unknown form field `{0}`")]
    UnknownField(String),

    /// The view was opened without a signed-in session.
    #[error("no authenticated session")]
    Unauthenticated,

    /// Configuration was missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The view has been torn down.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TodoError {
    /// Shorthand for [`TodoError::RemoteCallFailed`]
    pub fn remote(operation: RemoteOperation, reason: impl std::fmt::Display) -> Self {
        Self::RemoteCallFailed {
            operation,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_names_the_operation() {
        let err = TodoError::remote(RemoteOperation::Create, "HTTP 401");
        assert_eq!(err.to_string(), "createTodo failed: HTTP 401");
    }

    #[test]
    fn store_errors_convert() {
        let err: TodoError = StoreError::ShutdownInProgress.into();
        assert_eq!(err, TodoError::Store(StoreError::ShutdownInProgress));
    }
}
