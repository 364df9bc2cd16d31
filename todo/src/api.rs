//! Remote todo API.

use crate::error::Result;
use crate::types::{CreateTodoInput, TodoRecord};
use std::future::Future;

/// The two remote operations the view-model depends on
///
/// Implementations are cheap to clone; each effect moves its own clone into
/// the spawned future.
///
/// # Example
///
/// ```ignore
/// let todos = api.list().await?;
/// let stored = api.create(CreateTodoInput::from(&draft)).await?;
/// ```
pub trait TodoApi: Clone + Send + Sync + 'static {
    /// Fetch all todos in backend order
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::RemoteCallFailed`](crate::TodoError::RemoteCallFailed)
    /// if the call fails for any reason.
    fn list(&self) -> impl Future<Output = Result<Vec<TodoRecord>>> + Send;

    /// Store a new todo and return it with its backend id
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::RemoteCallFailed`](crate::TodoError::RemoteCallFailed)
    /// if the call fails for any reason.
    fn create(&self, input: CreateTodoInput) -> impl Future<Output = Result<TodoRecord>> + Send;
}
