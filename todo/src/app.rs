//! The mounted todo view.
//!
//! [`TodoApp`] owns the store for one mounted view. It can only be created
//! from an authenticated [`SessionGate`], and mounting triggers the one-time
//! list load.

use crate::api::TodoApi;
use crate::error::{Result, TodoError};
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::session::{Session, SessionGate};
use crate::types::{DraftField, LoadStatus, TodoAction, TodoState};
use crate::view::{self, TodoRow};
use std::time::Duration;
use todo_form_runtime::{EffectHandle, Store};
use tokio::sync::broadcast;

/// Store type backing the todo view
pub type TodoStore<A> = Store<TodoState, TodoAction, TodoEnvironment<A>, TodoReducer<A>>;

/// A mounted todo view
pub struct TodoApp<A: TodoApi> {
    store: TodoStore<A>,
    session: Session,
    initial_load: EffectHandle,
}

impl<A: TodoApi> TodoApp<A> {
    /// Mount the view for a signed-in user and start loading the list
    ///
    /// `connect` builds the API client for the session.
    ///
    /// # Errors
    ///
    /// - [`TodoError::Unauthenticated`] if `gate` is not authenticated
    /// - any error returned by `connect`
    #[tracing::instrument(skip_all)]
    pub async fn mount<F>(gate: SessionGate, connect: F) -> Result<Self>
    where
        F: FnOnce(&Session) -> Result<A>,
    {
        let SessionGate::Authenticated(session) = gate else {
            tracing::warn!("Refusing to mount without a session");
            return Err(TodoError::Unauthenticated);
        };

        let api = connect(&session)?;
        let store = Store::new(TodoState::new(), TodoReducer::new(), TodoEnvironment::new(api));
        let initial_load = store.send(TodoAction::Initialize).await?;

        tracing::info!(username = %session.username, "Todo view mounted");
        Ok(Self {
            store,
            session,
            initial_load,
        })
    }

    /// Wait for the initial list load to finish
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`](todo_form_runtime::StoreError::Timeout)
    /// if the load is still running after `timeout`.
    pub async fn wait_loaded(&mut self, timeout: Duration) -> Result<LoadStatus> {
        self.initial_load.wait_with_timeout(timeout).await?;
        Ok(self.store.state(|s| s.load).await)
    }

    /// Edit one form field
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`](todo_form_runtime::StoreError::ShutdownInProgress)
    /// after teardown.
    pub async fn set_field(&self, field: DraftField, value: impl Into<String>) -> Result<()> {
        self.store
            .send(TodoAction::SetField {
                field,
                value: value.into(),
            })
            .await?;
        Ok(())
    }

    /// Edit a form field by its key (`name` or `description`)
    ///
    /// # Errors
    ///
    /// - [`TodoError::UnknownField`] for any other key
    /// - store errors as for [`TodoApp::set_field`]
    pub async fn set_field_by_key(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let field: DraftField = key.parse()?;
        self.set_field(field, value).await
    }

    /// Submit the draft
    ///
    /// Returns once the list shows the new entry; the create call continues
    /// in the background. Await the returned handle to wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`](todo_form_runtime::StoreError::ShutdownInProgress)
    /// after teardown.
    pub async fn submit(&self) -> Result<EffectHandle> {
        Ok(self.store.send(TodoAction::Submit).await?)
    }

    /// Copy of the current view state
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(TodoState::clone).await
    }

    /// Rendered rows of the current list
    pub async fn rows(&self) -> Vec<TodoRow> {
        self.store.state(view::rows).await
    }

    /// Text rendering of the whole form
    pub async fn render(&self) -> String {
        self.store.state(view::render_text).await
    }

    /// The signed-in session the view was mounted for
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Observe remote results as they are applied
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodoStore<A> {
        &self.store
    }

    /// Unmount the view without waiting
    ///
    /// Remote calls still in flight complete, but their results are dropped.
    pub fn teardown(&self) {
        self.store.close();
    }

    /// Unmount the view and wait for in-flight calls to settle
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`](todo_form_runtime::StoreError::ShutdownTimeout)
    /// if calls are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        Ok(self.store.shutdown(timeout).await?)
    }
}
