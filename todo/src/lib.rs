//! Todo form view-model over a hosted GraphQL API.
//!
//! A signed-in user sees a two-field form (name, description) and the list of
//! todos stored by the backend. The list is fetched once when the view is
//! mounted. Submitting the form appends the todo to the list immediately and
//! stores it in the background; when the backend answers, the entry is
//! confirmed with its backend id.
//!
//! The view-model is a reducer over [`TodoState`] run by a
//! [`Store`](todo_form_runtime::Store). Remote calls go through the
//! [`TodoApi`] trait, implemented by [`GraphQlTodoApi`] and by
//! [`MockTodoApi`] for tests.
//!
//! # Quick Start
//!
//! ```no_run
//! use todo_form::{
//!     AppConfig, DraftField, GraphQlTodoApi, Session, SessionGate, TodoApp, TodoError,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), TodoError> {
//! let config = AppConfig::with_api_key("https://example.com/graphql", "da2-key");
//! let gate = SessionGate::Authenticated(Session::new("alice"));
//!
//! let mut app = TodoApp::mount(gate, |session| {
//!     Ok(GraphQlTodoApi::new(&config, session)?)
//! })
//! .await?;
//! app.wait_loaded(Duration::from_secs(10)).await?;
//!
//! app.set_field(DraftField::Name, "Milk").await?;
//! app.set_field(DraftField::Description, "Buy milk").await?;
//! app.submit().await?;
//!
//! println!("{}", app.render().await);
//! app.shutdown(Duration::from_secs(10)).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod graphql;
pub mod mocks;
pub mod reducer;
pub mod session;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use api::TodoApi;
pub use app::{TodoApp, TodoStore};
pub use config::{AppConfig, AuthMode, ConfigError};
pub use error::{RemoteOperation, Result, TodoError};
pub use graphql::GraphQlTodoApi;
pub use mocks::{MockTodoApi, SequentialLocalIds};
pub use reducer::{LocalIdGenerator, RandomLocalIds, TodoEnvironment, TodoReducer};
pub use session::{
    EnvSessionProvider, Session, SessionError, SessionGate, SessionProvider,
    StaticSessionProvider, require_session,
};
pub use types::{
    CreateTodoInput, DraftField, LoadStatus, LocalId, SyncStatus, TodoAction, TodoDraft,
    TodoEntry, TodoRecord, TodoState,
};
pub use view::{RowKey, TodoRow};
