//! Reducer logic for the todo form.
//!
//! Every state change happens synchronously in the reducer. Remote calls are
//! returned as effects and their outcomes come back as actions:
//!
//! - `Initialize` issues the single list call; `TodosLoaded` replaces the list.
//! - `Submit` appends a pending entry, clears the draft and issues a create
//!   call; `TodoCreated` confirms that entry with the backend's record.
//! - Failures are logged and kept in `last_error`. Nothing is rolled back.

use crate::api::TodoApi;
use crate::types::{
    CreateTodoInput, LoadStatus, LocalId, SyncStatus, TodoAction, TodoEntry, TodoRecord,
    TodoState,
};
use std::marker::PhantomData;
use std::sync::Arc;
use todo_form_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Source of identifiers for optimistic entries
pub trait LocalIdGenerator: Send + Sync {
    /// Returns an identifier not handed out before
    fn next_id(&self) -> LocalId;
}

/// Random UUID v4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomLocalIds;

impl LocalIdGenerator for RandomLocalIds {
    fn next_id(&self) -> LocalId {
        LocalId::new()
    }
}

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment<A> {
    /// Remote todo API
    pub api: A,
    /// Identifiers for entries created by `Submit`
    pub ids: Arc<dyn LocalIdGenerator>,
}

impl<A: TodoApi> TodoEnvironment<A> {
    /// Creates a new `TodoEnvironment` with random local ids
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            ids: Arc::new(RandomLocalIds),
        }
    }

    /// Replace the local id generator
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn LocalIdGenerator>) -> Self {
        self.ids = ids;
        self
    }
}

impl<A: std::fmt::Debug> std::fmt::Debug for TodoEnvironment<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Reducer for the todo form
pub struct TodoReducer<A> {
    _api: PhantomData<fn() -> A>,
}

impl<A> TodoReducer<A> {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self { _api: PhantomData }
    }
}

impl<A> Default for TodoReducer<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for TodoReducer<A> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for TodoReducer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TodoReducer")
    }
}

impl<A: TodoApi> TodoReducer<A> {
    fn load_effect(api: A) -> Effect<TodoAction> {
        Effect::future(async move {
            match api.list().await {
                Ok(todos) => Some(TodoAction::TodosLoaded { todos }),
                Err(error) => Some(TodoAction::LoadFailed {
                    error: error.to_string(),
                }),
            }
        })
    }

    fn create_effect(api: A, local_id: LocalId, input: CreateTodoInput) -> Effect<TodoAction> {
        Effect::future(async move {
            match api.create(input).await {
                Ok(record) => Some(TodoAction::TodoCreated { local_id, record }),
                Err(error) => Some(TodoAction::CreateFailed {
                    local_id,
                    error: error.to_string(),
                }),
            }
        })
    }
}

impl<A: TodoApi> Reducer for TodoReducer<A> {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment<A>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== User intents ==========
            TodoAction::Initialize => {
                if state.load != LoadStatus::Idle {
                    tracing::debug!(load = ?state.load, "List already requested");
                    return SmallVec::new();
                }

                state.load = LoadStatus::Loading;
                smallvec![Self::load_effect(env.api.clone())]
            },

            TodoAction::SetField { field, value } => {
                state.draft.set(field, value);
                SmallVec::new()
            },

            TodoAction::Submit => {
                if !state.draft.is_complete() {
                    tracing::debug!("Submit ignored: draft incomplete");
                    return SmallVec::new();
                }

                let draft = std::mem::take(&mut state.draft);
                let input = CreateTodoInput::from(&draft);
                let local_id = env.ids.next_id();

                tracing::info!(%local_id, name = %draft.name, "Submitting todo");
                state
                    .items
                    .push(TodoEntry::pending(TodoRecord::from(draft), local_id.clone()));
                state.last_error = None;

                smallvec![Self::create_effect(env.api.clone(), local_id, input)]
            },

            // ========== Remote results ==========
            TodoAction::TodosLoaded { todos } => {
                tracing::info!(count = todos.len(), "Todos loaded");
                state.items = todos.into_iter().map(TodoEntry::confirmed).collect();
                state.load = LoadStatus::Loaded;
                state.last_error = None;
                SmallVec::new()
            },

            TodoAction::LoadFailed { error } => {
                tracing::warn!(%error, "Failed to load todos");
                state.load = LoadStatus::Failed;
                state.last_error = Some(error);
                SmallVec::new()
            },

            TodoAction::TodoCreated { local_id, record } => {
                if let Some(entry) = state.pending_entry_mut(&local_id) {
                    tracing::debug!(%local_id, id = ?record.id, "Todo confirmed");
                    entry.record = record;
                    entry.sync = SyncStatus::Confirmed;
                } else {
                    tracing::debug!(%local_id, "No pending entry for created todo");
                }
                SmallVec::new()
            },

            TodoAction::CreateFailed { local_id, error } => {
                tracing::warn!(%local_id, %error, "Failed to create todo");
                state.last_error = Some(error);
                SmallVec::new()
            },
        }
    }
}
