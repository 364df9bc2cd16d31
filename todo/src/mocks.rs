//! In-memory [`TodoApi`] and deterministic local ids for tests and offline runs.

use crate::api::TodoApi;
use crate::error::{RemoteOperation, Result, TodoError};
use crate::reducer::LocalIdGenerator;
use crate::types::{CreateTodoInput, LocalId, TodoRecord};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Hands out local ids `1`, `2`, `3`, ... as UUIDs
#[derive(Debug)]
pub struct SequentialLocalIds {
    next: AtomicU64,
}

impl Default for SequentialLocalIds {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialLocalIds {
    /// A generator whose first id is `id(1)`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// The `n`th id this generator hands out
    #[must_use]
    pub fn id(n: u64) -> LocalId {
        LocalId::from(Uuid::from_u128(u128::from(n)))
    }
}

impl LocalIdGenerator for SequentialLocalIds {
    fn next_id(&self) -> LocalId {
        Self::id(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Debug)]
struct Inner {
    todos: Vec<TodoRecord>,
    list_failure: Option<String>,
    create_failure: Option<String>,
    list_calls: usize,
    creates: Vec<CreateTodoInput>,
    next_id: u64,
}

/// Scripted [`TodoApi`]
///
/// Lists return the scripted todos (or a scripted failure); creates are
/// recorded and answered with sequential ids `todo-1`, `todo-2`, ...
/// Responses can be held back with [`MockTodoApi::hold`] and let through one
/// at a time with [`MockTodoApi::release`].
///
/// Clones share their script and recordings.
#[derive(Debug, Clone)]
pub struct MockTodoApi {
    inner: Arc<Mutex<Inner>>,
    held: Arc<AtomicBool>,
    gate: Arc<Semaphore>,
}

impl Default for MockTodoApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTodoApi {
    /// An API with no todos that accepts every create
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                todos: Vec::new(),
                list_failure: None,
                create_failure: None,
                list_calls: 0,
                creates: Vec::new(),
                next_id: 1,
            })),
            held: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    /// Lists return `todos`
    #[must_use]
    pub fn with_todos(self, todos: Vec<TodoRecord>) -> Self {
        self.lock().todos = todos;
        self
    }

    /// Lists fail with `reason`
    #[must_use]
    pub fn failing_list(self, reason: impl Into<String>) -> Self {
        self.lock().list_failure = Some(reason.into());
        self
    }

    /// Creates fail with `reason`
    #[must_use]
    pub fn failing_creates(self, reason: impl Into<String>) -> Self {
        self.lock().create_failure = Some(reason.into());
        self
    }

    /// Hold every response until released
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `count` held responses through
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    /// Number of list calls made
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Inputs of the create calls made, in call order
    #[must_use]
    pub fn creates(&self) -> Vec<CreateTodoInput> {
        self.lock().creates.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait_for_release(&self) {
        if self.held.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
    }
}

impl TodoApi for MockTodoApi {
    async fn list(&self) -> Result<Vec<TodoRecord>> {
        let result = {
            let mut inner = self.lock();
            inner.list_calls += 1;
            match &inner.list_failure {
                Some(reason) => Err(TodoError::remote(RemoteOperation::List, reason)),
                None => Ok(inner.todos.clone()),
            }
        };

        self.wait_for_release().await;
        result
    }

    async fn create(&self, input: CreateTodoInput) -> Result<TodoRecord> {
        let result = {
            let mut inner = self.lock();
            inner.creates.push(input.clone());
            match &inner.create_failure {
                Some(reason) => Err(TodoError::remote(RemoteOperation::Create, reason)),
                None => {
                    let id = format!("todo-{}", inner.next_id);
                    inner.next_id += 1;
                    let record = TodoRecord::stored(id, input.name, input.description);
                    inner.todos.push(record.clone());
                    Ok(record)
                },
            }
        };

        self.wait_for_release().await;
        result
    }
}
