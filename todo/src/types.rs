//! Domain types for the todo form.
//!
//! The form edits a [`TodoDraft`]; submitting it appends a pending
//! [`TodoEntry`] to the list immediately and confirms it once the backend
//! answers with the stored [`TodoRecord`].

use crate::error::TodoError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// One of the two editable fields of the form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    /// The todo's name
    Name,
    /// The todo's description
    Description,
}

impl DraftField {
    /// The key used for this field in forms and on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
        }
    }
}

impl std::fmt::Display for DraftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftField {
    type Err = TodoError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            other => Err(TodoError::UnknownField(other.to_string())),
        }
    }
}

/// Unsaved form input
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDraft {
    /// Name input
    pub name: String,
    /// Description input
    pub description: String,
}

impl TodoDraft {
    /// Creates a draft with both fields filled in
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Returns the value of a field
    #[must_use]
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Description => &self.description,
        }
    }

    /// Replaces one field, leaving the other untouched
    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Name => self.name = value,
            DraftField::Description => self.description = value,
        }
    }

    /// Both fields are non-empty
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.description.is_empty()
    }
}

/// A todo as the backend stores it
///
/// `id` is assigned by the backend and is absent on records built locally
/// from a draft.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    /// Backend-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the todo
    pub name: String,
    /// Description of the todo
    pub description: String,
}

impl TodoRecord {
    /// Creates a record that already carries a backend id
    #[must_use]
    pub fn stored(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            description: description.into(),
        }
    }
}

impl From<TodoDraft> for TodoRecord {
    fn from(draft: TodoDraft) -> Self {
        Self {
            id: None,
            name: draft.name,
            description: draft.description,
        }
    }
}

/// Input of the create mutation
///
/// Never carries an id; the backend assigns one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoInput {
    /// Name of the todo
    pub name: String,
    /// Description of the todo
    pub description: String,
}

impl From<&TodoDraft> for CreateTodoInput {
    fn from(draft: &TodoDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
        }
    }
}

/// Client-side identifier of an optimistic insert
///
/// Only used to find the entry again when the create call returns. It is
/// never sent to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(Uuid);

impl LocalId {
    /// Creates a new random `LocalId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for LocalId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a list entry is known to the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Loaded from, or acknowledged by, the backend
    Confirmed,
    /// Inserted optimistically; the create call has not succeeded (yet)
    Pending(LocalId),
}

/// One row of the todo list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEntry {
    /// The todo itself
    pub record: TodoRecord,
    /// Sync tag
    pub sync: SyncStatus,
}

impl TodoEntry {
    /// An entry that came from the backend
    #[must_use]
    pub const fn confirmed(record: TodoRecord) -> Self {
        Self {
            record,
            sync: SyncStatus::Confirmed,
        }
    }

    /// An optimistic entry awaiting the create call
    #[must_use]
    pub const fn pending(record: TodoRecord, local_id: LocalId) -> Self {
        Self {
            record,
            sync: SyncStatus::Pending(local_id),
        }
    }

    /// Returns true while the entry awaits confirmation
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.sync, SyncStatus::Pending(_))
    }
}

/// Progress of the one-time list load
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Not requested yet
    #[default]
    Idle,
    /// Request in flight
    Loading,
    /// List replaced with the backend's answer
    Loaded,
    /// Request failed; the list was left as it was
    Failed,
}

/// State of the todo form view
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    /// Current form input
    pub draft: TodoDraft,
    /// Displayed list, in insertion order
    pub items: Vec<TodoEntry>,
    /// Progress of the initial load
    pub load: LoadStatus,
    /// Last remote failure, shown until the next successful submit or load
    pub last_error: Option<String>,
}

impl TodoState {
    /// Creates a new empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of entries awaiting confirmation
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|e| e.is_pending()).count()
    }

    /// Iterates over the records in display order
    pub fn records(&self) -> impl Iterator<Item = &TodoRecord> {
        self.items.iter().map(|e| &e.record)
    }

    /// Finds the optimistic entry created with `local_id`
    #[must_use]
    pub fn pending_entry_mut(&mut self, local_id: &LocalId) -> Option<&mut TodoEntry> {
        self.items
            .iter_mut()
            .find(|e| matches!(&e.sync, SyncStatus::Pending(id) if id == local_id))
    }
}

/// Actions for the todo form
///
/// User intents come first; the remaining variants are results fed back by
/// the remote calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    // ========== User intents ==========
    /// Load the list once, when the view is mounted
    Initialize,

    /// Edit one form field
    SetField {
        /// Field to edit
        field: DraftField,
        /// New value
        value: String,
    },

    /// Submit the current draft
    Submit,

    // ========== Remote results ==========
    /// The list query succeeded
    TodosLoaded {
        /// Records in backend order
        todos: Vec<TodoRecord>,
    },

    /// The list query failed
    LoadFailed {
        /// Error message
        error: String,
    },

    /// The create mutation succeeded
    TodoCreated {
        /// Optimistic entry to confirm
        local_id: LocalId,
        /// Record as stored by the backend
        record: TodoRecord,
    },

    /// The create mutation failed
    CreateFailed {
        /// Optimistic entry the call was made for
        local_id: LocalId,
        /// Error message
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_field_parses_known_keys() {
        assert_eq!("name".parse::<DraftField>().ok(), Some(DraftField::Name));
        assert_eq!(
            "description".parse::<DraftField>().ok(),
            Some(DraftField::Description)
        );
    }

    #[test]
    fn draft_field_rejects_unknown_keys() {
        let err = "title".parse::<DraftField>();
        assert!(matches!(err, Err(TodoError::UnknownField(ref k)) if k == "title"));
    }

    #[test]
    fn draft_set_preserves_other_field() {
        let mut draft = TodoDraft::new("Milk", "Buy milk");
        draft.set(DraftField::Name, "Eggs".to_string());

        assert_eq!(draft.get(DraftField::Name), "Eggs");
        assert_eq!(draft.get(DraftField::Description), "Buy milk");
    }

    #[test]
    fn draft_completeness_requires_both_fields() {
        assert!(!TodoDraft::default().is_complete());
        assert!(!TodoDraft::new("", "x").is_complete());
        assert!(!TodoDraft::new("x", "").is_complete());
        assert!(TodoDraft::new("x", "y").is_complete());
        // Whitespace counts as content
        assert!(TodoDraft::new(" ", " ").is_complete());
    }

    #[test]
    fn record_from_draft_has_no_id() {
        let record = TodoRecord::from(TodoDraft::new("Milk", "Buy milk"));
        assert_eq!(record.id, None);
        assert_eq!(record.name, "Milk");
    }

    #[test]
    fn record_serializes_without_missing_id() {
        let record = TodoRecord::from(TodoDraft::new("Milk", "Buy milk"));
        let json = serde_json::to_value(&record).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({"name": "Milk", "description": "Buy milk"}))
        );
    }

    #[test]
    fn record_deserializes_null_id() {
        let record: Option<TodoRecord> =
            serde_json::from_str(r#"{"id":null,"name":"A","description":"a"}"#).ok();
        assert_eq!(record.map(|r| r.id), Some(None));
    }

    #[test]
    fn pending_entry_lookup_matches_local_id() {
        let local_id = LocalId::new();
        let mut state = TodoState::new();
        state.items.push(TodoEntry::confirmed(TodoRecord::stored("1", "A", "a")));
        state.items.push(TodoEntry::pending(
            TodoRecord::from(TodoDraft::new("B", "b")),
            local_id.clone(),
        ));

        assert_eq!(state.pending_count(), 1);
        let entry = state.pending_entry_mut(&local_id).map(|e| e.record.name.clone());
        assert_eq!(entry.as_deref(), Some("B"));
        assert!(state.pending_entry_mut(&LocalId::new()).is_none());
    }
}
