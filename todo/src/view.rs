//! Rendering of the todo form.
//!
//! [`rows`] is the rendering contract: one [`TodoRow`] per entry, keyed by
//! backend id when there is one and by position otherwise. [`render_text`]
//! draws the whole form for the terminal front end.

use crate::types::TodoState;
use std::fmt::Write as _;

/// Title shown above the form
pub const TITLE: &str = "Todos";
/// Label of the submit button
pub const SUBMIT_LABEL: &str = "Create Todo";

/// Stable key of a rendered row
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowKey {
    /// Backend-assigned id
    Id(String),
    /// Position in the list, for records without an id
    Index(usize),
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}

/// One rendered list entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoRow {
    /// Row key
    pub key: RowKey,
    /// Name of the todo
    pub name: String,
    /// Description of the todo
    pub description: String,
    /// Awaiting confirmation from the backend
    pub pending: bool,
}

/// Rows for the current list, in display order
#[must_use]
pub fn rows(state: &TodoState) -> Vec<TodoRow> {
    state
        .items
        .iter()
        .enumerate()
        .map(|(index, entry)| TodoRow {
            key: entry
                .record
                .id
                .clone()
                .map_or(RowKey::Index(index), RowKey::Id),
            name: entry.record.name.clone(),
            description: entry.record.description.clone(),
            pending: entry.is_pending(),
        })
        .collect()
}

/// Draw the form and the list as plain text
#[must_use]
pub fn render_text(state: &TodoState) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "  Name:        [{}]", state.draft.name);
    let _ = writeln!(out, "  Description: [{}]", state.draft.description);
    let _ = writeln!(out, "  <{SUBMIT_LABEL}>");

    if let Some(error) = &state.last_error {
        let _ = writeln!(out, "  ! {error}");
    }

    let _ = writeln!(out);
    for row in rows(state) {
        let marker = if row.pending { " (saving)" } else { "" };
        let _ = writeln!(out, "  [{}] {}{marker}", row.key, row.name);
        let _ = writeln!(out, "      {}", row.description);
    }

    out
}
