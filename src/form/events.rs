//! Change notifications raised by the form.

use serde::Serialize;

use super::value::FieldValue;

/// Something the host may want to react to, e.g. re-fetching a dependent
/// specification after a branch change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FormEvent {
    /// A bound value changed through the form.
    ValueChanged { path: String, value: FieldValue },
    /// A discriminant selected a different branch.
    BranchChanged {
        parent: String,
        previous: Option<String>,
        next: String,
    },
    /// A newer specification replaced the current one.
    SpecReplaced { fields: usize },
}

impl FormEvent {
    /// Path of the field the event concerns, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            FormEvent::ValueChanged { path, .. } => Some(path),
            FormEvent::BranchChanged { parent, .. } => Some(parent),
            FormEvent::SpecReplaced { .. } => None,
        }
    }
}
