use serde::Serialize;

use super::user_record::RecordId;

/// The interaction currently focused in an admin session.
///
/// At most one flow is active at a time: opening one replaces whatever was
/// selected before, a successful submit returns to `None`, and a failed submit
/// leaves the selection in place so the form can be retried.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    Creating,
    Editing(RecordId),
    Deleting(RecordId),
}

impl Selection {
    pub fn is_idle(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn is_creating(&self) -> bool {
        matches!(self, Selection::Creating)
    }

    pub fn is_editing(&self, id: &RecordId) -> bool {
        matches!(self, Selection::Editing(current) if current == id)
    }

    pub fn is_deleting(&self, id: &RecordId) -> bool {
        matches!(self, Selection::Deleting(current) if current == id)
    }

    /// Record targeted by the selection, if any.
    pub fn target(&self) -> Option<&RecordId> {
        match self {
            Selection::Editing(id) | Selection::Deleting(id) => Some(id),
            _ => None,
        }
    }
}
