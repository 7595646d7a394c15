//! The single edit session.

use serde::Serialize;

use crate::types::ItemId;

/// Which item, if any, is being renamed, and the unsaved text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditSession {
    #[default]
    Idle,
    Editing { item_id: ItemId, draft: String },
}

impl EditSession {
    pub fn editing_id(&self) -> Option<&ItemId> {
        match self {
            EditSession::Editing { item_id, .. } => Some(item_id),
            EditSession::Idle => None,
        }
    }

    pub fn is_editing(&self, id: &ItemId) -> bool {
        self.editing_id() == Some(id)
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditSession::Editing { draft, .. } => Some(draft),
            EditSession::Idle => None,
        }
    }
}
