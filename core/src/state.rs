//! Pure synchronization state machine.
//!
//! # Design
//! `SyncState` owns the confirmed item list, the edit session and the set of
//! items with a save or delete in flight. Intents either change local state
//! directly (edit session bookkeeping) or return a `Dispatch` naming the
//! remote call to make; the caller performs the call and feeds the result
//! back through `apply`. Nothing here does I/O, so every transition can be
//! exercised without a runtime.
//!
//! The list only changes when a `Completion` reports success. At most one
//! save or delete per item is in flight; a second one is refused with
//! `PreconditionFailure::Busy`. Each dispatch carries a `Ticket`, and a
//! completion whose ticket is no longer registered for its item is dropped.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{ApiError, PreconditionFailure, SyncError};
use crate::list::ItemList;
use crate::session::EditSession;
use crate::types::{normalized_name, Item, ItemId};

/// Identifies one dispatched remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

/// A remote call the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Create { name: String },
    Update { id: ItemId, name: String },
    Delete { id: ItemId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub request: Request,
}

/// Result of a dispatched call, fed back into `SyncState::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Created {
        ticket: Ticket,
        result: Result<Item, SyncError>,
    },
    Updated {
        ticket: Ticket,
        id: ItemId,
        result: Result<Item, SyncError>,
    },
    Deleted {
        ticket: Ticket,
        id: ItemId,
        result: Result<(), SyncError>,
    },
}

impl Completion {
    pub fn ticket(&self) -> Ticket {
        match self {
            Completion::Created { ticket, .. }
            | Completion::Updated { ticket, .. }
            | Completion::Deleted { ticket, .. } => *ticket,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            Completion::Created { result, .. } | Completion::Updated { result, .. } => result.as_ref().err(),
            Completion::Deleted { result, .. } => result.as_ref().err(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error().is_none()
    }

    /// The failed outcome of `request`, for calls that never produced one.
    pub fn failed(ticket: Ticket, request: Request, error: SyncError) -> Self {
        match request {
            Request::Create { .. } => Completion::Created {
                ticket,
                result: Err(error),
            },
            Request::Update { id, .. } => Completion::Updated {
                ticket,
                id,
                result: Err(error),
            },
            Request::Delete { id } => Completion::Deleted {
                ticket,
                id,
                result: Err(error),
            },
        }
    }
}

/// Read-only projection handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub session: EditSession,
    /// Items with a save or delete in flight, in list order.
    pub busy: Vec<ItemId>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncState {
    items: ItemList,
    session: EditSession,
    in_flight: HashMap<ItemId, Ticket>,
    last_ticket: u64,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &ItemList {
        &self.items
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn is_busy(&self, id: &ItemId) -> bool {
        self.in_flight.contains_key(id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items.as_slice().to_vec(),
            session: self.session.clone(),
            busy: self
                .items
                .iter()
                .filter(|item| self.is_busy(&item.id))
                .map(|item| item.id.clone())
                .collect(),
        }
    }

    /// Replace the list with a fresh server listing and end any edit.
    ///
    /// Returns the tickets of in-flight calls whose item is no longer
    /// listed; they are forgotten and should be cancelled.
    pub fn load(&mut self, items: Vec<Item>) -> Vec<Ticket> {
        self.items = ItemList::from_items(items);
        self.session = EditSession::Idle;
        let orphaned: Vec<ItemId> = self
            .in_flight
            .keys()
            .filter(|id| !self.items.contains(id))
            .cloned()
            .collect();
        orphaned
            .iter()
            .filter_map(|id| self.in_flight.remove(id))
            .collect()
    }

    /// A blank name yields no dispatch.
    pub fn add(&mut self, name: &str) -> Option<Dispatch> {
        let name = normalized_name(name)?.to_string();
        Some(Dispatch {
            ticket: self.issue(),
            request: Request::Create { name },
        })
    }

    /// Open an edit on `id`, discarding any other unsaved draft.
    pub fn start_edit(&mut self, id: &ItemId) -> Result<(), PreconditionFailure> {
        let item = self
            .items
            .get(id)
            .ok_or_else(|| PreconditionFailure::Missing(id.clone()))?;
        self.session = EditSession::Editing {
            item_id: id.clone(),
            draft: item.name.clone(),
        };
        Ok(())
    }

    pub fn update_draft(&mut self, text: impl Into<String>) -> Result<(), PreconditionFailure> {
        match &mut self.session {
            EditSession::Editing { draft, .. } => {
                *draft = text.into();
                Ok(())
            }
            EditSession::Idle => Err(PreconditionFailure::NotEditing),
        }
    }

    pub fn cancel_edit(&mut self) -> Result<(), PreconditionFailure> {
        if self.session == EditSession::Idle {
            return Err(PreconditionFailure::NotEditing);
        }
        self.session = EditSession::Idle;
        Ok(())
    }

    /// Dispatch the rename held in the edit session. The session stays open
    /// until the rename is confirmed.
    pub fn save_edit(&mut self) -> Result<Dispatch, SyncError> {
        let (id, draft) = match &self.session {
            EditSession::Editing { item_id, draft } => (item_id.clone(), draft.clone()),
            EditSession::Idle => return Err(PreconditionFailure::NotEditing.into()),
        };
        if !self.items.contains(&id) {
            self.session = EditSession::Idle;
            return Err(PreconditionFailure::Missing(id).into());
        }
        let name = normalized_name(&draft).ok_or(SyncError::Validation)?.to_string();
        let ticket = self.reserve(&id)?;
        Ok(Dispatch {
            ticket,
            request: Request::Update { id, name },
        })
    }

    pub fn delete_item(&mut self, id: &ItemId) -> Result<Dispatch, PreconditionFailure> {
        if !self.items.contains(id) {
            return Err(PreconditionFailure::Missing(id.clone()));
        }
        let ticket = self.reserve(id)?;
        Ok(Dispatch {
            ticket,
            request: Request::Delete { id: id.clone() },
        })
    }

    /// Stop tracking the in-flight call for `id`; its completion will be
    /// ignored.
    pub fn forget(&mut self, id: &ItemId) -> Option<Ticket> {
        self.in_flight.remove(id)
    }

    /// Fold a completion into the state. Returns it back when it was
    /// applied, `None` when it was stale.
    ///
    /// A rename answered with a different item id is turned into a failure
    /// so no other item is overwritten.
    pub fn apply(&mut self, completion: Completion) -> Option<Completion> {
        match completion {
            Completion::Created { ticket, result } => {
                if let Ok(item) = &result {
                    if self.items.upsert(item.clone()).is_some() {
                        tracing::warn!(id = %item.id, "store re-issued an existing id; replaced in place");
                    }
                }
                Some(Completion::Created { ticket, result })
            }
            Completion::Updated { ticket, id, result } => {
                if !self.release(&id, ticket) {
                    return None;
                }
                let result = result.and_then(|item| {
                    if item.id == id {
                        return Ok(item);
                    }
                    Err(SyncError::Remote(ApiError::DeserializationError(format!(
                        "rename of item {id} answered with item {}",
                        item.id
                    ))))
                });
                if let Ok(item) = &result {
                    if self.items.replace(item.clone()).is_none() {
                        tracing::warn!(id = %item.id, "renamed item is no longer listed");
                    }
                    if self.session.is_editing(&id) {
                        self.session = EditSession::Idle;
                    }
                }
                Some(Completion::Updated { ticket, id, result })
            }
            Completion::Deleted { ticket, id, result } => {
                if !self.release(&id, ticket) {
                    return None;
                }
                if result.is_ok() {
                    self.items.remove(&id);
                    if self.session.is_editing(&id) {
                        self.session = EditSession::Idle;
                    }
                }
                Some(Completion::Deleted { ticket, id, result })
            }
        }
    }

    fn issue(&mut self) -> Ticket {
        self.last_ticket += 1;
        Ticket(self.last_ticket)
    }

    fn reserve(&mut self, id: &ItemId) -> Result<Ticket, PreconditionFailure> {
        if self.in_flight.contains_key(id) {
            return Err(PreconditionFailure::Busy(id.clone()));
        }
        let ticket = self.issue();
        self.in_flight.insert(id.clone(), ticket);
        Ok(ticket)
    }

    fn release(&mut self, id: &ItemId, ticket: Ticket) -> bool {
        if self.in_flight.get(id) != Some(&ticket) {
            tracing::debug!(%id, ?ticket, "dropping stale completion");
            return false;
        }
        self.in_flight.remove(id);
        true
    }
}
