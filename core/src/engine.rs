//! Async driver around `SyncState`.
//!
//! # Design
//! Intents run synchronously against the owned state. When one needs the
//! remote store, the call is spawned onto a `JoinSet` under a per-call
//! timeout and the intent returns at once with its `Ticket`. Completions are
//! pulled one at a time with `next_settled` in the order the calls finish,
//! so no two completions touch state concurrently. Every change is published
//! as a `Snapshot` on a `watch` channel.
//!
//! Methods that dispatch must be called from within a tokio runtime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinSet};

use crate::config::SyncConfig;
use crate::error::{ApiError, SyncError};
use crate::session::EditSession;
use crate::state::{Completion, Dispatch, Request, Snapshot, SyncState, Ticket};
use crate::store::RemoteStore;
use crate::types::{Item, ItemId};

/// A spawned call and the request it carries, kept so a task that dies
/// without a completion can still be reported.
struct Running {
    handle: AbortHandle,
    request: Request,
}

pub struct SyncEngine<S> {
    store: Arc<S>,
    state: SyncState,
    request_timeout: Duration,
    tasks: JoinSet<Completion>,
    handles: HashMap<Ticket, Running>,
    snapshots: watch::Sender<Snapshot>,
}

impl<S: RemoteStore + 'static> SyncEngine<S> {
    pub fn new(store: Arc<S>, config: &SyncConfig) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::default());
        Self {
            store,
            state: SyncState::new(),
            request_timeout: config.request_timeout,
            tasks: JoinSet::new(),
            handles: HashMap::new(),
            snapshots,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn items(&self) -> &[Item] {
        self.state.items().as_slice()
    }

    pub fn session(&self) -> &EditSession {
        self.state.session()
    }

    pub fn is_busy(&self, id: &ItemId) -> bool {
        self.state.is_busy(id)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Receives a new `Snapshot` after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Number of remote calls not yet settled.
    pub fn in_flight(&self) -> usize {
        self.handles.len()
    }

    /// Load the list from the store. On failure the list is left as it was
    /// and nothing is retried.
    pub async fn initialize(&mut self) -> Result<(), SyncError> {
        let items = bounded(self.request_timeout, self.store.list_items())
            .await
            .inspect_err(|err| tracing::warn!(%err, "failed to load items"))?;
        tracing::info!(count = items.len(), "loaded items");
        for ticket in self.state.load(items) {
            self.abort(ticket);
        }
        self.publish();
        Ok(())
    }

    /// Ask the store to create an item. Blank names are ignored and return
    /// `None`. The list is untouched until the store confirms.
    pub fn add(&mut self, name: &str) -> Option<Ticket> {
        let dispatch = self.state.add(name)?;
        Some(self.spawn(dispatch))
    }

    pub fn start_edit(&mut self, id: &ItemId) -> Result<(), SyncError> {
        self.state.start_edit(id)?;
        self.publish();
        Ok(())
    }

    pub fn update_draft(&mut self, text: impl Into<String>) -> Result<(), SyncError> {
        self.state.update_draft(text)?;
        self.publish();
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Result<(), SyncError> {
        self.state.cancel_edit()?;
        self.publish();
        Ok(())
    }

    pub fn save_edit(&mut self) -> Result<Ticket, SyncError> {
        let dispatch = self.state.save_edit();
        // A vanished item closes the session even though the save fails.
        self.publish();
        Ok(self.spawn(dispatch?))
    }

    pub fn delete_item(&mut self, id: &ItemId) -> Result<Ticket, SyncError> {
        let dispatch = self.state.delete_item(id)?;
        Ok(self.spawn(dispatch))
    }

    /// Abandon the in-flight save or delete for `id`. A result that still
    /// arrives is discarded. Returns whether anything was cancelled.
    pub fn cancel(&mut self, id: &ItemId) -> bool {
        let Some(ticket) = self.state.forget(id) else {
            return false;
        };
        tracing::debug!(%id, ?ticket, "cancelling in-flight call");
        self.abort(ticket);
        self.publish();
        true
    }

    /// Wait for the next remote call to finish and apply it. Returns `None`
    /// once nothing is in flight.
    pub async fn next_settled(&mut self) -> Option<Completion> {
        while let Some(joined) = self.tasks.join_next().await {
            let completion = match joined {
                Ok(completion) => completion,
                Err(err) => match self.reap(err) {
                    Some(completion) => completion,
                    None => continue,
                },
            };
            if self.handles.remove(&completion.ticket()).is_none() {
                continue;
            }
            let Some(settled) = self.state.apply(completion) else {
                continue;
            };
            match settled.error() {
                Some(err) => tracing::warn!(ticket = ?settled.ticket(), %err, "remote call failed"),
                None => tracing::debug!(ticket = ?settled.ticket(), "remote call settled"),
            }
            self.publish();
            return Some(settled);
        }
        None
    }

    /// Apply completions until nothing is in flight, in arrival order.
    pub async fn settle_all(&mut self) -> Vec<Completion> {
        let mut settled = Vec::new();
        while let Some(completion) = self.next_settled().await {
            settled.push(completion);
        }
        settled
    }

    fn spawn(&mut self, dispatch: Dispatch) -> Ticket {
        let Dispatch { ticket, request } = dispatch;
        tracing::debug!(?ticket, ?request, "dispatching");
        let store = Arc::clone(&self.store);
        let limit = self.request_timeout;
        let running = request.clone();
        let handle = self.tasks.spawn(async move {
            match request {
                Request::Create { name } => Completion::Created {
                    ticket,
                    result: bounded(limit, store.create_item(&name)).await,
                },
                Request::Update { id, name } => {
                    let result = bounded(limit, store.update_item(&id, &name)).await;
                    Completion::Updated { ticket, id, result }
                }
                Request::Delete { id } => {
                    let result = bounded(limit, store.delete_item(&id)).await;
                    Completion::Deleted { ticket, id, result }
                }
            }
        });
        self.handles.insert(
            ticket,
            Running {
                handle,
                request: running,
            },
        );
        self.publish();
        ticket
    }

    fn abort(&mut self, ticket: Ticket) {
        if let Some(running) = self.handles.remove(&ticket) {
            running.handle.abort();
        }
    }

    /// Turn a task that ended without a completion into a failed one.
    /// Cancelled tasks were already dropped from `handles` and yield `None`.
    fn reap(&mut self, err: tokio::task::JoinError) -> Option<Completion> {
        if err.is_cancelled() {
            return None;
        }
        let (ticket, running) = self
            .handles
            .iter()
            .find(|(_, running)| running.handle.id() == err.id())?;
        tracing::error!(?ticket, %err, "remote call task panicked");
        Some(Completion::failed(
            *ticket,
            running.request.clone(),
            SyncError::Remote(ApiError::Transport(format!("remote call task failed: {err}"))),
        ))
    }

    fn publish(&self) {
        let next = self.state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

impl<S> Drop for SyncEngine<S> {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, SyncError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(SyncError::from),
        Err(_) => Err(SyncError::Timeout(limit)),
    }
}
