//! List synchronization core for a remote item store.
//!
//! # Overview
//! Keeps a local, server-confirmed copy of a list of named items and a
//! single edit session in step with a remote store that supports list,
//! create, rename and delete.
//!
//! # Design
//! - `ItemClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network; a host-supplied `Transport`
//!   executes them (`HttpStore`).
//! - `SyncState` is the pure state machine: intents yield the remote call to
//!   make, completions are folded back in. The list never changes before the
//!   store confirms.
//! - `SyncEngine` drives `SyncState` against any `RemoteStore`, running each
//!   call as a tokio task with a timeout and applying results in the order
//!   they arrive.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod list;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

pub use client::ItemClient;
pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{ApiError, ConfigError, PreconditionFailure, SyncError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use list::ItemList;
pub use session::EditSession;
pub use state::{Completion, Dispatch, Request, Snapshot, SyncState, Ticket};
pub use store::{HttpStore, MemoryStore, RemoteStore, Transport};
pub use types::{CreateItem, Item, ItemId, UpdateItem};
