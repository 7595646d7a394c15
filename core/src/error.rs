//! Error types for the item store client and the synchronization engine.
//!
//! # Design
//! `ApiError` describes what went wrong talking to the remote store.
//! `SyncError` is what the engine reports for an intent: a blank name is
//! caught before any request is built, a remote failure wraps `ApiError`,
//! and a precondition failure means local state no longer allows the
//! operation. `NotFound` keeps its own variant because callers distinguish
//! "the item is gone" from "the server misbehaved".

use std::time::Duration;

use thiserror::Error;

use crate::types::ItemId;

/// Errors produced while talking to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404: the requested item does not exist.
    #[error("item not found")]
    NotFound,

    /// The server refused the payload (400/422).
    #[error("request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),
}

/// Why an intent could not run against the current local state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionFailure {
    #[error("item {0} is not in the list")]
    Missing(ItemId),

    /// A save or delete for this item has not settled yet.
    #[error("item {0} already has a request in flight")]
    Busy(ItemId),

    #[error("no edit session is active")]
    NotEditing,
}

/// Failure of an engine intent or of the remote call it dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("item name must not be blank")]
    Validation,

    #[error("remote store call failed: {0}")]
    Remote(#[from] ApiError),

    #[error("remote store call timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Precondition(#[from] PreconditionFailure),
}

/// Invalid configuration read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid number of milliseconds: {value}")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    EmptyUrl { var: &'static str },
}
