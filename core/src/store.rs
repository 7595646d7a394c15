//! The remote item store as seen by the engine.
//!
//! # Design
//! `RemoteStore` is the only capability the engine depends on. `HttpStore`
//! implements it on top of `ItemClient` plus a host-supplied `Transport`,
//! so the core still performs no network I/O of its own. `MemoryStore` is an
//! in-process stand-in with the same observable behavior as the HTTP server
//! (server-assigned ids, trimmed names, 404 for unknown ids).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::ItemClient;
use crate::config::SyncConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{normalized_name, CreateItem, Item, ItemId, UpdateItem};

/// Authoritative item collection. Every call may be slow or fail.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_items(&self) -> Result<Vec<Item>, ApiError>;

    async fn create_item(&self, name: &str) -> Result<Item, ApiError>;

    async fn update_item(&self, id: &ItemId, name: &str) -> Result<Item, ApiError>;

    async fn delete_item(&self, id: &ItemId) -> Result<(), ApiError>;
}

/// Executes one HTTP round-trip on behalf of the core.
///
/// Non-2xx statuses are returned as responses, not errors; only failures
/// that produce no response at all map to `ApiError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `RemoteStore` speaking the JSON item API through a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpStore<T> {
    client: ItemClient,
    transport: T,
}

impl<T: Transport> HttpStore<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: ItemClient::new(base_url),
            transport,
        }
    }

    /// Store at `config.base_url`, e.g. from `SyncConfig::from_env`.
    pub fn from_config(config: &SyncConfig, transport: T) -> Self {
        Self::new(&config.base_url, transport)
    }
}

#[async_trait]
impl<T: Transport> RemoteStore for HttpStore<T> {
    async fn list_items(&self) -> Result<Vec<Item>, ApiError> {
        let response = self.transport.execute(self.client.build_list_items()).await?;
        self.client.parse_list_items(response)
    }

    async fn create_item(&self, name: &str) -> Result<Item, ApiError> {
        let request = self.client.build_create_item(&CreateItem {
            name: name.to_string(),
        })?;
        let response = self.transport.execute(request).await?;
        self.client.parse_create_item(response)
    }

    async fn update_item(&self, id: &ItemId, name: &str) -> Result<Item, ApiError> {
        let request = self.client.build_update_item(
            id,
            &UpdateItem {
                name: name.to_string(),
            },
        )?;
        let response = self.transport.execute(request).await?;
        self.client.parse_update_item(response)
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_item(id)).await?;
        self.client.parse_delete_item(response)
    }
}

/// In-memory `RemoteStore`. Ids are issued from a counter starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<Vec<Item>>,
    next_id: AtomicU64,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. to simulate data that existed before startup.
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: RwLock::new(items),
            ..Self::default()
        }
    }

    /// While offline every call fails with `ApiError::Transport`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn items(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }

    fn reachable(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("store offline".to_string()));
        }
        Ok(())
    }
}

fn validated(name: &str) -> Result<String, ApiError> {
    normalized_name(name).map(str::to_string).ok_or_else(|| ApiError::Rejected {
        status: 400,
        body: "name must not be blank".to_string(),
    })
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_items(&self) -> Result<Vec<Item>, ApiError> {
        self.reachable()?;
        Ok(self.items.read().await.clone())
    }

    async fn create_item(&self, name: &str) -> Result<Item, ApiError> {
        self.reachable()?;
        let name = validated(name)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let item = Item::new(id.to_string(), name);
        self.items.write().await.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: &ItemId, name: &str) -> Result<Item, ApiError> {
        self.reachable()?;
        let name = validated(name)?;
        let mut items = self.items.write().await;
        let item = items.iter_mut().find(|item| &item.id == id).ok_or(ApiError::NotFound)?;
        item.name = name;
        Ok(item.clone())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), ApiError> {
        self.reachable()?;
        let mut items = self.items.write().await;
        let position = items.iter().position(|item| &item.id == id).ok_or(ApiError::NotFound)?;
        items.remove(position);
        Ok(())
    }
}
