//! Blocking wrappers.
//!
//! Each call blocks the current thread on a shared tokio runtime until the
//! async operation completes, so waits for the table suspend the caller
//! between polls. Must not be called from inside an async context.

use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::basic_operations::ItemStore;
use crate::errors::{Result, StoreError};
use crate::item::Item;
use crate::table_operations::{ResourceState, TableController, TableHandle};

/// Create a multi-threaded runtime for the blocking wrappers.
pub fn new_runtime() -> Result<Arc<Runtime>> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(StoreError::Runtime)
}

/// Blocking [`TableController`].
#[derive(Debug, Clone)]
pub struct BlockingTableController {
    inner: TableController,
    runtime: Arc<Runtime>,
}

impl BlockingTableController {
    pub fn new(inner: TableController, runtime: Arc<Runtime>) -> Self {
        Self { inner, runtime }
    }

    pub fn inner(&self) -> &TableController {
        &self.inner
    }

    pub fn exists(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.exists())
    }

    pub fn state(&self) -> Result<ResourceState> {
        self.runtime.block_on(self.inner.state())
    }

    pub fn ensure_ready(&self) -> Result<TableHandle> {
        self.runtime.block_on(self.inner.ensure_ready())
    }

    /// [`ensure_ready`](Self::ensure_ready), then wrap the handle in a store
    /// sharing this runtime.
    pub fn ready_store(&self) -> Result<BlockingItemStore> {
        let handle = self.ensure_ready()?;
        Ok(BlockingItemStore::new(
            ItemStore::new(handle),
            Arc::clone(&self.runtime),
        ))
    }

    pub fn destroy(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.destroy())
    }
}

/// Blocking [`ItemStore`].
#[derive(Debug, Clone)]
pub struct BlockingItemStore {
    inner: ItemStore,
    runtime: Arc<Runtime>,
}

impl BlockingItemStore {
    pub fn new(inner: ItemStore, runtime: Arc<Runtime>) -> Self {
        Self { inner, runtime }
    }

    pub fn put(&self, item: &Item) -> Result<()> {
        self.runtime.block_on(self.inner.put(item))
    }

    pub fn get(&self, primary_key: &str) -> Result<Item> {
        self.runtime.block_on(self.inner.get(primary_key))
    }

    pub fn get_with_range(&self, primary_key: &str, range_key: Option<&str>) -> Result<Item> {
        self.runtime
            .block_on(self.inner.get_with_range(primary_key, range_key))
    }

    pub fn update(&self, item: &Item) -> Result<()> {
        self.runtime.block_on(self.inner.update(item))
    }

    pub fn delete(&self, item: &Item) -> Result<()> {
        self.runtime.block_on(self.inner.delete(item))
    }
}
