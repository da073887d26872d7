//! Update item operation.

use tracing::info;

use super::ItemStore;
use crate::errors::{Result, StoreError};
use crate::item::{Item, ItemKey};

impl ItemStore {
    /// Set the attributes present on `item`, leaving every other stored
    /// attribute as it was.
    ///
    /// Behaves as an upsert: if nothing is stored under the key yet, an item
    /// with just these attributes is created. No prior `get` is needed.
    pub async fn update(&self, item: &Item) -> Result<()> {
        let descriptor = self.table.descriptor();
        let key = ItemKey::for_item(descriptor, item)?;
        info!(parent: &self.span, %item, "updating item");

        self.table
            .datastore()
            .update_item(descriptor.name(), &key, item.attrs())
            .await
            .map_err(|e| StoreError::transport("update_item", e))?;

        info!(parent: &self.span, %key, "item updated");
        Ok(())
    }
}
