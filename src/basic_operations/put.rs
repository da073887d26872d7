//! Put item operation.

use tracing::info;

use super::ItemStore;
use crate::errors::{Result, StoreError};
use crate::item::{Item, ItemKey};

impl ItemStore {
    /// Write all of `item`'s attributes under its key, replacing whatever was
    /// stored there. Putting the same item twice leaves the same state.
    pub async fn put(&self, item: &Item) -> Result<()> {
        let descriptor = self.table.descriptor();
        let key = ItemKey::for_item(descriptor, item)?;
        info!(parent: &self.span, %item, "inserting item");

        self.table
            .datastore()
            .put_item(descriptor.name(), &key, item.attrs())
            .await
            .map_err(|e| StoreError::transport("put_item", e))?;

        info!(parent: &self.span, %key, "item stored");
        Ok(())
    }
}
