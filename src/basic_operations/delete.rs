//! Delete item operation.

use tracing::info;

use super::ItemStore;
use crate::errors::{Result, StoreError};
use crate::item::{Item, ItemKey};

impl ItemStore {
    /// Delete the item under `item`'s key. Its attributes are ignored.
    ///
    /// Deleting a key that holds nothing succeeds.
    pub async fn delete(&self, item: &Item) -> Result<()> {
        let descriptor = self.table.descriptor();
        let key = ItemKey::for_schema(descriptor, item.primary_key(), item.range_key())?;
        info!(parent: &self.span, %key, "deleting item");

        self.table
            .datastore()
            .delete_item(descriptor.name(), &key)
            .await
            .map_err(|e| StoreError::transport("delete_item", e))?;

        info!(parent: &self.span, %key, "item deleted");
        Ok(())
    }
}
