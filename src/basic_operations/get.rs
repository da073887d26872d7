//! Get item operation.

use tracing::info;

use super::ItemStore;
use crate::errors::{Result, StoreError};
use crate::item::{Item, ItemKey};

impl ItemStore {
    /// Fetch the item stored under `primary_key`.
    ///
    /// A missing item is [`StoreError::NotFound`]; every other failure is
    /// [`StoreError::Transport`].
    pub async fn get(&self, primary_key: &str) -> Result<Item> {
        self.get_with_range(primary_key, None).await
    }

    /// Fetch the item stored under `primary_key` and `range_key`.
    pub async fn get_with_range(&self, primary_key: &str, range_key: Option<&str>) -> Result<Item> {
        let descriptor = self.table.descriptor();
        let range_key = range_key.filter(|r| !r.is_empty());
        let key = ItemKey::for_schema(descriptor, primary_key, range_key)?;
        info!(parent: &self.span, %key, "getting item");

        match self.table.datastore().get_item(descriptor.name(), &key).await {
            Ok(attrs) => {
                let item = Item::from_stored(descriptor, primary_key, range_key, attrs);
                info!(parent: &self.span, %item, "item fetched");
                Ok(item)
            }
            Err(e) if e.is_item_not_found() => {
                info!(parent: &self.span, %key, "item not found");
                Err(StoreError::NotFound {
                    table: descriptor.name().to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(StoreError::transport("get_item", e)),
        }
    }
}
