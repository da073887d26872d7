//! Table existence and state checks.

use tracing::{debug, info};

use super::{ResourceState, TableController};
use crate::datastore::TableStatus;
use crate::errors::{Result, StoreError};

impl TableController {
    /// True iff the managed table shows up in the table listing.
    pub async fn exists(&self) -> Result<bool> {
        self.table_exists(self.descriptor.name()).await
    }

    /// True iff a table named exactly `name` shows up in the listing.
    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        debug!(parent: &self.span, table = name, "searching table list");
        let tables = self
            .datastore
            .list_table_names()
            .await
            .map_err(|e| StoreError::transport("list_tables", e))?;
        debug!(parent: &self.span, count = tables.len(), "got table list");

        let found = tables.iter().any(|t| t == name);
        if found {
            info!(parent: &self.span, table = name, "table found");
        } else {
            info!(parent: &self.span, table = name, "table not found");
        }
        Ok(found)
    }

    /// Current lifecycle state, read fresh from the datastore.
    pub async fn state(&self) -> Result<ResourceState> {
        if !self.exists().await? {
            return Ok(ResourceState::Absent);
        }
        let status = self
            .datastore
            .describe_table(self.descriptor.name())
            .await
            .map_err(|e| StoreError::transport("describe_table", e))?;
        Ok(match status {
            TableStatus::Creating => ResourceState::Creating,
            TableStatus::Active => ResourceState::Active,
            _ => ResourceState::Unknown,
        })
    }
}
