//! Create the table if needed and wait until it is usable.

use tracing::{error, info};

use super::{TableController, TableHandle};
use crate::datastore::TableStatus;
use crate::errors::{Result, StoreError};

impl TableController {
    /// Make sure the table exists and is `ACTIVE`.
    ///
    /// An existing table is waited on, since it may still be mid-creation
    /// from an earlier run. A missing table is created from the descriptor;
    /// create reporting `ACTIVE` returns at once, `CREATING` is waited on,
    /// and anything else is [`StoreError::UnexpectedState`].
    ///
    /// Calling this again on an active table costs one listing and one
    /// describe, and never issues a second create.
    pub async fn ensure_ready(&self) -> Result<TableHandle> {
        let name = self.descriptor.name();
        info!(parent: &self.span, "initializing table");

        if self.exists().await? {
            info!(parent: &self.span, "table exists, skipping create");
            self.wait_until_active().await?;
            return Ok(self.handle());
        }

        info!(parent: &self.span, "creating table");
        let status = self
            .datastore
            .create_table(&self.descriptor)
            .await
            .map_err(|e| StoreError::transport("create_table", e))?;
        info!(parent: &self.span, %status, "table created");

        match status {
            TableStatus::Active => {
                info!(parent: &self.span, "table is active");
                Ok(self.handle())
            }
            TableStatus::Creating => {
                self.wait_until_active().await?;
                Ok(self.handle())
            }
            other => {
                error!(parent: &self.span, status = %other, "unexpected status after create");
                Err(StoreError::UnexpectedState {
                    table: name.to_string(),
                    status: other,
                })
            }
        }
    }
}
