//! Delete the table if present.

use tracing::info;

use super::TableController;
use crate::errors::{Result, StoreError};

impl TableController {
    /// Delete the table if it exists.
    ///
    /// Returns `true` if a delete was issued, `false` if the table was
    /// already gone. Does not wait for the table to disappear: the name may
    /// still be listed (as `DELETING`) for a while after this returns.
    pub async fn destroy(&self) -> Result<bool> {
        info!(parent: &self.span, "destroying table");

        if !self.exists().await? {
            info!(parent: &self.span, "table doesn't exist, skipping deletion");
            return Ok(false);
        }

        self.datastore
            .delete_table(&self.descriptor)
            .await
            .map_err(|e| StoreError::transport("delete_table", e))?;
        info!(parent: &self.span, "table deleted");
        Ok(true)
    }
}
