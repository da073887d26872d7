//! Wait for the table to become active.

use tracing::info;

use super::TableController;
use crate::datastore::TableStatus;
use crate::errors::{Result, StoreError};
use crate::poller::{wait_until, wait_until_cancellable};

impl TableController {
    /// Poll the table's status until it is `ACTIVE`.
    ///
    /// Any status other than `ACTIVE` counts as "not yet". A describe failure
    /// ends the wait immediately.
    pub async fn wait_until_active(&self) -> Result<()> {
        let name = self.descriptor.name();
        let datastore = self.datastore.as_ref();
        let label = format!("table {} to become active", name);
        info!(parent: &self.span, wait = ?self.wait, "waiting for table to become active");

        let predicate = move || async move {
            let status = datastore
                .describe_table(name)
                .await
                .map_err(|e| StoreError::transport("describe_table", e))?;
            Ok::<_, StoreError>(status == TableStatus::Active)
        };

        let poll_interval = self.wait.poll_interval();
        let timeout = self.wait.timeout();
        match &self.cancel {
            Some(token) => {
                wait_until_cancellable(&label, predicate, poll_interval, timeout, token).await?
            }
            None => wait_until(&label, predicate, poll_interval, timeout).await?,
        }

        info!(parent: &self.span, "table is active");
        Ok(())
    }
}
