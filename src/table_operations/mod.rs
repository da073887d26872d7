//! Table lifecycle management.
//!
//! [`TableController`] owns one table's descriptor and drives it through
//! `Absent -> Creating -> Active` and back to `Absent`:
//! - `exists` - Check if the table exists
//! - `create` - Create the table if absent and wait for it (`ensure_ready`)
//! - `wait` - Wait for the table to become active
//! - `delete` - Delete the table if present (`destroy`)
//!
//! Nothing is cached: every operation re-reads the table's state from the
//! datastore, because the table can change out of band.

mod create;
mod delete;
mod exists;
mod wait;

use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Span, info_span};

use crate::config::WaitSettings;
use crate::datastore::Datastore;
use crate::descriptor::TableDescriptor;

/// Lifecycle state of the table, derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// The table exists but reports a status other than creating or active.
    Unknown,
    Creating,
    Active,
    Absent,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceState::Unknown => "unknown",
            ResourceState::Creating => "creating",
            ResourceState::Active => "active",
            ResourceState::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// Proof that the table was observed `ACTIVE`.
///
/// Only [`TableController::ensure_ready`] hands these out, and an
/// [`ItemStore`](crate::basic_operations::ItemStore) can only be built from
/// one.
#[derive(Clone)]
pub struct TableHandle {
    datastore: Arc<dyn Datastore>,
    descriptor: Arc<TableDescriptor>,
}

impl TableHandle {
    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn table_name(&self) -> &str {
        self.descriptor.name()
    }

    pub(crate) fn datastore(&self) -> &dyn Datastore {
        self.datastore.as_ref()
    }
}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("table", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

/// Idempotent create/wait/destroy for a single table.
///
/// Safe to run from several processes at once: every step queries before it
/// acts, there is no locking.
#[derive(Clone)]
pub struct TableController {
    datastore: Arc<dyn Datastore>,
    descriptor: Arc<TableDescriptor>,
    wait: WaitSettings,
    cancel: Option<CancellationToken>,
    span: Span,
}

impl TableController {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        descriptor: TableDescriptor,
        wait: WaitSettings,
    ) -> Self {
        let span = info_span!("table", table = %descriptor.name());
        Self {
            datastore,
            descriptor: Arc::new(descriptor),
            wait,
            cancel: None,
            span,
        }
    }

    /// Abort waits for the table when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Emit lifecycle events under `span` instead of the default
    /// `table{table=<name>}` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn wait_settings(&self) -> WaitSettings {
        self.wait
    }

    fn handle(&self) -> TableHandle {
        TableHandle {
            datastore: Arc::clone(&self.datastore),
            descriptor: Arc::clone(&self.descriptor),
        }
    }
}

impl fmt::Debug for TableController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableController")
            .field("descriptor", &self.descriptor)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}
