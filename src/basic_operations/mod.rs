//! Single-item CRUD against an active table.
//!
//! - `put` - Write a whole item, replacing any previous one
//! - `get` - Read an item back, with a distinguished not-found outcome
//! - `update_op` - Set some attributes on an item (upsert, merge)
//! - `delete` - Delete an item by key (missing keys are fine)
//!
//! The store never checks or waits for the table itself. It is built from a
//! [`TableHandle`], which only the table controller hands out once the table
//! is active.

mod delete;
mod get;
mod put;
mod update_op;

use std::fmt;
use tracing::{Span, info_span};

use crate::table_operations::TableHandle;

/// CRUD operations for one table. Holds nothing but the handle.
#[derive(Clone)]
pub struct ItemStore {
    table: TableHandle,
    span: Span,
}

impl ItemStore {
    pub fn new(table: TableHandle) -> Self {
        let span = info_span!("items", table = %table.table_name());
        Self { table, span }
    }

    /// Emit item events under `span` instead of the default
    /// `items{table=<name>}` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn table(&self) -> &TableHandle {
        &self.table
    }
}

impl fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
