//! In-memory [`Datastore`] for tests and local development.
//!
//! Tables live in a map behind a mutex. Besides storing data it counts calls
//! per operation, can delay a created table's transition to `ACTIVE` by a
//! number of describes, and can fail the next call of any operation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Datastore, TableStatus};
use crate::descriptor::TableDescriptor;
use crate::errors::{DatastoreError, DatastoreErrorKind};
use crate::item::{AttrValue, Attributes, ItemKey};

/// Datastore operations, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTables,
    DescribeTable,
    CreateTable,
    DeleteTable,
    GetItem,
    PutItem,
    UpdateItem,
    DeleteItem,
}

type StoredKey = (AttrValue, Option<AttrValue>);

#[derive(Debug)]
struct MemoryTable {
    status: TableStatus,
    // Describes left that still report CREATING.
    pending_describes: u32,
    items: HashMap<StoredKey, Attributes>,
}

impl MemoryTable {
    fn with_status(status: TableStatus, pending_describes: u32) -> Self {
        Self {
            status,
            pending_describes,
            items: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, MemoryTable>,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, DatastoreError>,
    provisioning_delay: u32,
    create_status: Option<TableStatus>,
}

impl State {
    /// Count the call and hand back an injected failure, if any.
    fn enter(&mut self, op: Operation) -> Result<(), DatastoreError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn active_table(&mut self, name: &str) -> Result<&mut MemoryTable, DatastoreError> {
        match self.tables.get_mut(name) {
            Some(table) if table.status == TableStatus::Active => Ok(table),
            _ => Err(DatastoreError::table_not_found(name)),
        }
    }
}

fn stored_key(key: &ItemKey) -> StoredKey {
    (
        canonical(&key.partition.value),
        key.sort.as_ref().map(|s| canonical(&s.value)),
    )
}

/// Numbers compare by value, so `1`, `1.0` and `1e0` address the same item.
fn canonical(value: &AttrValue) -> AttrValue {
    match value {
        AttrValue::N(raw) => match raw.trim().parse::<f64>() {
            Ok(n) if n == 0.0 => AttrValue::N("0".to_string()),
            Ok(n) if n.is_finite() => AttrValue::N(n.to_string()),
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

/// Thread-safe in-memory datastore. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatastore {
    state: Arc<Mutex<State>>,
}

impl InMemoryDatastore {
    /// A datastore whose created tables are `ACTIVE` immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Created tables report `CREATING` on create and on the next
    /// `describes` describe calls, then `ACTIVE`.
    ///
    /// A delay of zero makes create report `ACTIVE` straight away.
    pub fn with_provisioning_delay(self, describes: u32) -> Self {
        self.lock().provisioning_delay = describes;
        self
    }

    /// Make create report `status` instead of the normal one. The table is
    /// stored with that status.
    pub fn with_create_status(self, status: TableStatus) -> Self {
        self.lock().create_status = Some(status);
        self
    }

    /// Add a table as if another process had created it.
    pub fn insert_table(&self, name: &str, status: TableStatus, pending_describes: u32) {
        self.lock().tables.insert(
            name.to_string(),
            MemoryTable::with_status(status, pending_describes),
        );
    }

    /// Fail the next call of `op` with `err`.
    pub fn fail_next(&self, op: Operation, err: DatastoreError) {
        self.lock().failures.insert(op, err);
    }

    /// How many times `op` was called, failed calls included.
    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn table_status(&self, name: &str) -> Option<TableStatus> {
        self.lock().tables.get(name).map(|t| t.status.clone())
    }

    pub fn item_count(&self, name: &str) -> usize {
        self.lock().tables.get(name).map_or(0, |t| t.items.len())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn list_table_names(&self) -> Result<Vec<String>, DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::ListTables)?;
        let mut names: Vec<String> = state.tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn describe_table(&self, name: &str) -> Result<TableStatus, DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::DescribeTable)?;
        let table = state
            .tables
            .get_mut(name)
            .ok_or_else(|| DatastoreError::table_not_found(name))?;
        if table.status == TableStatus::Creating {
            if table.pending_describes > 0 {
                table.pending_describes -= 1;
            } else {
                table.status = TableStatus::Active;
            }
        }
        Ok(table.status.clone())
    }

    async fn create_table(
        &self,
        descriptor: &TableDescriptor,
    ) -> Result<TableStatus, DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::CreateTable)?;
        if state.tables.contains_key(descriptor.name()) {
            return Err(DatastoreError::new(
                DatastoreErrorKind::TableInUse,
                format!("Table '{}' already exists", descriptor.name()),
            ));
        }
        let delay = state.provisioning_delay;
        let status = match &state.create_status {
            Some(forced) => forced.clone(),
            None if delay > 0 => TableStatus::Creating,
            None => TableStatus::Active,
        };
        state.tables.insert(
            descriptor.name().to_string(),
            MemoryTable::with_status(status.clone(), delay),
        );
        Ok(status)
    }

    async fn delete_table(&self, descriptor: &TableDescriptor) -> Result<(), DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::DeleteTable)?;
        match state.tables.remove(descriptor.name()) {
            Some(_) => Ok(()),
            None => Err(DatastoreError::table_not_found(descriptor.name())),
        }
    }

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Attributes, DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::GetItem)?;
        let table = state.active_table(table)?;
        table
            .items
            .get(&stored_key(key))
            .cloned()
            .ok_or_else(|| DatastoreError::item_not_found(format!("Item not found: {}", key)))
    }

    async fn put_item(
        &self,
        table: &str,
        key: &ItemKey,
        attrs: &Attributes,
    ) -> Result<(), DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::PutItem)?;
        let table = state.active_table(table)?;
        let mut item = attrs.clone();
        item.extend(key.to_attributes());
        table.items.insert(stored_key(key), item);
        Ok(())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        attrs: &Attributes,
    ) -> Result<(), DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::UpdateItem)?;
        let table = state.active_table(table)?;
        let item = table
            .items
            .entry(stored_key(key))
            .or_insert_with(|| key.to_attributes());
        item.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), DatastoreError> {
        let mut state = self.lock();
        state.enter(Operation::DeleteItem)?;
        let table = state.active_table(table)?;
        table.items.remove(&stored_key(key));
        Ok(())
    }
}
