//! The datastore collaborator.
//!
//! The controller and the item store only talk to the remote service through
//! [`Datastore`]. Two implementations ship with the crate:
//! - `dynamodb` - the real thing, on top of `aws_sdk_dynamodb::Client`
//! - `memory` - an in-process fake with call counting and failure injection

pub mod dynamodb;
pub mod memory;

use async_trait::async_trait;
use std::fmt;

use crate::descriptor::TableDescriptor;
use crate::errors::DatastoreError;
use crate::item::{Attributes, ItemKey};

pub use dynamodb::DynamoDbDatastore;
pub use memory::InMemoryDatastore;

/// Lifecycle status a table reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    /// Anything else the service sends back, kept verbatim.
    Other(String),
}

impl TableStatus {
    /// Parse the service's wire string (`CREATING`, `ACTIVE`, ...).
    pub fn from_wire(status: &str) -> Self {
        match status {
            "CREATING" => TableStatus::Creating,
            "ACTIVE" => TableStatus::Active,
            "UPDATING" => TableStatus::Updating,
            "DELETING" => TableStatus::Deleting,
            other => TableStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TableStatus::Creating => "CREATING",
            TableStatus::Active => "ACTIVE",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Other(other) => other,
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote operations the core needs.
///
/// Implementations own transport concerns (connections, signing, transport
/// retries). Every method is a single remote call from the caller's point of
/// view.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Names of all tables visible to the caller.
    async fn list_table_names(&self) -> Result<Vec<String>, DatastoreError>;

    /// Current status of the named table.
    async fn describe_table(&self, name: &str) -> Result<TableStatus, DatastoreError>;

    /// Issue a create request; returns the status reported immediately.
    async fn create_table(&self, descriptor: &TableDescriptor)
    -> Result<TableStatus, DatastoreError>;

    async fn delete_table(&self, descriptor: &TableDescriptor) -> Result<(), DatastoreError>;

    /// All attributes of the item, key attributes included.
    ///
    /// A missing item must be reported as
    /// [`DatastoreErrorKind::ItemNotFound`](crate::errors::DatastoreErrorKind::ItemNotFound).
    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Attributes, DatastoreError>;

    /// Replace the whole item stored under `key`.
    async fn put_item(
        &self,
        table: &str,
        key: &ItemKey,
        attrs: &Attributes,
    ) -> Result<(), DatastoreError>;

    /// Set the given attributes on the item under `key`, creating it if absent.
    /// Attributes not in `attrs` are left untouched.
    async fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        attrs: &Attributes,
    ) -> Result<(), DatastoreError>;

    /// Remove the item under `key`. Removing a missing item succeeds.
    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), DatastoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_status_round_trips() {
        for wire in ["CREATING", "ACTIVE", "UPDATING", "DELETING", "ARCHIVED"] {
            assert_eq!(TableStatus::from_wire(wire).as_str(), wire);
        }
        assert_eq!(
            TableStatus::from_wire("ARCHIVED"),
            TableStatus::Other("ARCHIVED".to_string())
        );
    }
}
