//! dynostore - idempotent DynamoDB table lifecycle and single-item CRUD.
//!
//! Two components do the work:
//! - [`TableController`] creates the table if it is missing, waits for it to
//!   become active, and deletes it if present. Every step re-reads remote
//!   state first, so repeated or concurrent calls are safe.
//! - [`ItemStore`] puts, gets, updates and deletes single items once the
//!   controller has handed out a [`TableHandle`].
//!
//! Both talk to the service through the [`Datastore`] trait, implemented by
//! [`DynamoDbDatastore`] for real use and [`InMemoryDatastore`] for tests.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dynostore::{DynamoDbDatastore, Item, ItemStore, StoreConfig, TableController};
//!
//! # async fn example() -> dynostore::Result<()> {
//! let config = StoreConfig::default().apply_env()?;
//! let client = dynostore::client::build_client(&config.aws).await;
//! let controller = TableController::new(
//!     Arc::new(DynamoDbDatastore::new(client)),
//!     config.table.clone(),
//!     config.wait,
//! );
//!
//! let store = ItemStore::new(controller.ensure_ready().await?);
//! store.put(&Item::new("some-unique-id").with_attr("color", "red")).await?;
//! match store.get("unknown").await {
//!     Err(e) if e.is_not_found() => {}
//!     other => panic!("unexpected: {:?}", other),
//! }
//! controller.destroy().await?;
//! # Ok(())
//! # }
//! ```

pub mod basic_operations;
pub mod blocking;
pub mod client;
pub mod config;
pub mod conversions;
pub mod datastore;
pub mod descriptor;
pub mod errors;
pub mod item;
pub mod poller;
pub mod table_operations;
pub mod telemetry;

pub use basic_operations::ItemStore;
pub use config::{StoreConfig, WaitSettings};
pub use datastore::{Datastore, DynamoDbDatastore, InMemoryDatastore, TableStatus};
pub use descriptor::{KeyAttribute, KeyType, Provisioning, TableDescriptor};
pub use errors::{DatastoreError, DatastoreErrorKind, Result, StoreError};
pub use item::{AttrValue, Attributes, Item, ItemKey};
pub use poller::{wait_until, wait_until_cancellable};
pub use table_operations::{ResourceState, TableController, TableHandle};
