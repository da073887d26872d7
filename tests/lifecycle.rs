use std::sync::Arc;
use std::time::Duration;

use dynostore::datastore::memory::Operation;
use dynostore::{
    DatastoreError, DatastoreErrorKind, InMemoryDatastore, KeyAttribute, ResourceState,
    StoreError, TableController, TableDescriptor, TableStatus, WaitSettings,
};
use tokio_util::sync::CancellationToken;

fn orders() -> TableDescriptor {
    TableDescriptor::new("Orders", KeyAttribute::string("id"))
}

fn wait() -> WaitSettings {
    WaitSettings::new(Duration::from_secs(3), Duration::from_secs(20))
}

fn controller(datastore: &InMemoryDatastore) -> TableController {
    TableController::new(Arc::new(datastore.clone()), orders(), wait())
}

#[tokio::test(start_paused = true)]
async fn fresh_environment_creates_and_waits_for_orders() {
    let datastore = InMemoryDatastore::new().with_provisioning_delay(1);
    let controller = controller(&datastore);

    let handle = controller.ensure_ready().await.unwrap();
    assert_eq!(handle.table_name(), "Orders");

    assert_eq!(datastore.calls(Operation::ListTables), 1);
    assert_eq!(datastore.calls(Operation::CreateTable), 1);
    // CREATING, then ACTIVE
    assert_eq!(datastore.calls(Operation::DescribeTable), 2);

    assert!(controller.exists().await.unwrap());
    assert_eq!(datastore.table_status("Orders"), Some(TableStatus::Active));
}

#[tokio::test(start_paused = true)]
async fn ensure_ready_is_idempotent() {
    let datastore = InMemoryDatastore::new().with_provisioning_delay(2);
    let controller = controller(&datastore);

    controller.ensure_ready().await.unwrap();
    controller.ensure_ready().await.unwrap();

    assert_eq!(datastore.calls(Operation::CreateTable), 1);
    assert_eq!(datastore.calls(Operation::ListTables), 2);
}

#[tokio::test(start_paused = true)]
async fn existing_table_mid_creation_is_waited_on() {
    let datastore = InMemoryDatastore::new();
    datastore.insert_table("Orders", TableStatus::Creating, 2);
    let controller = controller(&datastore);

    controller.ensure_ready().await.unwrap();

    assert_eq!(datastore.calls(Operation::CreateTable), 0);
    assert_eq!(datastore.calls(Operation::DescribeTable), 3);
}

#[tokio::test]
async fn create_reporting_active_skips_polling() {
    let datastore = InMemoryDatastore::new();
    let controller = controller(&datastore);

    controller.ensure_ready().await.unwrap();

    assert_eq!(datastore.calls(Operation::CreateTable), 1);
    assert_eq!(datastore.calls(Operation::DescribeTable), 0);
}

#[tokio::test]
async fn unexpected_create_status_is_fatal() {
    let datastore = InMemoryDatastore::new().with_create_status(TableStatus::Updating);
    let controller = controller(&datastore);

    let err = controller.ensure_ready().await.unwrap_err();
    match err {
        StoreError::UnexpectedState { table, status } => {
            assert_eq!(table, "Orders");
            assert_eq!(status, TableStatus::Updating);
        }
        other => panic!("expected unexpected state, got {other:?}"),
    }
    assert_eq!(datastore.calls(Operation::DescribeTable), 0);
}

#[tokio::test(start_paused = true)]
async fn table_that_never_activates_times_out() {
    let datastore = InMemoryDatastore::new().with_provisioning_delay(1_000);
    let controller = controller(&datastore);

    let err = controller.ensure_ready().await.unwrap_err();
    match err {
        StoreError::Timeout { label, waited } => {
            assert!(label.contains("Orders"));
            assert!(waited <= Duration::from_secs(20));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    // Checks at 0, 3, ..., 18 seconds.
    assert_eq!(datastore.calls(Operation::DescribeTable), 7);
}

#[tokio::test(start_paused = true)]
async fn describe_failure_ends_the_wait() {
    let datastore = InMemoryDatastore::new().with_provisioning_delay(5);
    datastore.fail_next(
        Operation::DescribeTable,
        DatastoreError::new(DatastoreErrorKind::Connection, "connection reset"),
    );
    let controller = controller(&datastore);

    let err = controller.ensure_ready().await.unwrap_err();
    assert_eq!(err.datastore_kind(), Some(DatastoreErrorKind::Connection));
    assert_eq!(datastore.calls(Operation::DescribeTable), 1);
}

#[tokio::test]
async fn listing_failure_is_surfaced_before_any_create() {
    let datastore = InMemoryDatastore::new();
    datastore.fail_next(
        Operation::ListTables,
        DatastoreError::new(DatastoreErrorKind::Credentials, "expired token"),
    );
    let controller = controller(&datastore);

    let err = controller.ensure_ready().await.unwrap_err();
    assert_eq!(err.datastore_kind(), Some(DatastoreErrorKind::Credentials));
    assert_eq!(datastore.calls(Operation::CreateTable), 0);
}

#[tokio::test]
async fn destroy_on_absent_table_is_a_no_op() {
    let datastore = InMemoryDatastore::new();
    let controller = controller(&datastore);

    assert!(!controller.destroy().await.unwrap());
    assert_eq!(datastore.calls(Operation::DeleteTable), 0);
}

#[tokio::test]
async fn destroy_removes_the_table() {
    let datastore = InMemoryDatastore::new();
    let controller = controller(&datastore);
    controller.ensure_ready().await.unwrap();

    assert!(controller.destroy().await.unwrap());
    assert!(!controller.exists().await.unwrap());
    assert_eq!(datastore.calls(Operation::DeleteTable), 1);

    // A second destroy finds nothing to do.
    assert!(!controller.destroy().await.unwrap());
    assert_eq!(datastore.calls(Operation::DeleteTable), 1);
}

#[tokio::test]
async fn delete_failure_is_surfaced_unchanged() {
    let datastore = InMemoryDatastore::new();
    let controller = controller(&datastore);
    controller.ensure_ready().await.unwrap();
    datastore.fail_next(
        Operation::DeleteTable,
        DatastoreError::new(DatastoreErrorKind::AccessDenied, "not allowed"),
    );

    let err = controller.destroy().await.unwrap_err();
    match err {
        StoreError::Transport { operation, source } => {
            assert_eq!(operation, "delete_table");
            assert_eq!(
                source,
                DatastoreError::new(DatastoreErrorKind::AccessDenied, "not allowed")
            );
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_failure_during_destroy_issues_no_delete() {
    let datastore = InMemoryDatastore::new();
    let controller = controller(&datastore);
    controller.ensure_ready().await.unwrap();
    datastore.fail_next(
        Operation::ListTables,
        DatastoreError::new(DatastoreErrorKind::Connection, "unreachable"),
    );

    let err = controller.destroy().await.unwrap_err();
    assert_eq!(err.datastore_kind(), Some(DatastoreErrorKind::Connection));
    assert_eq!(datastore.calls(Operation::DeleteTable), 0);
    assert_eq!(datastore.table_status("Orders"), Some(TableStatus::Active));
}

#[tokio::test]
async fn state_is_read_fresh_every_time() {
    let datastore = InMemoryDatastore::new();
    let controller = controller(&datastore);
    assert_eq!(controller.state().await.unwrap(), ResourceState::Absent);

    datastore.insert_table("Orders", TableStatus::Creating, 1);
    assert_eq!(controller.state().await.unwrap(), ResourceState::Creating);
    assert_eq!(controller.state().await.unwrap(), ResourceState::Active);

    datastore.insert_table("Orders", TableStatus::Deleting, 0);
    assert_eq!(controller.state().await.unwrap(), ResourceState::Unknown);
}

#[tokio::test]
async fn exists_matches_names_exactly() {
    let datastore = InMemoryDatastore::new();
    datastore.insert_table("OrdersArchive", TableStatus::Active, 0);
    let controller = controller(&datastore);

    assert!(!controller.exists().await.unwrap());
    assert!(controller.table_exists("OrdersArchive").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_stops_early() {
    let datastore = InMemoryDatastore::new().with_provisioning_delay(1_000);
    let token = CancellationToken::new();
    token.cancel();
    let controller = controller(&datastore).with_cancellation(token);

    let err = controller.ensure_ready().await.unwrap_err();
    assert!(matches!(err, StoreError::Cancelled { .. }));
    assert_eq!(datastore.calls(Operation::DescribeTable), 1);
}
