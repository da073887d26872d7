//! Error types for dynostore.
//!
//! Two layers:
//! - [`DatastoreError`] is what a [`Datastore`](crate::datastore::Datastore)
//!   returns. Its [`DatastoreErrorKind`] is the structured signal that crosses
//!   the collaborator boundary, so "item not found" never has to be recognised
//!   by its message.
//! - [`StoreError`] is what the poller, the table controller and the item
//!   store return to their callers.
//!
//! AWS SDK errors are classified with typed `SdkError` variant matching, with no
//! string parsing of debug output for service errors.

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use std::fmt;
use std::time::Duration;

use crate::datastore::TableStatus;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Classification of a datastore failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatastoreErrorKind {
    /// The requested item does not exist. Only `get_item` produces this.
    ItemNotFound,
    /// The table does not exist (or is not yet usable).
    TableNotFound,
    /// The table already exists or is busy with another lifecycle change.
    TableInUse,
    /// Network level failure: dispatch error, timeout, unreadable response.
    Connection,
    /// Missing, invalid or expired credentials.
    Credentials,
    /// The caller is not allowed to perform the operation.
    AccessDenied,
    /// Request rate or provisioned capacity exceeded.
    Throttled,
    /// The request was rejected as malformed.
    Validation,
    /// Anything else the service reported.
    Service,
}

impl DatastoreErrorKind {
    fn name(&self) -> &'static str {
        match self {
            DatastoreErrorKind::ItemNotFound => "item not found",
            DatastoreErrorKind::TableNotFound => "table not found",
            DatastoreErrorKind::TableInUse => "table in use",
            DatastoreErrorKind::Connection => "connection failure",
            DatastoreErrorKind::Credentials => "credentials error",
            DatastoreErrorKind::AccessDenied => "access denied",
            DatastoreErrorKind::Throttled => "throttled",
            DatastoreErrorKind::Validation => "validation error",
            DatastoreErrorKind::Service => "service error",
        }
    }
}

impl fmt::Display for DatastoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by a datastore collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DatastoreError {
    kind: DatastoreErrorKind,
    message: String,
}

impl DatastoreError {
    pub fn new(kind: DatastoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn item_not_found(message: impl Into<String>) -> Self {
        Self::new(DatastoreErrorKind::ItemNotFound, message)
    }

    pub fn table_not_found(table: &str) -> Self {
        Self::new(
            DatastoreErrorKind::TableNotFound,
            format!("Table '{}' not found", table),
        )
    }

    pub fn kind(&self) -> DatastoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_item_not_found(&self) -> bool {
        self.kind == DatastoreErrorKind::ItemNotFound
    }
}

/// Errors surfaced by the poller, the table controller and the item store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `get` found no item under the key. An expected outcome, not a failure
    /// of the datastore.
    #[error("item '{key}' not found in table '{table}'")]
    NotFound { table: String, key: String },

    /// Any failure from the datastore collaborator. Never retried here.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: DatastoreError,
    },

    /// A bounded wait ran out of time before its predicate reported success.
    #[error("timed out after {waited:?} waiting for {label}")]
    Timeout { label: String, waited: Duration },

    /// A bounded wait was cancelled between polls.
    #[error("wait for {label} was cancelled")]
    Cancelled { label: String },

    /// The table reported a status the lifecycle does not handle.
    #[error("table '{table}' reported unexpected status {status}")]
    UnexpectedState { table: String, status: TableStatus },

    /// The item does not fit the table's key schema.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl StoreError {
    pub(crate) fn transport(operation: &'static str, source: DatastoreError) -> Self {
        StoreError::Transport { operation, source }
    }

    /// True for the distinguished "does not exist" outcome of `get`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }

    /// The datastore classification, when this error came from the datastore.
    pub fn datastore_kind(&self) -> Option<DatastoreErrorKind> {
        match self {
            StoreError::Transport { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

// ========== TYPED SDK ERROR MAPPING ==========

/// Map non-service `SdkError` variants (dispatch failures, timeouts, etc.).
///
/// Returns `None` for `ServiceError`.
fn map_outer_sdk_error<E, R>(err: &SdkError<E, R>) -> Option<DatastoreError>
where
    E: fmt::Debug,
    R: fmt::Debug,
{
    match err {
        SdkError::DispatchFailure(dispatch) => {
            let msg = if dispatch.is_timeout() {
                "Connection timed out to DynamoDB. Check your network or endpoint."
            } else if dispatch.is_io() {
                "Connection failed to DynamoDB (I/O error). Check if the endpoint is reachable."
            } else {
                "Connection failed to DynamoDB. Check if the endpoint is reachable."
            };
            Some(DatastoreError::new(DatastoreErrorKind::Connection, msg))
        }
        SdkError::TimeoutError(_) => Some(DatastoreError::new(
            DatastoreErrorKind::Connection,
            "Connection timed out to DynamoDB. Check your network or endpoint.",
        )),
        SdkError::ConstructionFailure(err) => {
            // Construction failures carry no error code, only a boxed source.
            let msg = format!("{:?}", err);
            if msg.contains("credentials") || msg.contains("Credentials") {
                Some(DatastoreError::new(
                    DatastoreErrorKind::Credentials,
                    "No AWS credentials found. Configure a key pair, a profile, or the default chain.",
                ))
            } else {
                Some(DatastoreError::new(
                    DatastoreErrorKind::Validation,
                    format!("Failed to build request: {}", msg),
                ))
            }
        }
        SdkError::ResponseError(err) => Some(DatastoreError::new(
            DatastoreErrorKind::Connection,
            format!("Invalid response from DynamoDB: {:?}", err),
        )),
        SdkError::ServiceError(_) => None,
        _ => Some(DatastoreError::new(
            DatastoreErrorKind::Service,
            format!("Unknown error from DynamoDB: {:?}", err),
        )),
    }
}

/// Map a DynamoDB service error code to a kind.
fn map_dynamodb_code(code: Option<&str>) -> DatastoreErrorKind {
    match code {
        Some("UnrecognizedClientException")
        | Some("InvalidSignatureException")
        | Some("MissingAuthenticationTokenException")
        | Some("ExpiredTokenException") => DatastoreErrorKind::Credentials,
        Some("AccessDeniedException") => DatastoreErrorKind::AccessDenied,
        Some("ProvisionedThroughputExceededException")
        | Some("LimitExceededException")
        | Some("RequestLimitExceeded")
        | Some("ThrottlingException") => DatastoreErrorKind::Throttled,
        Some("ResourceNotFoundException") => DatastoreErrorKind::TableNotFound,
        Some("ResourceInUseException") => DatastoreErrorKind::TableInUse,
        Some("ValidationException")
        | Some("SerializationException")
        | Some("ItemCollectionSizeLimitExceededException") => DatastoreErrorKind::Validation,
        _ => DatastoreErrorKind::Service,
    }
}

/// Map an AWS SDK error to a [`DatastoreError`].
///
/// For `ServiceError`, uses `ProvideErrorMetadata` to get the error code and
/// message instead of parsing debug strings.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>) -> DatastoreError
where
    E: ProvideErrorMetadata + fmt::Debug + fmt::Display,
    R: fmt::Debug,
{
    if let Some(mapped) = map_outer_sdk_error(&err) {
        return mapped;
    }

    if let Some(service_err) = err.as_service_error() {
        let meta = ProvideErrorMetadata::meta(service_err);
        let kind = map_dynamodb_code(meta.code());
        let message = meta
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| service_err.to_string());
        return DatastoreError::new(kind, message);
    }

    DatastoreError::new(
        DatastoreErrorKind::Service,
        format!("Unexpected DynamoDB error: {:?}", err),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_codes_are_classified() {
        assert_eq!(
            map_dynamodb_code(Some("ResourceNotFoundException")),
            DatastoreErrorKind::TableNotFound
        );
        assert_eq!(
            map_dynamodb_code(Some("ThrottlingException")),
            DatastoreErrorKind::Throttled
        );
        assert_eq!(
            map_dynamodb_code(Some("ExpiredTokenException")),
            DatastoreErrorKind::Credentials
        );
        assert_eq!(map_dynamodb_code(None), DatastoreErrorKind::Service);
    }

    #[test]
    fn not_found_is_distinguishable_without_messages() {
        let err = StoreError::NotFound {
            table: "Orders".into(),
            key: "missing".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.datastore_kind(), None);

        let transport = StoreError::transport(
            "get_item",
            DatastoreError::new(DatastoreErrorKind::Throttled, "slow down"),
        );
        assert!(!transport.is_not_found());
        assert_eq!(
            transport.datastore_kind(),
            Some(DatastoreErrorKind::Throttled)
        );
        assert_eq!(
            transport.to_string(),
            "get_item failed: throttled: slow down"
        );
    }
}
