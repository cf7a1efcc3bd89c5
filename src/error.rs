use crate::domain::entitlement::{PurchasePhase, PurchaseReceipt};
use crate::domain::ledger::ItemKind;
use crate::domain::validation::FieldError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortalError>;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Validation failed: {}", format_fields(.0))]
    ValidationError(Vec<FieldError>),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid form transition: {0}")]
    InvalidTransition(String),
    #[error("Purchase error: {0}")]
    PurchaseError(#[from] PurchaseError),
    #[error("Session ledger already holds {0} items before restore")]
    LedgerNotEmpty(usize),
    /// The purchase settled and the ledger holds the item; only saving the
    /// session failed. Retry `SessionContext::persist`, not the purchase.
    #[error("{} '{}' was purchased but the session could not be saved: {source}", .receipt.kind, .receipt.id)]
    NotPersisted {
        receipt: PurchaseReceipt,
        source: Box<PortalError>,
    },
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

/// Failures of a single `purchase()` call.
///
/// Only `ModuleRequired` and `InFlight` are raised before the first phase; the
/// remaining variants end the call in the `Failed` phase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("{kind} '{id}' is not in the catalog")]
    NotFound { kind: ItemKind, id: String },
    #[error("service '{service_id}' requires base module '{module_id}'")]
    ModuleRequired {
        service_id: String,
        module_id: String,
    },
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("timed out while {phase}")]
    Timeout { phase: PurchasePhase },
    #[error("cancelled while {phase}")]
    Cancelled { phase: PurchasePhase },
    #[error("another purchase is already in progress")]
    InFlight,
    #[error("ledger error: {0}")]
    Ledger(String),
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
