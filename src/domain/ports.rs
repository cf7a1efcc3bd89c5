use super::catalog::{AdditionalService, MarketplaceModule, MarketplacePackage};
use super::ledger::{ItemKind, OwnedItems};
use super::notification::NotificationModal;
use super::session::{SessionKey, SessionSnapshot};
use crate::error::{PurchaseError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only access to the marketplace catalog.
pub trait CatalogLookup: Send + Sync {
    fn module_by_id(&self, id: &str) -> Option<&MarketplaceModule>;
    fn service_by_id(&self, id: &str) -> Option<&AdditionalService>;
    fn package_by_id(&self, id: &str) -> Option<&MarketplacePackage>;
    /// Catalog modules not yet in `owned.owned_modules`, in catalog order.
    fn available_modules_for_tenant(&self, owned: &OwnedItems) -> Vec<&MarketplaceModule>;
}

/// The owned-items ledger of one session. Grows only through `insert`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn snapshot(&self) -> Result<OwnedItems>;
    /// Returns `false` if the id was already owned.
    async fn insert(&self, kind: ItemKind, id: &str) -> Result<bool>;
}

/// Where workflow modals are rendered.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn show(&self, modal: NotificationModal);
    async fn hide(&self, id: u64);
}

/// Backend that performs the paid and activation steps of a purchase.
#[async_trait]
pub trait PurchaseGateway: Send + Sync {
    async fn purchase(&self, kind: ItemKind, id: &str) -> std::result::Result<(), PurchaseError>;
    async fn activate(&self, kind: ItemKind, id: &str) -> std::result::Result<(), PurchaseError>;
}

/// Persistence medium for session bootstrap.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionSnapshot>>;
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;
    async fn clear(&self, key: &SessionKey) -> Result<()>;
}

pub type CatalogRef = Arc<dyn CatalogLookup>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type NotificationSinkRef = Arc<dyn NotificationSink>;
pub type PurchaseGatewayBox = Box<dyn PurchaseGateway>;
pub type SessionStoreBox = Box<dyn SessionStore>;
