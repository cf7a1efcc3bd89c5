use crate::application::entitlement::{CancelHandle, EntitlementWorkflow, PhaseObserver};
use crate::config::WorkflowConfig;
use crate::domain::catalog::MarketplaceModule;
use crate::domain::entitlement::PurchaseReceipt;
use crate::domain::ledger::{ItemKind, OwnedItems};
use crate::domain::ports::{
    CatalogRef, LedgerStoreRef, NotificationSinkRef, PurchaseGatewayBox, SessionStoreBox,
};
use crate::domain::session::{SessionKey, SessionSnapshot};
use crate::error::{PortalError, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Demo credentials accepted by the mock sign-in.
pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "admin123";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub tenant_id: String,
    pub username: String,
    pub password: String,
}

/// Collaborators a session is assembled from.
pub struct SessionServices {
    pub catalog: CatalogRef,
    /// Must start empty; it is seeded from the persisted snapshot.
    /// `SessionContext::restore` rejects a ledger that already holds items.
    pub ledger: LedgerStoreRef,
    pub sink: NotificationSinkRef,
    pub gateway: PurchaseGatewayBox,
    pub session_store: SessionStoreBox,
    pub config: WorkflowConfig,
    pub observer: Option<Arc<dyn PhaseObserver>>,
}

/// Everything scoped to one signed-in tenant user.
///
/// Owns the ledger, the single notification slot and the purchase workflow;
/// nothing here is shared with another session.
pub struct SessionContext {
    key: SessionKey,
    catalog: CatalogRef,
    ledger: LedgerStoreRef,
    session_store: SessionStoreBox,
    workflow: EntitlementWorkflow,
}

impl SessionContext {
    /// Mock credential comparison, then [`SessionContext::restore`].
    pub async fn sign_in(credentials: Credentials, services: SessionServices) -> Result<Self> {
        if credentials.username != DEMO_USERNAME || credentials.password != DEMO_PASSWORD {
            warn!(user = %credentials.username, "sign-in rejected");
            return Err(PortalError::InvalidCredentials);
        }
        let key = SessionKey::new(credentials.tenant_id, credentials.username);
        Self::restore(key, services).await
    }

    /// Rebuilds a session from its persisted snapshot, if any.
    pub async fn restore(key: SessionKey, services: SessionServices) -> Result<Self> {
        let existing = services.ledger.snapshot().await?;
        if !existing.is_empty() {
            return Err(PortalError::LedgerNotEmpty(existing.len()));
        }

        let snapshot = services
            .session_store
            .load(&key)
            .await?
            .unwrap_or_else(|| SessionSnapshot::new(key.clone()));

        for kind in [ItemKind::Module, ItemKind::Service, ItemKind::Package] {
            for id in snapshot.owned.set(kind) {
                services.ledger.insert(kind, id).await?;
            }
        }
        info!(session = %key, owned = snapshot.owned.len(), "session restored");

        let mut workflow = EntitlementWorkflow::new(
            Arc::clone(&services.catalog),
            Arc::clone(&services.ledger),
            services.sink,
            services.gateway,
            services.config,
        );
        if let Some(observer) = services.observer {
            workflow = workflow.with_observer(observer);
        }

        Ok(Self {
            key,
            catalog: services.catalog,
            ledger: services.ledger,
            session_store: services.session_store,
            workflow,
        })
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn workflow(&self) -> &EntitlementWorkflow {
        &self.workflow
    }

    pub async fn owned(&self) -> Result<OwnedItems> {
        self.ledger.snapshot().await
    }

    pub async fn available_modules(&self) -> Result<Vec<MarketplaceModule>> {
        let owned = self.owned().await?;
        Ok(self
            .catalog
            .available_modules_for_tenant(&owned)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Runs a purchase and persists the ledger once it settles.
    ///
    /// A save failure after settling is reported as
    /// [`PortalError::NotPersisted`], which carries the receipt.
    pub async fn purchase(&self, kind: ItemKind, id: &str) -> Result<PurchaseReceipt> {
        self.purchase_with_cancel(kind, id, &CancelHandle::new()).await
    }

    pub async fn purchase_with_cancel(
        &self,
        kind: ItemKind,
        id: &str,
        cancel: &CancelHandle,
    ) -> Result<PurchaseReceipt> {
        let receipt = self.workflow.purchase_with_cancel(kind, id, cancel).await?;
        if let Err(e) = self.persist().await {
            error!(session = %self.key, error = %e, "purchase settled but session was not saved");
            return Err(PortalError::NotPersisted {
                receipt,
                source: Box::new(e),
            });
        }
        Ok(receipt)
    }

    pub fn subscribe_ledger(&self) -> watch::Receiver<u64> {
        self.workflow.subscribe_ledger()
    }

    pub async fn persist(&self) -> Result<()> {
        let snapshot = SessionSnapshot {
            key: self.key.clone(),
            owned: self.owned().await?,
        };
        self.session_store.save(&snapshot).await
    }

    /// Drops the persisted snapshot for this session.
    pub async fn sign_out(self) -> Result<()> {
        info!(session = %self.key, "signing out");
        self.session_store.clear(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Catalog;
    use crate::domain::ports::SessionStore;
    use crate::error::PurchaseError;
    use crate::infrastructure::in_memory::{
        InMemoryLedgerStore, InMemorySessionStore, RecordingNotificationSink,
        SimulatedPurchaseGateway,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    fn services(store: InMemorySessionStore) -> SessionServices {
        SessionServices {
            catalog: Arc::new(Catalog::builtin()),
            ledger: Arc::new(InMemoryLedgerStore::new()),
            sink: Arc::new(RecordingNotificationSink::new()),
            gateway: Box::new(SimulatedPurchaseGateway::new(Duration::ZERO, Duration::ZERO)),
            session_store: Box::new(store),
            config: WorkflowConfig::instant(),
            observer: None,
        }
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            tenant_id: "acme".to_string(),
            username: DEMO_USERNAME.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_rejects_wrong_password() {
        let result =
            SessionContext::sign_in(credentials("nope"), services(InMemorySessionStore::new()))
                .await;
        assert!(matches!(result, Err(PortalError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_purchase_is_persisted_and_restored() {
        let store = InMemorySessionStore::new();

        let session = SessionContext::sign_in(credentials(DEMO_PASSWORD), services(store.clone()))
            .await
            .unwrap();
        session.purchase(ItemKind::Module, "shrimp").await.unwrap();
        session.purchase(ItemKind::Service, "genetics").await.unwrap();

        let restored = SessionContext::restore(session.key().clone(), services(store.clone()))
            .await
            .unwrap();
        let owned = restored.owned().await.unwrap();
        assert!(owned.contains(ItemKind::Module, "shrimp"));
        assert!(owned.contains(ItemKind::Service, "genetics"));

        let available: Vec<String> = restored
            .available_modules()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert!(!available.contains(&"shrimp".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_purchase_is_not_persisted() {
        let store = InMemorySessionStore::new();
        let session = SessionContext::sign_in(credentials(DEMO_PASSWORD), services(store.clone()))
            .await
            .unwrap();

        let err = session
            .purchase(ItemKind::Service, "genetics")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PortalError::PurchaseError(PurchaseError::ModuleRequired { .. })
        ));
        assert!(store.load(session.key()).await.unwrap().is_none());
    }

    struct ReadOnlySessionStore;

    #[async_trait]
    impl SessionStore for ReadOnlySessionStore {
        async fn load(&self, _key: &SessionKey) -> Result<Option<SessionSnapshot>> {
            Ok(None)
        }

        async fn save(&self, _snapshot: &SessionSnapshot) -> Result<()> {
            Err(PortalError::IoError(std::io::Error::other("read-only")))
        }

        async fn clear(&self, _key: &SessionKey) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_restore_rejects_prefilled_ledger() {
        let mut services = services(InMemorySessionStore::new());
        services.ledger = Arc::new(InMemoryLedgerStore::with_items(OwnedItems::with_modules([
            "salmon",
        ])));

        let result = SessionContext::restore(SessionKey::new("acme", "admin"), services).await;
        assert!(matches!(result, Err(PortalError::LedgerNotEmpty(1))));
    }

    #[tokio::test]
    async fn test_save_failure_still_returns_receipt() {
        let mut services = services(InMemorySessionStore::new());
        services.session_store = Box::new(ReadOnlySessionStore);
        let session = SessionContext::sign_in(credentials(DEMO_PASSWORD), services)
            .await
            .unwrap();

        let err = session.purchase(ItemKind::Module, "shrimp").await.unwrap_err();
        match err {
            PortalError::NotPersisted { receipt, .. } => {
                assert_eq!(receipt.id, "shrimp");
                assert!(!receipt.already_owned);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(session.owned().await.unwrap().contains(ItemKind::Module, "shrimp"));
        assert!(session.persist().await.is_err());
    }

    #[tokio::test]
    async fn test_sign_out_clears_snapshot() {
        let store = InMemorySessionStore::new();
        let session = SessionContext::sign_in(credentials(DEMO_PASSWORD), services(store.clone()))
            .await
            .unwrap();
        session.purchase(ItemKind::Module, "tilapia").await.unwrap();
        let key = session.key().clone();

        session.sign_out().await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
    }
}
