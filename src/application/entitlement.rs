use crate::config::WorkflowConfig;
use crate::domain::entitlement::{PurchaseFlags, PurchasePhase, PurchaseReceipt};
use crate::domain::ledger::ItemKind;
use crate::domain::notification::NotificationModal;
use crate::domain::ports::{CatalogRef, LedgerStoreRef, NotificationSinkRef, PurchaseGatewayBox};
use crate::error::PurchaseError;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, instrument, warn};

type PurchaseResult<T> = std::result::Result<T, PurchaseError>;

/// Receives every phase transition of every purchase, in order.
pub trait PhaseObserver: Send + Sync {
    fn on_phase(&self, kind: ItemKind, id: &str, phase: PurchasePhase);
}

/// Cooperative cancellation for an in-flight purchase.
///
/// Cancelling before `Committed` leaves the ledger untouched; once the
/// commit has happened the purchase settles regardless.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel can't close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Drives a module, service or package purchase through its phases.
///
/// Only one purchase may run per workflow at a time; a concurrent call is
/// rejected with `PurchaseError::InFlight` and leaves the visible modal alone.
/// The ledger is written exactly once, at `Committed`.
pub struct EntitlementWorkflow {
    catalog: CatalogRef,
    ledger: LedgerStoreRef,
    sink: NotificationSinkRef,
    gateway: PurchaseGatewayBox,
    config: WorkflowConfig,
    observer: Option<Arc<dyn PhaseObserver>>,
    in_flight: Mutex<()>,
    next_modal_id: AtomicU64,
    flags: watch::Sender<PurchaseFlags>,
    ledger_revision: Arc<watch::Sender<u64>>,
}

impl EntitlementWorkflow {
    /// Creates a new `EntitlementWorkflow`.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Marketplace lookup used for display names and the module gate.
    /// * `ledger` - The session's owned-items ledger.
    /// * `sink` - Single-slot notification surface.
    /// * `gateway` - Backend performing the purchase and activation calls.
    /// * `config` - Timeouts and modal durations.
    pub fn new(
        catalog: CatalogRef,
        ledger: LedgerStoreRef,
        sink: NotificationSinkRef,
        gateway: PurchaseGatewayBox,
        config: WorkflowConfig,
    ) -> Self {
        let (flags, _) = watch::channel(PurchaseFlags::default());
        let (ledger_revision, _) = watch::channel(0);
        Self {
            catalog,
            ledger,
            sink,
            gateway,
            config,
            observer: None,
            in_flight: Mutex::new(()),
            next_modal_id: AtomicU64::new(1),
            flags,
            ledger_revision: Arc::new(ledger_revision),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PhaseObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Loading flags for the view.
    pub fn flags(&self) -> watch::Receiver<PurchaseFlags> {
        self.flags.subscribe()
    }

    /// Bumped after every commit once `reload_delay` has elapsed. Views that
    /// derive from the ledger re-read it when this changes.
    pub fn subscribe_ledger(&self) -> watch::Receiver<u64> {
        self.ledger_revision.subscribe()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    pub async fn purchase(&self, kind: ItemKind, id: &str) -> PurchaseResult<PurchaseReceipt> {
        self.purchase_with_cancel(kind, id, &CancelHandle::new()).await
    }

    #[instrument(name = "purchase", skip_all, fields(kind = %kind, id = %id))]
    pub async fn purchase_with_cancel(
        &self,
        kind: ItemKind,
        id: &str,
        cancel: &CancelHandle,
    ) -> PurchaseResult<PurchaseReceipt> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("rejected: another purchase is in flight");
            return Err(PurchaseError::InFlight);
        };

        let owned = self
            .ledger
            .snapshot()
            .await
            .map_err(|e| PurchaseError::Ledger(e.to_string()))?;

        let display_name = match self.display_name(kind, id) {
            Some(name) => name,
            None => {
                let missing = PurchaseError::NotFound {
                    kind,
                    id: id.to_string(),
                };
                warn!(error = %missing, "continuing with raw id as display name");
                id.to_string()
            }
        };

        if kind == ItemKind::Service
            && let Some(service) = self.catalog.service_by_id(id)
            && !owned.owned_modules.contains(&service.module_id)
        {
            warn!(module = %service.module_id, "rejected: base module not owned");
            return Err(PurchaseError::ModuleRequired {
                service_id: id.to_string(),
                module_id: service.module_id.clone(),
            });
        }

        let already_owned = owned.contains(kind, id);
        if already_owned {
            warn!("item already owned, running purchase again");
        }

        match self.run_phases(kind, id, &display_name, cancel).await {
            Ok(()) => {
                self.settle(kind, id, &display_name).await;
                Ok(PurchaseReceipt {
                    kind,
                    id: id.to_string(),
                    display_name,
                    already_owned,
                })
            }
            Err(e) => {
                self.fail(kind, id, &e).await;
                Err(e)
            }
        }
    }

    async fn run_phases(
        &self,
        kind: ItemKind,
        id: &str,
        display_name: &str,
        cancel: &CancelHandle,
    ) -> PurchaseResult<()> {
        self.enter(kind, id, PurchasePhase::Purchasing);
        self.flags.send_replace(PurchaseFlags {
            is_purchasing: true,
            is_activating: false,
        });
        let modal = NotificationModal::purchasing(self.modal_id(), display_name);
        self.sink.show(modal).await;
        self.guarded(
            PurchasePhase::Purchasing,
            cancel,
            self.gateway.purchase(kind, id),
        )
        .await?;

        self.enter(kind, id, PurchasePhase::Activating);
        self.flags.send_replace(PurchaseFlags {
            is_purchasing: true,
            is_activating: true,
        });
        let modal = NotificationModal::activating(self.modal_id(), display_name);
        self.sink.show(modal).await;
        self.guarded(
            PurchasePhase::Activating,
            cancel,
            self.gateway.activate(kind, id),
        )
        .await?;

        if cancel.is_cancelled() {
            return Err(PurchaseError::Cancelled {
                phase: PurchasePhase::Activating,
            });
        }

        self.ledger
            .insert(kind, id)
            .await
            .map_err(|e| PurchaseError::Ledger(e.to_string()))?;
        self.enter(kind, id, PurchasePhase::Committed);
        Ok(())
    }

    /// Races a gateway call against cancellation and the phase timeout.
    async fn guarded<F>(
        &self,
        phase: PurchasePhase,
        cancel: &CancelHandle,
        call: F,
    ) -> PurchaseResult<()>
    where
        F: Future<Output = PurchaseResult<()>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PurchaseError::Cancelled { phase }),
            outcome = tokio::time::timeout(self.config.phase_timeout, call) => {
                outcome.unwrap_or(Err(PurchaseError::Timeout { phase }))
            }
        }
    }

    async fn settle(&self, kind: ItemKind, id: &str, display_name: &str) {
        self.flags.send_replace(PurchaseFlags::default());
        let modal = NotificationModal::success(
            self.modal_id(),
            display_name,
            self.config.success_duration,
        );
        self.show_closing(modal, self.config.success_duration).await;
        self.enter(kind, id, PurchasePhase::Settled);

        let revision = Arc::clone(&self.ledger_revision);
        let delay = self.config.reload_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            revision.send_modify(|r| *r += 1);
        });
    }

    async fn fail(&self, kind: ItemKind, id: &str, cause: &PurchaseError) {
        error!(error = %cause, "purchase failed, ledger unchanged");
        self.flags.send_replace(PurchaseFlags::default());
        let modal = NotificationModal::error(self.modal_id(), self.config.error_duration);
        self.show_closing(modal, self.config.error_duration).await;
        self.enter(kind, id, PurchasePhase::Failed);
    }

    async fn show_closing(&self, modal: NotificationModal, after: Duration) {
        let modal_id = modal.id;
        self.sink.show(modal).await;
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            sink.hide(modal_id).await;
        });
    }

    fn enter(&self, kind: ItemKind, id: &str, phase: PurchasePhase) {
        info!(%phase, "purchase phase");
        if let Some(observer) = &self.observer {
            observer.on_phase(kind, id, phase);
        }
    }

    fn display_name(&self, kind: ItemKind, id: &str) -> Option<String> {
        match kind {
            ItemKind::Module => self.catalog.module_by_id(id).map(|m| m.name.clone()),
            ItemKind::Service => self.catalog.service_by_id(id).map(|s| s.name.clone()),
            ItemKind::Package => self.catalog.package_by_id(id).map(|p| p.name.clone()),
        }
    }

    fn modal_id(&self) -> u64 {
        self.next_modal_id.fetch_add(1, Ordering::Relaxed)
    }
}
