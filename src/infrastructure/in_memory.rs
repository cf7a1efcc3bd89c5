use crate::application::entitlement::PhaseObserver;
use crate::domain::entitlement::PurchasePhase;
use crate::domain::ledger::{ItemKind, OwnedItems};
use crate::domain::notification::{NotificationKind, NotificationModal};
use crate::domain::ports::{LedgerStore, NotificationSink, PurchaseGateway, SessionStore};
use crate::domain::session::{SessionKey, SessionSnapshot};
use crate::error::{PurchaseError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::RwLock;

/// A thread-safe in-memory owned-items ledger.
///
/// Uses `Arc<RwLock<OwnedItems>>` so every insert is a single write-locked
/// step and two racing purchases can't lose each other's updates.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    owned: Arc<RwLock<OwnedItems>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(owned: OwnedItems) -> Self {
        Self {
            owned: Arc::new(RwLock::new(owned)),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn snapshot(&self) -> Result<OwnedItems> {
        Ok(self.owned.read().await.clone())
    }

    async fn insert(&self, kind: ItemKind, id: &str) -> Result<bool> {
        let mut owned = self.owned.write().await;
        Ok(owned.insert(kind, id))
    }
}

/// A thread-safe in-memory session store keyed by tenant and user.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, SessionSnapshot>>>,
}

impl InMemorySessionStore {
    /// Creates a new, empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionSnapshot>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(key).cloned())
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(snapshot.key.clone(), snapshot.clone());
        Ok(())
    }

    async fn clear(&self, key: &SessionKey) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(key);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct SinkState {
    current: Option<NotificationModal>,
    history: Vec<NotificationModal>,
}

/// Single-slot notification sink that remembers every modal it was shown.
///
/// `show` replaces whatever is visible. `hide` only closes the modal with
/// the given id, so a late auto-close timer never hides a newer modal.
#[derive(Default)]
pub struct RecordingNotificationSink {
    state: Mutex<SinkState>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<NotificationModal> {
        lock(&self.state).current.clone()
    }

    pub fn history(&self) -> Vec<NotificationModal> {
        lock(&self.state).history.clone()
    }

    pub fn shown_kinds(&self) -> Vec<NotificationKind> {
        lock(&self.state).history.iter().map(|m| m.kind).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn show(&self, modal: NotificationModal) {
        let mut state = lock(&self.state);
        state.history.push(modal.clone());
        state.current = Some(modal);
    }

    async fn hide(&self, id: u64) {
        let mut state = lock(&self.state);
        if state.current.as_ref().is_some_and(|m| m.id == id) {
            state.current = None;
        }
    }
}

/// Records phase transitions in the order they happen.
#[derive(Default)]
pub struct PhaseRecorder {
    phases: Mutex<Vec<PurchasePhase>>,
}

impl PhaseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phases(&self) -> Vec<PurchasePhase> {
        lock(&self.phases).clone()
    }
}

impl PhaseObserver for PhaseRecorder {
    fn on_phase(&self, _kind: ItemKind, _id: &str, phase: PurchasePhase) {
        lock(&self.phases).push(phase);
    }
}

type GatewayResult = std::result::Result<(), PurchaseError>;

/// Gateway step that a `SimulatedPurchaseGateway` should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Purchase,
    Activation,
}

/// Stand-in backend that just waits, optionally failing one step.
#[derive(Debug, Clone)]
pub struct SimulatedPurchaseGateway {
    purchase_delay: Duration,
    activation_delay: Duration,
    fail_at: Option<FailurePoint>,
}

impl SimulatedPurchaseGateway {
    pub fn new(purchase_delay: Duration, activation_delay: Duration) -> Self {
        Self {
            purchase_delay,
            activation_delay,
            fail_at: None,
        }
    }

    pub fn failing_at(mut self, point: FailurePoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    async fn step(&self, point: FailurePoint, delay: Duration) -> GatewayResult {
        tokio::time::sleep(delay).await;
        if self.fail_at == Some(point) {
            return Err(PurchaseError::Transient(format!(
                "simulated {} failure",
                match point {
                    FailurePoint::Purchase => "purchase",
                    FailurePoint::Activation => "activation",
                }
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PurchaseGateway for SimulatedPurchaseGateway {
    async fn purchase(&self, _kind: ItemKind, _id: &str) -> GatewayResult {
        self.step(FailurePoint::Purchase, self.purchase_delay).await
    }

    async fn activate(&self, _kind: ItemKind, _id: &str) -> GatewayResult {
        self.step(FailurePoint::Activation, self.activation_delay).await
    }
}
