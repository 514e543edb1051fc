//! Session lifecycle management
//!
//! This module owns the authentication token for the running process. The
//! token is restored once from durable storage at startup, replaced on sign-in,
//! and cleared on sign-out. Consumers read snapshots or subscribe to changes;
//! nothing outside this module mutates the session.
//!
//! # Persistence contract
//!
//! Durable storage is a best-effort cache of the session, not its source of
//! truth. `sign_in` and `sign_out` update memory first and hand the durable
//! write to a background worker (write-behind). Storage failures are logged
//! and dropped; they are never retried and never reach the caller.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storage::KeyValueStore;
use tokio::sync::{broadcast, mpsc, oneshot, watch, OnceCell};
use tokio::task::JoinHandle;

/// Default storage key the session token is persisted under
pub const DEFAULT_STORAGE_KEY: &str = "session";

/// Session-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Token was empty or whitespace
    #[error("Session token must not be empty")]
    EmptyToken,
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Opaque authentication token issued by the API
///
/// Always non-empty. `Debug` output never includes the token itself.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a token, rejecting empty or whitespace-only values
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self(token))
    }

    /// Borrow the raw token (e.g. to build an `Authorization` header)
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

impl TryFrom<String> for SessionToken {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SessionToken {
    type Error = SessionError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

/// Point-in-time view of the session
///
/// `session` is only authoritative once `is_loading` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current token, if signed in
    pub session: Option<SessionToken>,
    /// Whether the initial restore is still in flight
    pub is_loading: bool,
}

impl SessionSnapshot {
    fn restoring() -> Self {
        Self { session: None, is_loading: true }
    }

    /// Collapse the snapshot into the session state machine
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            return SessionPhase::Restoring;
        }
        match &self.session {
            Some(token) => SessionPhase::Authenticated(token.clone()),
            None => SessionPhase::Unauthenticated,
        }
    }

    /// True once restored and holding a token
    pub fn is_authenticated(&self) -> bool {
        !self.is_loading && self.session.is_some()
    }
}

/// Session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Startup; persisted state has not been read yet
    Restoring,
    /// Signed in with a token
    Authenticated(SessionToken),
    /// Signed out, or nothing was stored
    Unauthenticated,
}

/// Events broadcast when the session changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Initial restore finished
    Restored {
        /// Whether a session is active after the restore
        authenticated: bool,
    },
    /// A token was installed
    SignedIn,
    /// The token was cleared
    SignedOut,
    /// The manager stopped persisting changes
    Disposed,
}

/// Session manager configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Key the token is stored under
    pub storage_key: String,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_capacity: 16,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the event channel capacity (minimum 1)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

#[derive(Debug)]
enum PersistOp {
    Write(SessionToken),
    Remove,
    Flush(oneshot::Sender<()>),
}

/// Process-wide owner of the authentication session
///
/// Share it by reference (usually `Arc<SessionManager>`) with screens and
/// route guards. Lifecycle: `new → restore → {sign_in | sign_out}* → dispose`.
///
/// # Example
///
/// ```no_run
/// use app_state::session::{SessionConfig, SessionManager, SessionToken};
/// use storage::KvStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = KvStore::in_memory()?;
///     let manager = SessionManager::new(store, SessionConfig::default());
///
///     let snapshot = manager.restore().await;
///     assert!(!snapshot.is_loading);
///
///     manager.sign_in(SessionToken::new("tok-123")?);
///     assert!(manager.is_authenticated());
///
///     manager.dispose().await;
///     Ok(())
/// }
/// ```
pub struct SessionManager {
    config: SessionConfig,
    store: Arc<dyn KeyValueStore>,
    state_tx: watch::Sender<SessionSnapshot>,
    events_tx: broadcast::Sender<SessionEvent>,
    persist_tx: Mutex<Option<mpsc::UnboundedSender<PersistOp>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    restored: OnceCell<()>,
    /// Bumped on every sign-in/sign-out; a restore that started under an
    /// older generation does not overwrite the session.
    generation: AtomicU64,
}

impl SessionManager {
    /// Create a session manager in the `Restoring` state
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime; the persistence worker is
    /// spawned onto it.
    pub fn new<S>(store: S, config: SessionConfig) -> Self
    where
        S: KeyValueStore + 'static,
    {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a session manager over an already shared store
    pub fn with_shared_store(store: Arc<dyn KeyValueStore>, config: SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::restoring());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(run_persistence(
            Arc::clone(&store),
            config.storage_key.clone(),
            persist_rx,
        ));

        Self {
            config,
            store,
            state_tx,
            events_tx,
            persist_tx: Mutex::new(Some(persist_tx)),
            worker: Mutex::new(Some(worker)),
            restored: OnceCell::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Restore the persisted session
    ///
    /// Only the first call touches storage. Concurrent and later calls wait
    /// for that attempt and return the resulting snapshot. Storage failures
    /// and corrupted values are treated as "no session". On return
    /// `is_loading` is always false.
    pub async fn restore(&self) -> SessionSnapshot {
        self.restored.get_or_init(|| self.load_persisted()).await;
        self.read()
    }

    async fn load_persisted(&self) {
        let started_at = self.generation.load(Ordering::SeqCst);
        let key = self.config.storage_key.as_str();

        let restored = match self.store.get(key).await {
            Ok(Some(raw)) => match SessionToken::new(raw) {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::warn!(key, error = %e, "Ignoring invalid persisted session");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read persisted session");
                None
            }
        };

        let mut authenticated = false;
        self.state_tx.send_modify(|state| {
            if self.generation.load(Ordering::SeqCst) == started_at {
                state.session = restored;
            } else {
                tracing::debug!("Session changed during restore; keeping in-memory value");
            }
            state.is_loading = false;
            authenticated = state.session.is_some();
        });

        tracing::info!(authenticated, "Session restored");
        let _ = self.events_tx.send(SessionEvent::Restored { authenticated });
    }

    /// Install a token
    ///
    /// Visible to every consumer immediately; the durable write happens in
    /// the background.
    pub fn sign_in(&self, token: SessionToken) {
        self.state_tx.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.session = Some(token.clone());
            self.enqueue(PersistOp::Write(token));
        });

        tracing::debug!("Signed in");
        let _ = self.events_tx.send(SessionEvent::SignedIn);
    }

    /// Clear the token
    ///
    /// Signing out while already signed out leaves the state unchanged and
    /// notifies nobody, but still removes any stored token.
    pub fn sign_out(&self) {
        let changed = self.state_tx.send_if_modified(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.enqueue(PersistOp::Remove);
            state.session.take().is_some()
        });

        if changed {
            tracing::debug!("Signed out");
            let _ = self.events_tx.send(SessionEvent::SignedOut);
        }
    }

    /// Current `(session, loading)` pair
    pub fn read(&self) -> SessionSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Current state machine phase
    pub fn phase(&self) -> SessionPhase {
        self.state_tx.borrow().phase()
    }

    /// Current token, if any
    pub fn session(&self) -> Option<SessionToken> {
        self.state_tx.borrow().session.clone()
    }

    /// Whether the initial restore is still running
    pub fn is_loading(&self) -> bool {
        self.state_tx.borrow().is_loading
    }

    /// Whether restored and signed in
    pub fn is_authenticated(&self) -> bool {
        self.state_tx.borrow().is_authenticated()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Subscribe to session events
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Wait until every persistence operation queued so far has been applied
    ///
    /// Returns immediately after `dispose`.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        let queued = self
            .persist_tx
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(PersistOp::Flush(ack_tx)).is_ok());

        if queued {
            let _ = ack_rx.await;
        }
    }

    /// Stop persisting changes
    ///
    /// Drains queued writes before returning. Later sign-in/sign-out calls
    /// still update memory but are not persisted. Calling twice is harmless.
    pub async fn dispose(&self) {
        let sender = self.persist_tx.lock().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Session persistence worker ended abnormally");
            }
        }

        tracing::debug!("Session manager disposed");
        let _ = self.events_tx.send(SessionEvent::Disposed);
    }

    fn enqueue(&self, op: PersistOp) {
        match self.persist_tx.lock().as_ref() {
            Some(tx) => {
                if tx.send(op).is_err() {
                    tracing::warn!("Session persistence worker is gone; change kept in memory only");
                }
            }
            None => tracing::debug!("Session manager disposed; change kept in memory only"),
        }
    }
}

async fn run_persistence(
    store: Arc<dyn KeyValueStore>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<PersistOp>,
) {
    while let Some(op) = rx.recv().await {
        match op {
            PersistOp::Write(token) => {
                if let Err(e) = store.set(&key, token.as_str()).await {
                    tracing::warn!(key = %key, error = %e, "Failed to persist session");
                }
            }
            PersistOp::Remove => {
                if let Err(e) = store.delete(&key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to remove persisted session");
                }
            }
            PersistOp::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
