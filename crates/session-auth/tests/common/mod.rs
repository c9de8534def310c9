//! Test doubles for the session layer's collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use credential_store::{
    CredentialStore, MemoryStorage, SessionRecord, SessionStorage, StorageError, StorageResult,
    TokenFragment, TokenSet, UserProfile,
};
use oauth_exchange::{ExchangeError, ExchangeResult, OAuthExchange};
use parking_lot::Mutex;
use session_auth::{
    NavigationMode, Navigator, Notification, NotificationLevel, Notifier, Route, SessionManager,
    SessionState,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use url::Url;

/// A scripted proxy failure (`ExchangeError` is not `Clone`).
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: u16,
    pub message: Option<String>,
}

impl Failure {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            message: None,
        }
    }

    fn to_error(&self) -> ExchangeError {
        ExchangeError::Status {
            status: self.status,
            message: self.message.clone(),
        }
    }
}

pub struct FakeExchange {
    pub authorization_url: Mutex<Result<Url, Failure>>,
    pub code_result: Mutex<Result<SessionRecord, Failure>>,
    pub refresh_results: Mutex<Vec<Result<TokenFragment, Failure>>>,
    pub code_calls: Mutex<Vec<String>>,
    pub refresh_calls: AtomicUsize,
    refresh_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub refresh_started: Notify,
    url_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub url_started: Notify,
}

impl Default for FakeExchange {
    fn default() -> Self {
        Self {
            authorization_url: Mutex::new(Ok(Url::parse(
                "https://www.pinterest.com/oauth/?client_id=1&response_type=code",
            )
            .unwrap())),
            code_result: Mutex::new(Err(Failure::status(500))),
            refresh_results: Mutex::new(Vec::new()),
            code_calls: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            refresh_gate: Mutex::new(None),
            refresh_started: Notify::new(),
            url_gate: Mutex::new(None),
            url_started: Notify::new(),
        }
    }
}

impl FakeExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code_result(self, result: Result<SessionRecord, Failure>) -> Self {
        *self.code_result.lock() = result;
        self
    }

    /// Queue refresh results; consumed in order, the last one repeats.
    pub fn with_refresh_results(self, results: Vec<Result<TokenFragment, Failure>>) -> Self {
        *self.refresh_results.lock() = results;
        self
    }

    /// Hold the next refresh until the returned sender fires.
    pub fn gate_refresh(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.refresh_gate.lock() = Some(rx);
        tx
    }

    /// Hold the next authorization URL fetch until the returned sender fires.
    pub fn gate_authorization_url(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.url_gate.lock() = Some(rx);
        tx
    }

    pub fn code_call_count(&self) -> usize {
        self.code_calls.lock().len()
    }

    pub fn refresh_call_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthExchange for FakeExchange {
    async fn authorization_url(&self) -> ExchangeResult<Url> {
        let gate = self.url_gate.lock().take();
        self.url_started.notify_one();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.authorization_url.lock().clone().map_err(|f| f.to_error())
    }

    async fn exchange_code(&self, code: &str) -> ExchangeResult<SessionRecord> {
        self.code_calls.lock().push(code.to_string());
        self.code_result.lock().clone().map_err(|f| f.to_error())
    }

    async fn refresh_token(&self, _refresh_token: &str) -> ExchangeResult<TokenFragment> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.refresh_gate.lock().take();
        self.refresh_started.notify_one();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut results = self.refresh_results.lock();
        let result = if results.len() > 1 {
            results.remove(0)
        } else {
            results
                .first()
                .cloned()
                .unwrap_or_else(|| Err(Failure::status(500)))
        };
        result.map_err(|f| f.to_error())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub navigations: Mutex<Vec<(Route, NavigationMode)>>,
    pub external: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn last(&self) -> Option<(Route, NavigationMode)> {
        self.navigations.lock().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route, mode: NavigationMode) {
        self.navigations.lock().push((route, mode));
    }

    fn redirect_external(&self, url: &Url) {
        self.external.lock().push(url.clone());
    }
}

/// Storage whose writes always fail.
#[derive(Default)]
pub struct FailingStorage;

impl SessionStorage for FailingStorage {
    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Backend("quota exceeded".to_string()))
    }

    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn delete(&self, _key: &str) -> StorageResult<bool> {
        Err(StorageError::Backend("quota exceeded".to_string()))
    }
}

pub fn alice() -> SessionRecord {
    SessionRecord::new(
        TokenSet::new("x", 3600, "bearer"),
        UserProfile::new("alice"),
    )
}

pub fn alice_with_refresh() -> SessionRecord {
    SessionRecord::new(
        TokenSet::new("x", 3600, "bearer").with_refresh_token("r1"),
        UserProfile::new("alice").with_attribute("id", "42"),
    )
}

pub fn bob() -> SessionRecord {
    SessionRecord::new(
        TokenSet::new("y", 3600, "bearer").with_refresh_token("ry"),
        UserProfile::new("bob"),
    )
}

pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub store: CredentialStore,
    pub exchange: Arc<FakeExchange>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub manager: Arc<SessionManager>,
}

impl Harness {
    pub fn new(exchange: FakeExchange) -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), exchange)
    }

    pub fn with_storage(storage: Arc<MemoryStorage>, exchange: FakeExchange) -> Self {
        let store = CredentialStore::new(storage.clone());
        let exchange = Arc::new(exchange);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let manager = Arc::new(SessionManager::new(
            store.clone(),
            exchange.clone(),
            notifier.clone(),
            navigator.clone(),
        ));
        Self {
            storage,
            store,
            exchange,
            notifier,
            navigator,
            manager,
        }
    }

    /// A manager whose initial load already resolved with `record`.
    pub async fn authenticated(record: SessionRecord, exchange: FakeExchange) -> Self {
        let harness = Self::new(exchange);
        harness.store.save(&record).unwrap();
        harness.manager.initialize().await;
        assert_eq!(harness.manager.state(), SessionState::Authenticated(record));
        harness
    }
}
