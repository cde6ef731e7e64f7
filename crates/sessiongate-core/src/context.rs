//! The session context: the one owner of [`SessionState`].
//!
//! Every transition runs through the same pipeline, serialized by a single
//! dispatch lock:
//!
//! 1. apply the action with the pure reducer
//! 2. log it
//! 3. mirror the new state to storage (failures are logged, never raised)
//! 4. publish it to observers
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use sessiongate_core::{MemoryStorage, RouteRequest, SessionContext};
//! # use sessiongate_core::{Authority, Credentials, Result, Token};
//! # struct Remote;
//! # #[async_trait::async_trait]
//! # impl Authority for Remote {
//! #     async fn exchange(&self, _: &Credentials) -> Result<Token> { Ok(Token::new("t")) }
//! # }
//!
//! # async fn example() -> Result<()> {
//! let session = SessionContext::restore(Remote, MemoryStorage::new(), Duration::from_secs(2)).await;
//! session.login("alice", "hunter2").await?;
//!
//! let nav = session.navigate(&RouteRequest::new("/dashboard"));
//! println!("rendering {}", nav.view);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, instrument, warn};

use crate::credentials::Credentials;
use crate::error::{Error, ExchangeError, StorageError, TransportError};
use crate::routing::{Decision, Navigation, RouteRequest, Router, guard};
use crate::state::{Action, SessionState};
use crate::token::Token;
use crate::traits::{Authority, SessionStorage};
use crate::Result;

/// Shared handle to the session. Cheap to clone; clones see the same state.
pub struct SessionContext<A, S> {
    inner: Arc<ContextInner<A, S>>,
}

struct ContextInner<A, S> {
    authority: A,
    storage: S,
    state: watch::Sender<SessionState>,
    /// Dispatch queue. The guarded value is the logical session epoch, bumped
    /// on every sign-out so in-flight exchanges can tell they are stale.
    dispatch: Mutex<u64>,
}

impl<A, S> Clone for SessionContext<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, S> SessionContext<A, S>
where
    A: Authority + 'static,
    S: SessionStorage + 'static,
{
    /// Build a context from whatever `storage` last saved.
    ///
    /// Waits at most `timeout` for storage. Missing, unreadable or late data
    /// yields a signed-out session; restoring never fails.
    #[instrument(skip_all, fields(timeout_ms = timeout.as_millis() as u64))]
    pub async fn restore(authority: A, storage: S, timeout: Duration) -> Self {
        let state = match tokio::time::timeout(timeout, storage.load()).await {
            Ok(Ok(Some(state))) => {
                info!(authenticated = state.is_authenticated(), "Session restored");
                state
            }
            Ok(Ok(None)) => {
                debug!("No saved session");
                SessionState::default()
            }
            Ok(Err(e)) => {
                warn!(error = %Error::RestoreFailed(e), "Starting signed out");
                SessionState::default()
            }
            Err(_) => {
                let e = StorageError::Timeout {
                    duration_ms: timeout.as_millis() as u64,
                };
                warn!(error = %Error::RestoreFailed(e), "Starting signed out");
                SessionState::default()
            }
        };

        Self::with_state(authority, storage, state)
    }

    /// Build a context around an explicit initial state.
    pub fn with_state(authority: A, storage: S, state: SessionState) -> Self {
        let (sender, _) = watch::channel(state);
        Self {
            inner: Arc::new(ContextInner {
                authority,
                storage,
                state: sender,
                dispatch: Mutex::new(0),
            }),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Returns true if a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Observe committed states. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Committed states as a stream, starting with the current one.
    pub fn changes(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.subscribe())
    }

    /// Run `action` through the pipeline and return the resulting state.
    ///
    /// `DELETE_TOKEN` signs out exactly like [`logout`](Self::logout). The
    /// exchange actions belong to [`login`](Self::login) and are refused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedAction`] for `REQUEST_TOKEN`, `RECEIVE_TOKEN`
    /// and `RECEIVE_ERROR`.
    pub async fn dispatch(&self, action: Action) -> Result<SessionState> {
        let mut queue = self.inner.dispatch.lock().await;
        match action {
            Action::DeleteToken => Ok(self.sign_out(&mut queue).await),
            Action::RequestToken | Action::ReceiveToken { .. } | Action::ReceiveError { .. } => {
                warn!(action = action.name(), "Refusing exchange action outside login");
                Err(Error::ReservedAction(action.name()))
            }
            Action::Unknown => Ok(self.commit(&action).await),
        }
    }

    /// Submit the login form.
    ///
    /// Blank fields are rejected before anything is dispatched. Otherwise
    /// `REQUEST_TOKEN` is committed, the authority is asked once, and exactly
    /// one `RECEIVE_TOKEN` or `RECEIVE_ERROR` follows, unless the user signed
    /// out in the meantime, in which case the response is dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for blank fields
    /// - [`Error::LoginInProgress`] if another login has not finished
    /// - [`Error::InvalidCredentials`] / [`Error::ExchangeFailed`] from the authority
    /// - [`Error::Superseded`] if a sign-out overtook the exchange
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Token> {
        let credentials = Credentials::new(username, password);
        credentials.validate()?;

        let epoch = {
            let queue = self.inner.dispatch.lock().await;
            if self.inner.state.borrow().is_fetching {
                warn!("Ignoring login while another is in flight");
                return Err(Error::LoginInProgress);
            }
            self.commit(&Action::RequestToken).await;
            *queue
        };

        // Detached so a dropped caller cannot leave the session stuck fetching.
        let ctx = self.clone();
        let task = tokio::spawn(async move {
            let outcome = ctx.inner.authority.exchange(&credentials).await;
            ctx.settle(epoch, outcome).await
        });

        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                let err = Error::ExchangeFailed(ExchangeError::Transport(TransportError::Http {
                    message: format!("exchange aborted: {}", join_error),
                }));
                self.settle(epoch, Err(err)).await
            }
        }
    }

    /// Sign out. Local only: nothing is sent to the authority.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> SessionState {
        let mut epoch = self.inner.dispatch.lock().await;
        self.sign_out(&mut epoch).await
    }

    /// Guard `view` against the current state.
    pub fn guard<V>(&self, view: V, request: &RouteRequest) -> Decision<V> {
        guard(view, request, &self.inner.state.borrow())
    }

    /// Route `request` against the current state, following redirects.
    pub fn navigate(&self, request: &RouteRequest) -> Navigation {
        Router.navigate(request, &self.inner.state.borrow())
    }

    /// Record the outcome of the exchange started in `epoch`.
    async fn settle(&self, epoch: u64, outcome: Result<Token>) -> Result<Token> {
        let queue = self.inner.dispatch.lock().await;
        if *queue != epoch {
            info!(started = epoch, current = *queue, "Discarding stale login response");
            return Err(Error::Superseded);
        }

        match outcome {
            Ok(token) => {
                self.commit(&Action::receive_token(token.clone())).await;
                info!("Signed in");
                Ok(token)
            }
            Err(e) => {
                self.commit(&Action::receive_error(e.user_message())).await;
                warn!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    /// Start a new epoch, reset the state and drop the stored session.
    ///
    /// Storage is cleared even when the state was already signed out, since
    /// it may hold a session this process never managed to restore.
    async fn sign_out(&self, epoch: &mut u64) -> SessionState {
        *epoch += 1;
        let state = self.commit(&Action::DeleteToken).await;
        if let Err(e) = self.inner.storage.clear().await {
            warn!(error = %e, "Failed to clear saved session");
        }
        info!("Signed out");
        state
    }

    /// Apply, log, persist, publish. Callers must hold the dispatch lock.
    async fn commit(&self, action: &Action) -> SessionState {
        let previous = self.state();
        let next = previous.clone().apply(action);

        debug!(
            action = action.name(),
            was_authenticated = previous.is_authenticated(),
            authenticated = next.is_authenticated(),
            fetching = next.is_fetching,
            error = next.error.as_deref(),
            "Dispatch"
        );

        if next == previous {
            return next;
        }

        if let Err(e) = self.inner.storage.save(&next).await {
            warn!(error = %e, "Failed to persist session");
        }

        self.inner.state.send_replace(next.clone());
        next
    }
}

impl<A, S> fmt::Debug for SessionContext<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::ProtocolError;
    use crate::persist::{MemoryStorage, PersistedSession};
    use crate::routing::{Location, View};

    const RESTORE: Duration = Duration::from_secs(2);

    #[derive(Clone, Copy)]
    enum Reply {
        Token(&'static str),
        Reject,
        ServerError,
    }

    /// Authority that answers with a fixed reply, optionally held until
    /// released.
    #[derive(Clone)]
    struct FakeAuthority {
        reply: Reply,
        calls: Arc<AtomicUsize>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeAuthority {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Arc::new(AtomicUsize::new(0)),
                gate: None,
            }
        }

        fn gated(reply: Reply) -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let mut authority = Self::new(reply);
            authority.gate = Some(Arc::clone(&gate));
            (authority, gate)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Authority for FakeAuthority {
        async fn exchange(&self, _credentials: &Credentials) -> Result<Token> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.reply {
                Reply::Token(t) => Ok(Token::new(t)),
                Reply::Reject => Err(Error::InvalidCredentials),
                Reply::ServerError => Err(Error::ExchangeFailed(ExchangeError::Protocol(
                    ProtocolError::new(500, Some("database on fire".to_string())),
                ))),
            }
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl SessionStorage for BrokenStorage {
        async fn save(&self, _state: &SessionState) -> std::result::Result<(), StorageError> {
            Err(StorageError::Io {
                message: "disk full".to_string(),
            })
        }

        async fn load(&self) -> std::result::Result<Option<SessionState>, StorageError> {
            Err(StorageError::Io {
                message: "permission denied".to_string(),
            })
        }

        async fn clear(&self) -> std::result::Result<(), StorageError> {
            Ok(())
        }
    }

    /// Fails the first load, then behaves like the storage it wraps.
    struct FlakyStorage {
        inner: MemoryStorage,
        failed_once: AtomicBool,
    }

    #[async_trait]
    impl SessionStorage for FlakyStorage {
        async fn save(&self, state: &SessionState) -> std::result::Result<(), StorageError> {
            self.inner.save(state).await
        }

        async fn load(&self) -> std::result::Result<Option<SessionState>, StorageError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(StorageError::Io {
                    message: "device busy".to_string(),
                });
            }
            self.inner.load().await
        }

        async fn clear(&self) -> std::result::Result<(), StorageError> {
            self.inner.clear().await
        }
    }

    struct StalledStorage;

    #[async_trait]
    impl SessionStorage for StalledStorage {
        async fn save(&self, _state: &SessionState) -> std::result::Result<(), StorageError> {
            Ok(())
        }

        async fn load(&self) -> std::result::Result<Option<SessionState>, StorageError> {
            std::future::pending().await
        }

        async fn clear(&self) -> std::result::Result<(), StorageError> {
            Ok(())
        }
    }

    async fn context(
        authority: FakeAuthority,
        storage: MemoryStorage,
    ) -> SessionContext<FakeAuthority, MemoryStorage> {
        SessionContext::restore(authority, storage, RESTORE).await
    }

    async fn wait_until_fetching(session: &SessionContext<FakeAuthority, MemoryStorage>) {
        session
            .subscribe()
            .wait_for(|s| s.is_fetching)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn successful_login_renders_dashboard() {
        let session = context(FakeAuthority::new(Reply::Token("abc123")), MemoryStorage::new()).await;

        let token = session.login("alice", "hunter2").await.unwrap();

        assert_eq!(token, Token::new("abc123"));
        let state = session.state();
        assert_eq!(state.token, Some(Token::new("abc123")));
        assert!(!state.is_fetching);
        assert!(state.date_received.is_some());
        assert_eq!(
            session.navigate(&RouteRequest::new("/dashboard")).view,
            View::Dashboard
        );
    }

    #[tokio::test]
    async fn rejected_login_records_message_and_still_redirects() {
        let session = context(FakeAuthority::new(Reply::Reject), MemoryStorage::new()).await;

        let err = session.login("alice", "wrong").await.unwrap_err();

        assert!(matches!(err, Error::InvalidCredentials));
        let state = session.state();
        assert!(state.token.is_none());
        assert!(!state.is_fetching);
        assert_eq!(state.error.as_deref(), Some("Invalid username or password."));
        assert_eq!(
            session.guard((), &RouteRequest::new("/dashboard")),
            Decision::Redirect {
                to: "/login".to_string(),
                from: Some(Location::new("/dashboard")),
            }
        );
    }

    #[tokio::test]
    async fn server_failure_keeps_cause_out_of_state() {
        let session = context(FakeAuthority::new(Reply::ServerError), MemoryStorage::new()).await;

        let err = session.login("alice", "hunter2").await.unwrap_err();

        assert!(matches!(err, Error::ExchangeFailed(_)));
        assert!(err.to_string().contains("database on fire"));
        let recorded = session.state().error.unwrap();
        assert!(!recorded.contains("database"));
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_authority() {
        let authority = FakeAuthority::new(Reply::Token("abc123"));
        let session = context(authority.clone(), MemoryStorage::new()).await;
        let mut observer = session.subscribe();

        let err = session.login("", "hunter2").await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(authority.calls(), 0);
        assert_eq!(session.state(), SessionState::default());
        assert!(!observer.has_changed().unwrap());
    }

    #[tokio::test]
    async fn duplicate_login_is_rejected_while_fetching() {
        let (authority, gate) = FakeAuthority::gated(Reply::Token("abc123"));
        let session = context(authority.clone(), MemoryStorage::new()).await;

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.login("alice", "hunter2").await }
        });
        wait_until_fetching(&session).await;

        let second = session.login("alice", "hunter2").await;
        assert!(matches!(second, Err(Error::LoginInProgress)));

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), Token::new("abc123"));
        assert_eq!(authority.calls(), 1);
    }

    #[tokio::test]
    async fn response_after_logout_is_discarded() {
        let (authority, gate) = FakeAuthority::gated(Reply::Token("late"));
        let storage = MemoryStorage::new();
        let session = context(authority, storage.clone()).await;

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.login("alice", "hunter2").await }
        });
        wait_until_fetching(&session).await;

        session.logout().await;
        gate.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(Error::Superseded)));
        assert_eq!(session.state(), SessionState::default());
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dispatched_sign_out_also_discards_in_flight_response() {
        let (authority, gate) = FakeAuthority::gated(Reply::Token("late"));
        let storage = MemoryStorage::new();
        let session = context(authority, storage.clone()).await;

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.login("alice", "hunter2").await }
        });
        wait_until_fetching(&session).await;

        session.dispatch(Action::DeleteToken).await.unwrap();
        gate.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(Error::Superseded)));
        assert!(!session.is_authenticated());
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exchange_actions_cannot_be_dispatched_directly() {
        let storage = MemoryStorage::new();
        let session = context(FakeAuthority::new(Reply::Token("abc123")), storage.clone()).await;

        for action in [
            Action::RequestToken,
            Action::receive_token(Token::new("forged")),
            Action::receive_error("nope"),
        ] {
            let err = session.dispatch(action).await.unwrap_err();
            assert!(matches!(err, Error::ReservedAction(_)));
        }

        assert_eq!(session.state(), SessionState::default());
        assert!(storage.blob().is_none());

        // Nothing is left fetching, so a real login still goes through.
        session.login("alice", "hunter2").await.unwrap();
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn request_is_observed_before_receive() {
        let (authority, gate) = FakeAuthority::gated(Reply::Token("abc123"));
        let session = context(authority, MemoryStorage::new()).await;
        let mut observer = session.subscribe();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.login("alice", "hunter2").await }
        });

        observer.changed().await.unwrap();
        {
            let seen = observer.borrow_and_update();
            assert!(seen.is_fetching);
            assert!(seen.token.is_none());
        }

        gate.notify_one();
        observer.changed().await.unwrap();
        assert_eq!(observer.borrow().token, Some(Token::new("abc123")));
        pending.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn restart_restores_without_login() {
        let storage = MemoryStorage::new();
        let first = context(FakeAuthority::new(Reply::Token("abc123")), storage.clone()).await;
        first.login("alice", "hunter2").await.unwrap();
        drop(first);

        let authority = FakeAuthority::new(Reply::Reject);
        let restarted = context(authority.clone(), storage).await;

        assert_eq!(restarted.state().token, Some(Token::new("abc123")));
        assert_eq!(
            restarted.navigate(&RouteRequest::new("/dashboard")).view,
            View::Dashboard
        );
        assert_eq!(authority.calls(), 0);
    }

    #[tokio::test]
    async fn logout_resets_and_redirects() {
        let session = context(FakeAuthority::new(Reply::Token("abc123")), MemoryStorage::new()).await;
        session.login("alice", "hunter2").await.unwrap();

        let state = session.logout().await;

        assert_eq!(state, SessionState::default());
        let nav = session.navigate(&RouteRequest::new("/dashboard"));
        assert_eq!(nav.view, View::Login);
        assert_eq!(nav.props["from"]["pathname"], "/dashboard");
    }

    #[tokio::test]
    async fn login_works_again_after_superseded_attempt() {
        let (authority, gate) = FakeAuthority::gated(Reply::Token("fresh"));
        let session = context(authority, MemoryStorage::new()).await;

        let stale = tokio::spawn({
            let session = session.clone();
            async move { session.login("alice", "hunter2").await }
        });
        wait_until_fetching(&session).await;
        session.logout().await;
        gate.notify_one();
        assert!(matches!(stale.await.unwrap(), Err(Error::Superseded)));

        gate.notify_one();
        assert_eq!(
            session.login("alice", "hunter2").await.unwrap(),
            Token::new("fresh")
        );
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn corrupt_storage_starts_signed_out() {
        let storage = MemoryStorage::with_blob("{\"token\": 42");
        let session = context(FakeAuthority::new(Reply::Reject), storage).await;
        assert_eq!(session.state(), SessionState::default());
    }

    #[tokio::test]
    async fn unreadable_storage_starts_signed_out_and_login_still_works() {
        let session = SessionContext::restore(
            FakeAuthority::new(Reply::Token("abc123")),
            BrokenStorage,
            RESTORE,
        )
        .await;
        assert!(!session.is_authenticated());

        session.login("alice", "hunter2").await.unwrap();
        assert!(session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_storage_times_out() {
        let session = SessionContext::restore(
            FakeAuthority::new(Reply::Reject),
            StalledStorage,
            Duration::from_millis(100),
        )
        .await;
        assert_eq!(session.state(), SessionState::default());
    }

    #[tokio::test]
    async fn unknown_action_neither_persists_nor_notifies() {
        let storage = MemoryStorage::new();
        let session = context(FakeAuthority::new(Reply::Reject), storage.clone()).await;
        let mut observer = session.subscribe();

        let state = session.dispatch(Action::Unknown).await.unwrap();

        assert_eq!(state, SessionState::default());
        assert!(storage.blob().is_none());
        assert!(!observer.has_changed().unwrap());
    }

    #[tokio::test]
    async fn every_transition_is_persisted() {
        let (authority, gate) = FakeAuthority::gated(Reply::Token("abc123"));
        let storage = MemoryStorage::new();
        let session = context(authority, storage.clone()).await;

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.login("alice", "hunter2").await }
        });
        wait_until_fetching(&session).await;
        assert!(storage.blob().is_some());

        gate.notify_one();
        pending.await.unwrap().unwrap();
        let saved = storage.load().await.unwrap().unwrap();
        assert_eq!(saved.token, Some(Token::new("abc123")));

        session.logout().await;
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_after_failed_restore_clears_stored_session() {
        let signed_in = SessionState::default().apply(&Action::receive_token(Token::new("abc123")));
        let disk = MemoryStorage::with_blob(PersistedSession::encode(&signed_in).unwrap());
        let storage = FlakyStorage {
            inner: disk.clone(),
            failed_once: AtomicBool::new(false),
        };

        let session =
            SessionContext::restore(FakeAuthority::new(Reply::Reject), storage, RESTORE).await;
        assert!(!session.is_authenticated());

        session.logout().await;
        drop(session);

        let restarted = context(FakeAuthority::new(Reply::Reject), disk).await;
        assert!(!restarted.is_authenticated());
        assert_eq!(
            restarted.navigate(&RouteRequest::new("/dashboard")).view,
            View::Login
        );
    }

    #[tokio::test]
    async fn changes_stream_yields_current_then_updates() {
        use tokio_stream::StreamExt;

        let session = context(FakeAuthority::new(Reply::Token("abc123")), MemoryStorage::new()).await;
        let mut changes = session.changes();

        assert_eq!(changes.next().await, Some(SessionState::default()));
        session.login("alice", "hunter2").await.unwrap();
        assert!(changes.next().await.unwrap().is_authenticated());
    }
}
