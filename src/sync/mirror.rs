// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Read-only mirror of a remote session.
//!
//! A participant subscribes to one session document and replaces its
//! whole state with every inbound snapshot. The mirror holds no authority
//! and has no write path.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::SessionError;
use crate::session::{SessionCode, SessionDocument, SessionView};
use crate::store::{CancelHandle, SessionDocumentStore, Subscription, SubscriptionEvent};

/// Connection state of a mirror
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorState {
    /// Waiting for the first snapshot
    Connecting,
    /// Following the session; holds the latest snapshot
    Connected(SessionDocument),
    /// Stopped following; holds the reason
    Error(SessionError),
}

impl MirrorState {
    /// Check if a snapshot is being followed
    pub fn is_connected(&self) -> bool {
        matches!(self, MirrorState::Connected(_))
    }

    /// Latest snapshot, if connected
    pub fn document(&self) -> Option<&SessionDocument> {
        match self {
            MirrorState::Connected(document) => Some(document),
            _ => None,
        }
    }

    /// Failure reason, if in error
    pub fn error(&self) -> Option<&SessionError> {
        match self {
            MirrorState::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Participant-side projection of one session document
pub struct RemoteSessionMirror {
    store: Arc<dyn SessionDocumentStore>,
    code: SessionCode,
    retry: RetryPolicy,
    state: Arc<watch::Sender<MirrorState>>,
    active: Arc<Mutex<Option<CancelHandle>>>,
    task: Option<JoinHandle<()>>,
}

impl RemoteSessionMirror {
    /// Start following `code`. Does not reconnect after a failure.
    pub fn subscribe(store: Arc<dyn SessionDocumentStore>, code: SessionCode) -> Self {
        Self::with_retry(store, code, RetryPolicy::none())
    }

    /// Start following `code`, reconnecting after transport failures as
    /// `retry` allows
    ///
    /// Must be called inside a Tokio runtime.
    pub fn with_retry(
        store: Arc<dyn SessionDocumentStore>,
        code: SessionCode,
        retry: RetryPolicy,
    ) -> Self {
        let (state, _) = watch::channel(MirrorState::Connecting);
        let mut mirror = Self {
            store,
            code,
            retry,
            state: Arc::new(state),
            active: Arc::new(Mutex::new(None)),
            task: None,
        };
        mirror.spawn();
        mirror
    }

    fn spawn(&mut self) {
        self.state.send_replace(MirrorState::Connecting);
        self.task = Some(tokio::spawn(run_mirror(
            Arc::clone(&self.store),
            self.code.clone(),
            self.retry,
            Arc::clone(&self.state),
            Arc::clone(&self.active),
        )));
    }

    /// Unregister the live subscription, if any, without waiting for the task
    fn release(&self) {
        let handle = match self.active.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.cancel();
        }
    }

    /// Abort the task and wait until it has stopped touching the state
    async fn halt(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        self.release();
    }

    /// Session being followed
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// Copy of the current state
    pub fn state(&self) -> MirrorState {
        self.state.borrow().clone()
    }

    /// Watch state changes
    pub fn states(&self) -> watch::Receiver<MirrorState> {
        self.state.subscribe()
    }

    /// Display view of the latest snapshot
    pub fn view(&self) -> Option<SessionView> {
        self.state.borrow().document().map(SessionView::from_document)
    }

    /// Drop the current subscription and start a new one
    ///
    /// The old task has fully stopped before the new one starts, so no
    /// stale state can follow the new `Connecting`.
    pub async fn resubscribe(&mut self) {
        self.halt().await;
        info!("Resubscribing to session {}", self.code);
        self.spawn();
    }

    /// Stop following and release the subscription
    pub async fn unsubscribe(mut self) {
        self.halt().await;
        info!("Unsubscribed from session {}", self.code);
    }
}

impl Drop for RemoteSessionMirror {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.release();
    }
}

async fn run_mirror(
    store: Arc<dyn SessionDocumentStore>,
    code: SessionCode,
    retry: RetryPolicy,
    state: Arc<watch::Sender<MirrorState>>,
    active: Arc<Mutex<Option<CancelHandle>>>,
) {
    let mut attempts = 0;
    loop {
        state.send_replace(MirrorState::Connecting);
        info!("Connecting to session {}", code);

        let error = match store.subscribe(&code).await {
            Ok(mut subscription) => {
                if let Ok(mut slot) = active.lock() {
                    *slot = Some(subscription.cancel_handle());
                }
                follow(&mut subscription, &state, &mut attempts).await
            }
            Err(e) => e,
        };

        let reconnect = error.is_transport() && retry.allows(attempts);
        warn!("Lost session {}: {}", code, error);
        state.send_replace(MirrorState::Error(error));
        if !reconnect {
            return;
        }

        attempts += 1;
        debug!("Reconnect attempt {} for {} in {:?}", attempts, code, retry.backoff());
        tokio::time::sleep(retry.backoff()).await;
    }
}

/// Track snapshots until the subscription fails
async fn follow(
    subscription: &mut Subscription,
    state: &watch::Sender<MirrorState>,
    attempts: &mut u32,
) -> SessionError {
    loop {
        match subscription.next().await {
            Some(SubscriptionEvent::Snapshot(document)) => {
                *attempts = 0;
                debug!(
                    "Session {} snapshot: chord {} playing {}",
                    subscription.code(),
                    document.current_chord_index,
                    document.is_playing
                );
                state.send_replace(MirrorState::Connected(document));
            }
            Some(SubscriptionEvent::Error(error)) => return error,
            None => return SessionError::Transport("Subscription ended".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::session::{Bpm, SessionPatch};
    use crate::store::InMemoryStore;
    use chrono::Utc;
    use std::time::Duration;

    async fn store_with_session(code: &SessionCode) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.open().await.unwrap();
        let progression = Catalog::builtin().progression("turnaround").unwrap().clone();
        let document = SessionDocument::new(Bpm::DEFAULT, progression, Utc::now());
        store.create(code, &document).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_mirror_connects_and_follows() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mirror = RemoteSessionMirror::subscribe(Arc::new(store.clone()), code.clone());
        let mut states = mirror.states();

        states.wait_for(MirrorState::is_connected).await.unwrap();
        assert_eq!(mirror.view().unwrap().current_chord.as_deref(), Some("am"));

        store.merge_write(&code, &SessionPatch::chord_index(1)).await.unwrap();
        states
            .wait_for(|s| s.document().map(|d| d.current_chord_index) == Some(1))
            .await
            .unwrap();

        let view = mirror.view().unwrap();
        assert_eq!(view.current_chord.as_deref(), Some("d7"));
        assert_eq!(view.next_chord.as_deref(), Some("g"));
        assert_eq!(view.progress_fraction, 0.5);
    }

    #[tokio::test]
    async fn test_missing_session_is_an_error() {
        let store = InMemoryStore::new();
        store.open().await.unwrap();
        let mirror =
            RemoteSessionMirror::subscribe(Arc::new(store), SessionCode::parse("NONE").unwrap());
        let mut states = mirror.states();

        let state = states.wait_for(|s| s.error().is_some()).await.unwrap().clone();
        assert!(state.error().unwrap().is_not_found());
        assert!(mirror.view().is_none());
    }

    #[tokio::test]
    async fn test_removed_session_drops_stale_snapshot() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mirror = RemoteSessionMirror::subscribe(Arc::new(store.clone()), code.clone());
        let mut states = mirror.states();
        states.wait_for(MirrorState::is_connected).await.unwrap();

        store.remove(&code).unwrap();
        states.wait_for(|s| s.error().is_some()).await.unwrap();

        assert!(mirror.state().error().unwrap().is_not_found());
        assert!(mirror.view().is_none());
    }

    #[tokio::test]
    async fn test_no_reconnect_by_default() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mirror = RemoteSessionMirror::subscribe(Arc::new(store.clone()), code.clone());
        let mut states = mirror.states();
        states.wait_for(MirrorState::is_connected).await.unwrap();

        store.close().await.unwrap();
        states.wait_for(|s| s.error().is_some()).await.unwrap();
        store.open().await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(mirror.state().error().unwrap().is_transport());
        assert_eq!(store.subscriber_count(&code), 0);
    }

    #[tokio::test]
    async fn test_resubscribe_recovers() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mut mirror = RemoteSessionMirror::subscribe(Arc::new(store.clone()), code.clone());
        let mut states = mirror.states();
        states.wait_for(MirrorState::is_connected).await.unwrap();

        store.close().await.unwrap();
        states.wait_for(|s| s.error().is_some()).await.unwrap();
        store.open().await.unwrap();

        mirror.resubscribe().await;
        let mut states = mirror.states();
        states.wait_for(MirrorState::is_connected).await.unwrap();
        assert_eq!(store.subscriber_count(&code), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_reconnects_after_backoff() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mirror = RemoteSessionMirror::with_retry(
            Arc::new(store.clone()),
            code.clone(),
            RetryPolicy::attempts(1, Duration::from_millis(500)),
        );
        let mut states = mirror.states();
        states.wait_for(MirrorState::is_connected).await.unwrap();

        store.close().await.unwrap();
        states.wait_for(|s| s.error().is_some()).await.unwrap();
        store.open().await.unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(mirror.state().is_connected());
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_subscription() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mirror = RemoteSessionMirror::subscribe(Arc::new(store.clone()), code.clone());
        let mut states = mirror.states();
        states.wait_for(MirrorState::is_connected).await.unwrap();
        assert_eq!(store.subscriber_count(&code), 1);

        mirror.unsubscribe().await;
        assert_eq!(store.subscriber_count(&code), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription_immediately() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mirror = RemoteSessionMirror::subscribe(Arc::new(store.clone()), code.clone());
        mirror.states().wait_for(MirrorState::is_connected).await.unwrap();
        assert_eq!(store.subscriber_count(&code), 1);

        drop(mirror);
        assert_eq!(store.subscriber_count(&code), 0);
    }

    #[tokio::test]
    async fn test_resubscribe_discards_old_task() {
        let code = SessionCode::parse("ABCD").unwrap();
        let store = store_with_session(&code).await;
        let mut mirror = RemoteSessionMirror::subscribe(Arc::new(store.clone()), code.clone());
        mirror.states().wait_for(MirrorState::is_connected).await.unwrap();

        mirror.resubscribe().await;
        assert_eq!(mirror.state(), MirrorState::Connecting);
        assert_eq!(store.subscriber_count(&code), 0);

        mirror.states().wait_for(MirrorState::is_connected).await.unwrap();
        assert_eq!(store.subscriber_count(&code), 1);
    }
}
