// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Replicated session document store.
//!
//! This module provides a trait-based abstraction over the document
//! service that replicates session state between devices, so the
//! controller and mirror can be handed any backend at construction.
//! The contract is deliberately small: create, read, merge-write and
//! subscribe, plus an explicit open/close lifecycle.

pub mod memory;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Result, SessionError};
use crate::session::{SessionCode, SessionDocument, SessionPatch};

pub use memory::InMemoryStore;

/// Backend holding one replicated document per session.
///
/// Merge-writes apply in arrival order with last-writer-wins per field.
/// There is no version counter and no conflict signal. A compare-and-merge
/// check can be added later by carrying a precondition in
/// [`SessionPatch`] without changing call sites.
#[async_trait]
pub trait SessionDocumentStore: Send + Sync {
    /// Connect to the backend. Other operations fail with
    /// [`SessionError::Transport`] until the store is open.
    async fn open(&self) -> Result<()>;

    /// Disconnect. Live subscriptions receive a terminal transport error.
    async fn close(&self) -> Result<()>;

    /// Check if the store is open
    fn is_open(&self) -> bool;

    /// Write a full document.
    ///
    /// No existence check is made: creating over an existing code
    /// replaces that session.
    async fn create(&self, code: &SessionCode, document: &SessionDocument) -> Result<()>;

    /// Fetch a document once
    async fn read(&self, code: &SessionCode) -> Result<SessionDocument>;

    /// Merge the set fields of `patch` into an existing document.
    ///
    /// The caller stamps `last_updated` before calling.
    async fn merge_write(&self, code: &SessionCode, patch: &SessionPatch) -> Result<()>;

    /// Watch a document.
    ///
    /// The current snapshot is delivered first, then one snapshot per
    /// write, including writes made by the subscriber itself. A missing
    /// document produces a terminal [`SessionError::NotFound`]; losing the
    /// connection produces a terminal [`SessionError::Transport`]. There
    /// is no automatic retry.
    async fn subscribe(&self, code: &SessionCode) -> Result<Subscription>;
}

/// Event delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// Full copy of the document after a write
    Snapshot(SessionDocument),
    /// Terminal failure; no further events follow
    Error(SessionError),
}

type CancelFn = Box<dyn FnOnce() + Send>;

/// Shared handle that unregisters a subscription from its backend.
///
/// Clones refer to the same registration. The hook runs at most once,
/// whichever clone or the [`Subscription`] itself fires first.
#[derive(Clone)]
pub struct CancelHandle {
    hook: Arc<Mutex<Option<CancelFn>>>,
}

impl CancelHandle {
    fn new(hook: CancelFn) -> Self {
        Self {
            hook: Arc::new(Mutex::new(Some(hook))),
        }
    }

    /// Unregister now. Later calls do nothing.
    pub fn cancel(&self) {
        let hook = match self.hook.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Check if the registration is still live
    pub fn is_active(&self) -> bool {
        self.hook.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Handle to a live document subscription.
///
/// Cancellation is immediate and happens on [`Subscription::cancel`], on
/// [`CancelHandle::cancel`], or when the handle is dropped.
pub struct Subscription {
    code: SessionCode,
    events: mpsc::UnboundedReceiver<SubscriptionEvent>,
    cancel: CancelHandle,
}

impl Subscription {
    /// Create a subscription from an event channel and a cancel hook
    pub fn new(
        code: SessionCode,
        events: mpsc::UnboundedReceiver<SubscriptionEvent>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            code,
            events,
            cancel: CancelHandle::new(Box::new(cancel)),
        }
    }

    /// Session this subscription watches
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// Handle that can unregister this subscription from outside its owner
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the next event. Returns `None` once the backend has
    /// stopped delivering.
    pub async fn next(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }

    /// Take an already-delivered event without waiting
    pub fn try_next(&mut self) -> Option<SubscriptionEvent> {
        self.events.try_recv().ok()
    }

    /// Stop receiving events
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.cancel.cancel();
        self.events.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("code", &self.code)
            .field("active", &self.cancel.is_active())
            .finish()
    }
}
