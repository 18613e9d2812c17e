// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-process document store.
//!
//! Documents are kept as JSON field maps, so a merge-write is a plain
//! per-field insert exactly as a document service applies it. Every write
//! fans a fresh snapshot out to the subscribers of that session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{SessionDocumentStore, Subscription, SubscriptionEvent};
use crate::error::{Result, SessionError};
use crate::session::{SessionCode, SessionDocument, SessionPatch};

type Fields = Map<String, Value>;

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<SubscriptionEvent>,
}

#[derive(Default)]
struct StoreInner {
    open: bool,
    documents: HashMap<SessionCode, Fields>,
    subscribers: HashMap<SessionCode, Vec<Subscriber>>,
    next_subscriber_id: u64,
}

impl StoreInner {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(SessionError::Transport("Document store is not open".to_string()))
        }
    }

    /// Send the current document to every subscriber of `code`
    fn fan_out(&mut self, code: &SessionCode) {
        let event = match self.documents.get(code) {
            Some(fields) => match SessionDocument::from_fields(fields) {
                Ok(document) => SubscriptionEvent::Snapshot(document),
                Err(e) => SubscriptionEvent::Error(e),
            },
            None => SubscriptionEvent::Error(SessionError::NotFound(code.to_string())),
        };
        let terminal = matches!(event, SubscriptionEvent::Error(_));

        if let Some(subscribers) = self.subscribers.get_mut(code) {
            subscribers.retain(|s| s.tx.send(event.clone()).is_ok());
            debug!("Fanned out {} to {} subscribers", code, subscribers.len());
            if terminal {
                subscribers.clear();
            }
            if subscribers.is_empty() {
                self.subscribers.remove(code);
            }
        }
    }

    fn remove_subscriber(&mut self, code: &SessionCode, id: u64) {
        if let Some(subscribers) = self.subscribers.get_mut(code) {
            subscribers.retain(|s| s.id != id);
            if subscribers.is_empty() {
                self.subscribers.remove(code);
            }
        }
    }
}

/// Document store held in process memory
///
/// Clones share the same documents.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryStore {
    /// Create a closed, empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| SessionError::Transport("Document store lock poisoned".to_string()))
    }

    /// Delete a session document.
    ///
    /// Subscribers receive a terminal [`SessionError::NotFound`]. Returns
    /// whether a document existed.
    pub fn remove(&self, code: &SessionCode) -> Result<bool> {
        let mut inner = self.lock()?;
        inner.ensure_open()?;
        let existed = inner.documents.remove(code).is_some();
        if existed {
            info!("Removed session {}", code);
        }
        inner.fan_out(code);
        Ok(existed)
    }

    /// Raw field map of a document
    pub fn fields(&self, code: &SessionCode) -> Option<Fields> {
        self.lock().ok()?.documents.get(code).cloned()
    }

    /// Number of live subscriptions for a session
    pub fn subscriber_count(&self, code: &SessionCode) -> usize {
        self.lock()
            .ok()
            .and_then(|inner| inner.subscribers.get(code).map(Vec::len))
            .unwrap_or(0)
    }

    /// Number of stored documents
    pub fn document_count(&self) -> usize {
        self.lock().map(|inner| inner.documents.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SessionDocumentStore for InMemoryStore {
    async fn open(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if !inner.open {
            inner.open = true;
            info!("Document store opened");
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if !inner.open {
            return Ok(());
        }
        inner.open = false;

        let mut dropped = 0;
        for (_, subscribers) in inner.subscribers.drain() {
            for subscriber in subscribers {
                let _ = subscriber.tx.send(SubscriptionEvent::Error(SessionError::Transport(
                    "Document store closed".to_string(),
                )));
                dropped += 1;
            }
        }
        info!("Document store closed, {} subscriptions ended", dropped);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().map(|inner| inner.open).unwrap_or(false)
    }

    async fn create(&self, code: &SessionCode, document: &SessionDocument) -> Result<()> {
        let fields = document.to_fields()?;
        let mut inner = self.lock()?;
        inner.ensure_open()?;
        if inner.documents.insert(code.clone(), fields).is_some() {
            warn!("Session {} already existed and was overwritten", code);
        }
        info!("Created session {}", code);
        inner.fan_out(code);
        Ok(())
    }

    async fn read(&self, code: &SessionCode) -> Result<SessionDocument> {
        let inner = self.lock()?;
        inner.ensure_open()?;
        match inner.documents.get(code) {
            Some(fields) => SessionDocument::from_fields(fields),
            None => Err(SessionError::NotFound(code.to_string())),
        }
    }

    async fn merge_write(&self, code: &SessionCode, patch: &SessionPatch) -> Result<()> {
        let changes = patch.to_fields()?;
        let mut inner = self.lock()?;
        inner.ensure_open()?;
        let document = inner
            .documents
            .get_mut(code)
            .ok_or_else(|| SessionError::NotFound(code.to_string()))?;

        debug!("Merging {:?} into {}", changes.keys().collect::<Vec<_>>(), code);
        for (field, value) in changes {
            document.insert(field, value);
        }
        inner.fan_out(code);
        Ok(())
    }

    async fn subscribe(&self, code: &SessionCode) -> Result<Subscription> {
        let mut inner = self.lock()?;
        inner.ensure_open()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;

        let initial = match inner.documents.get(code) {
            Some(fields) => SessionDocument::from_fields(fields).map(SubscriptionEvent::Snapshot),
            None => Err(SessionError::NotFound(code.to_string())),
        };

        match initial {
            Ok(snapshot) => {
                // Receiver is alive here, the send cannot fail
                let _ = tx.send(snapshot);
                inner
                    .subscribers
                    .entry(code.clone())
                    .or_default()
                    .push(Subscriber { id, tx });
                debug!("Subscriber {} watching {}", id, code);
            }
            Err(e) => {
                debug!("Subscriber {} for {} ended immediately: {}", id, code, e);
                let _ = tx.send(SubscriptionEvent::Error(e));
            }
        }

        let weak: Weak<Mutex<StoreInner>> = Arc::downgrade(&self.inner);
        let cancel_code = code.clone();
        Ok(Subscription::new(code.clone(), rx, move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    inner.remove_subscriber(&cancel_code, id);
                }
            }
        }))
    }
}
