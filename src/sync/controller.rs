// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Local session controller.
//!
//! The controller is the only in-process authority for playback state on
//! solo and conductor clients. Every mutation updates memory first and
//! unconditionally. A conductor then queues a merge-write holding exactly
//! the changed fields; the queue is drained by a writer task so callers
//! never wait on replication. A failed write raises a sticky sync error
//! and nothing else: local state is not rolled back and the write is not
//! retried, so the local view and the replicated document may diverge.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::catalog::Progression;
use crate::error::{Result, SessionError};
use crate::session::{Bpm, Role, SessionCode, SessionDocument, SessionPatch, SessionView};
use crate::store::SessionDocumentStore;

/// Playback state owned by a controller
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Tempo
    pub bpm: Bpm,
    /// Whether playback is running
    pub is_playing: bool,
    /// Active progression
    pub progression: Progression,
    /// Index into `progression.chords`
    pub chord_index: usize,
    /// Bumped on every progression load, including reloads of the same one
    progression_epoch: u64,
}

impl PlaybackState {
    /// Stopped state at the first chord of `progression`
    ///
    /// Fails with [`SessionError::Validation`] for an empty progression.
    pub fn new(bpm: Bpm, progression: Progression) -> Result<Self> {
        check_position(&progression, 0)?;
        Ok(Self {
            bpm,
            is_playing: false,
            progression,
            chord_index: 0,
            progression_epoch: 0,
        })
    }

    /// State matching a session snapshot
    ///
    /// Fails with [`SessionError::Validation`] when the snapshot's chord
    /// index does not point into its progression.
    pub fn from_document(document: &SessionDocument) -> Result<Self> {
        check_position(&document.current_progression, document.current_chord_index)?;
        Ok(Self {
            bpm: document.bpm,
            is_playing: document.is_playing,
            progression: document.current_progression.clone(),
            chord_index: document.current_chord_index,
            progression_epoch: 0,
        })
    }

    /// Display view of this state
    pub fn view(&self) -> SessionView {
        SessionView::derive(self.bpm, self.is_playing, &self.progression, self.chord_index)
    }

    pub(crate) fn progression_epoch(&self) -> u64 {
        self.progression_epoch
    }
}

/// Require `index` to point at a chord of `progression`
fn check_position(progression: &Progression, index: usize) -> Result<()> {
    if progression.is_empty() {
        return Err(SessionError::Validation(format!(
            "Progression {} has no chords",
            progression.id
        )));
    }
    if index >= progression.len() {
        return Err(SessionError::Validation(format!(
            "Chord index {} outside progression of {} chords",
            index,
            progression.len()
        )));
    }
    Ok(())
}

enum WriteCommand {
    Merge(SessionPatch),
    Flush(oneshot::Sender<()>),
}

struct Replication {
    code: SessionCode,
    writes: mpsc::UnboundedSender<WriteCommand>,
}

struct ControllerInner {
    role: Role,
    replication: Option<Replication>,
    state: watch::Sender<PlaybackState>,
    sync_error: Arc<Mutex<Option<SessionError>>>,
}

/// Authoritative playback state for a solo or conductor client
///
/// Clones share the same state.
#[derive(Clone)]
pub struct LocalSessionController {
    inner: Arc<ControllerInner>,
}

impl LocalSessionController {
    /// Controller for local practice; nothing is replicated
    pub fn solo(initial: PlaybackState) -> Self {
        let (state, _) = watch::channel(initial);
        info!("Solo controller ready");
        Self {
            inner: Arc::new(ControllerInner {
                role: Role::Solo,
                replication: None,
                state,
                sync_error: Arc::new(Mutex::new(None)),
            }),
        }
    }

    /// Controller driving the session `code` in `store`
    ///
    /// Spawns the writer task, so this must be called inside a Tokio
    /// runtime.
    pub fn conductor(
        store: Arc<dyn SessionDocumentStore>,
        code: SessionCode,
        initial: PlaybackState,
    ) -> Self {
        let (state, _) = watch::channel(initial);
        let sync_error = Arc::new(Mutex::new(None));
        let (writes, commands) = mpsc::unbounded_channel();

        tokio::spawn(run_writer(store, code.clone(), commands, Arc::clone(&sync_error)));
        info!("Conductor controller ready for session {}", code);

        Self {
            inner: Arc::new(ControllerInner {
                role: Role::Conductor,
                replication: Some(Replication { code, writes }),
                state,
                sync_error,
            }),
        }
    }

    /// Role of this controller
    pub fn role(&self) -> Role {
        self.inner.role
    }

    /// Session being conducted, if any
    pub fn session_code(&self) -> Option<&SessionCode> {
        self.inner.replication.as_ref().map(|r| &r.code)
    }

    /// Copy of the current state
    pub fn state(&self) -> PlaybackState {
        self.inner.state.borrow().clone()
    }

    /// Current chord index
    pub fn chord_index(&self) -> usize {
        self.inner.state.borrow().chord_index
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.inner.state.borrow().is_playing
    }

    /// Current tempo
    pub fn bpm(&self) -> Bpm {
        self.inner.state.borrow().bpm
    }

    /// Display view of the current state
    pub fn view(&self) -> SessionView {
        self.inner.state.borrow().view()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state.subscribe()
    }

    /// Last replication failure, kept until cleared
    pub fn sync_error(&self) -> Option<SessionError> {
        self.inner.sync_error.lock().ok()?.clone()
    }

    /// Reset the sync error flag
    pub fn clear_sync_error(&self) {
        if let Ok(mut slot) = self.inner.sync_error.lock() {
            *slot = None;
        }
    }

    /// Wait until every write queued so far has completed
    pub async fn flush(&self) {
        let Some(replication) = &self.inner.replication else {
            return;
        };
        let (done, finished) = oneshot::channel();
        if replication.writes.send(WriteCommand::Flush(done)).is_ok() {
            let _ = finished.await;
        }
    }

    /// Start or stop playback. The chord index is left where it is.
    pub fn set_playing(&self, is_playing: bool) {
        self.inner.state.send_modify(|state| state.is_playing = is_playing);
        debug!("Playing set to {}", is_playing);
        self.propagate(SessionPatch::playing(is_playing));
    }

    /// Change the tempo. Values outside 60-200 are rejected untouched.
    pub fn set_bpm(&self, bpm: u32) -> Result<()> {
        let bpm = Bpm::new(bpm)?;
        self.inner.state.send_modify(|state| state.bpm = bpm);
        debug!("BPM set to {}", bpm);
        self.propagate(SessionPatch::bpm(bpm));
        Ok(())
    }

    /// Load a progression and rewind to its first chord
    pub fn set_progression(&self, progression: Progression) -> Result<()> {
        check_position(&progression, 0)?;
        self.inner.state.send_modify(|state| {
            state.progression = progression.clone();
            state.chord_index = 0;
            state.progression_epoch += 1;
        });
        debug!("Progression set to {}", progression.id);
        self.propagate(SessionPatch::progression(progression));
        Ok(())
    }

    /// Move to a chord of the current progression
    pub fn set_chord_index(&self, index: usize) -> Result<()> {
        let mut outcome = Ok(());
        self.inner.state.send_if_modified(|state| {
            outcome = check_position(&state.progression, index);
            if outcome.is_err() {
                return false;
            }
            state.chord_index = index;
            true
        });
        outcome?;
        self.propagate(SessionPatch::chord_index(index));
        Ok(())
    }

    fn propagate(&self, patch: SessionPatch) {
        if !self.inner.role.replicates() {
            return;
        }
        let Some(replication) = &self.inner.replication else {
            return;
        };
        let patch = patch.stamped(Utc::now());
        if replication.writes.send(WriteCommand::Merge(patch)).is_err() {
            self.record_sync_error(SessionError::Transport(
                "Session writer is not running".to_string(),
            ));
        }
    }

    fn record_sync_error(&self, error: SessionError) {
        if let Ok(mut slot) = self.inner.sync_error.lock() {
            *slot = Some(error);
        }
    }
}

impl std::fmt::Debug for LocalSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSessionController")
            .field("role", &self.inner.role)
            .field("session", &self.session_code())
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

/// Apply queued merge-writes in order until the controller is dropped
async fn run_writer(
    store: Arc<dyn SessionDocumentStore>,
    code: SessionCode,
    mut commands: mpsc::UnboundedReceiver<WriteCommand>,
    sync_error: Arc<Mutex<Option<SessionError>>>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            WriteCommand::Merge(patch) => match store.merge_write(&code, &patch).await {
                Ok(()) => debug!("Synced session {}", code),
                Err(e) => {
                    warn!("Failed to sync session {}: {}", code, e);
                    if let Ok(mut slot) = sync_error.lock() {
                        *slot = Some(e);
                    }
                }
            },
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Writer for session {} stopped", code);
}
