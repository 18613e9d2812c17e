// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Creating and joining sessions.

use tracing::info;

use super::{SessionCode, SessionDocument};
use crate::error::Result;
use crate::store::SessionDocumentStore;

/// Create a session with a fresh random code and return the code.
///
/// The code is not checked against existing sessions. A collision
/// replaces the older session.
pub async fn create_session(
    store: &dyn SessionDocumentStore,
    initial: &SessionDocument,
) -> Result<SessionCode> {
    let code = SessionCode::generate(&mut rand::thread_rng());
    store.create(&code, initial).await?;
    info!("Session {} created", code);
    Ok(code)
}

/// Resolve a code typed by a participant.
///
/// The input is trimmed and upper-cased, then checked against the store
/// with a one-shot read.
pub async fn join_session(store: &dyn SessionDocumentStore, input: &str) -> Result<SessionCode> {
    let code = SessionCode::parse(input)?;
    store.read(&code).await?;
    info!("Joining session {}", code);
    Ok(code)
}
