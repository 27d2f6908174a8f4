//! # Identity Module
//!
//! Owns the node's small numeric identity (0-15) on the telemetry network.
//!
//! This module handles:
//! - Loading the persisted identity at startup
//! - Button-driven increment/decrement through debounce state machines
//! - Validated administrative overrides
//! - Writing every change back to the identity store

pub mod debounce;
pub mod store;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::error::{Result, TelemetryError};
use store::IdentityStore;

/// Lowest valid node identity
pub const MIN_NODE_ID: u8 = 0;

/// Highest valid node identity
pub const MAX_NODE_ID: u8 = 15;

struct IdentityState {
    current: u8,
    store: Box<dyn IdentityStore>,
}

/// The node identity and its persistence.
///
/// Shared between the button poll task and the administrative HTTP
/// handlers; every mutation persists while holding the lock so concurrent
/// writers cannot save out of order.
pub struct IdentityAssigner {
    state: Mutex<IdentityState>,
}

impl std::fmt::Debug for IdentityAssigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityAssigner")
            .field("current", &self.get())
            .finish_non_exhaustive()
    }
}

impl IdentityAssigner {
    /// Loads the identity from `store`.
    ///
    /// A missing or unreadable value starts the node at 0; a stored value
    /// above 15 is clamped.
    pub fn load(mut store: Box<dyn IdentityStore>) -> Self {
        let current = match store.load() {
            Ok(Some(id)) => id.min(MAX_NODE_ID),
            Ok(None) => MIN_NODE_ID,
            Err(e) => {
                warn!("Failed to load node identity, starting at 0: {}", e);
                MIN_NODE_ID
            }
        };

        Self {
            state: Mutex::new(IdentityState { current, store }),
        }
    }

    /// Current node identity
    pub fn get(&self) -> u8 {
        self.lock().current
    }

    /// Administrative override.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` and leaves the identity unchanged if `value`
    /// is outside 0-15.
    pub fn set(&self, value: i64) -> Result<u8> {
        let id = u8::try_from(value)
            .ok()
            .filter(|id| *id <= MAX_NODE_ID)
            .ok_or_else(|| {
                TelemetryError::InvalidIdentity(format!(
                    "{} is outside {}-{}",
                    value, MIN_NODE_ID, MAX_NODE_ID
                ))
            })?;

        let mut state = self.lock();
        Self::commit(&mut state, id);
        info!("Client ID set to {}", id);
        Ok(id)
    }

    /// [`set`](Self::set) with the state file write moved to the blocking pool
    pub async fn set_blocking(self: &Arc<Self>, value: i64) -> Result<u8> {
        let identity = Arc::clone(self);
        tokio::task::spawn_blocking(move || identity.set(value))
            .await
            .map_err(|e| TelemetryError::Persistence(format!("Identity task failed: {}", e)))?
    }

    /// Applies a button delta, clamped to 0-15. Returns the new identity.
    pub fn adjust(&self, delta: i8) -> u8 {
        let mut state = self.lock();
        let id = (i16::from(state.current) + i16::from(delta))
            .clamp(i16::from(MIN_NODE_ID), i16::from(MAX_NODE_ID)) as u8;
        Self::commit(&mut state, id);
        id
    }

    fn commit(state: &mut IdentityState, id: u8) {
        state.current = id;
        if let Err(e) = state.store.save(id) {
            warn!("Failed to persist node identity {}: {}", id, e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, IdentityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
