//! Bounded registry handing out shared session handles by opaque id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::RngCore;

use lifegrid_core::{ErrorInfo, LifegridError, Result};

use crate::session::AnalysisSession;

/// Capacity and expiry limits of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Hard cap on concurrently held sessions.
    pub max_sessions: usize,
    /// Idle time after which a session becomes sweepable.
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

struct Slot {
    session: Arc<Mutex<AnalysisSession>>,
    last_access: Instant,
}

impl Slot {
    fn expired(&self, timeout: Duration) -> bool {
        self.last_access.elapsed() > timeout
    }
}

/// In-memory registry of live sessions keyed by 32-character hex ids.
///
/// Handles are shared `Arc<Mutex<_>>` values, so removing or sweeping a
/// session never invalidates a handle someone already holds; the store
/// merely stops handing it out. Every successful `get` restarts the
/// session's idle clock.
pub struct SessionStore {
    limits: SessionLimits,
    slots: HashMap<String, Slot>,
}

impl SessionStore {
    /// Creates an empty store enforcing `limits`.
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            limits,
            slots: HashMap::new(),
        }
    }

    /// Creates a fresh session and returns its id.
    ///
    /// Expired sessions are swept first; when the store is still at
    /// capacity afterwards the call fails with a `Session` error
    /// instead of evicting anything live.
    pub fn create(&mut self) -> Result<String> {
        self.cleanup_expired();
        if self.slots.len() >= self.limits.max_sessions {
            return Err(store_full(self.slots.len(), self.limits.max_sessions));
        }
        let id = new_session_id();
        self.slots.insert(
            id.clone(),
            Slot {
                session: Arc::new(Mutex::new(AnalysisSession::new())),
                last_access: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Looks up a session, restarting its idle clock on a hit.
    pub fn get(&mut self, id: &str) -> Option<Arc<Mutex<AnalysisSession>>> {
        let slot = self.slots.get_mut(id)?;
        slot.last_access = Instant::now();
        Some(Arc::clone(&slot.session))
    }

    /// Drops a session, reporting whether the id was present.
    pub fn remove(&mut self, id: &str) -> bool {
        self.slots.remove(id).is_some()
    }

    /// Sweeps every session idle for longer than the configured
    /// timeout, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let timeout = self.limits.idle_timeout;
        let before = self.slots.len();
        self.slots.retain(|_, slot| !slot.expired(timeout));
        before - self.slots.len()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The limits this store enforces.
    pub fn limits(&self) -> SessionLimits {
        self.limits
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionLimits::default())
    }
}

fn new_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn store_full(active: usize, max_sessions: usize) -> LifegridError {
    LifegridError::Session(
        ErrorInfo::new("store-full", "session capacity reached")
            .with_context("active", active.to_string())
            .with_context("max_sessions", max_sessions.to_string())
            .with_hint("retry once an idle session expires, or remove one"),
    )
}
