//! Save-slot persistence contract.
//!
//! The core hands providers an opaque JSON string and asks for the last
//! one back. Providers are shared with the autosave worker thread, so
//! they must be `Send + Sync`.

use crate::error::{GameError, GameResult};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

pub trait PersistenceProvider: Send + Sync {
    /// The most recently saved payload, or None for a fresh slot.
    fn load(&self) -> GameResult<Option<String>>;

    fn save(&self, payload: &str) -> GameResult<()>;
}

/// Shared in-memory slot. Clones see the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    slot:    Arc<Mutex<Option<String>>>,
    writes:  Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut slot) = store.slot.lock() {
            *slot = Some(payload.into());
        }
        store
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail (write-failure tests).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl PersistenceProvider for MemoryPersistence {
    fn load(&self) -> GameResult<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| GameError::Persistence("memory slot poisoned".into()))?;
        Ok(slot.clone())
    }

    fn save(&self, payload: &str) -> GameResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GameError::Persistence("write refused".into()));
        }
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| GameError::Persistence("memory slot poisoned".into()))?;
        *slot = Some(payload.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
