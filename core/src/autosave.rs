//! Background save writer.
//!
//! The loop serializes a snapshot and hands the string to this worker;
//! the frame never waits on storage. Failed writes are logged here and
//! otherwise dropped; the next interval writes a newer snapshot anyway.
//!
//! RULE: `shutdown()` (or drop) closes the channel and joins the thread.
//! Every payload submitted before that point is written first.

use crate::{
    error::{GameError, GameResult},
    persistence::PersistenceProvider,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

pub struct AutoSaver {
    tx:       Option<Sender<String>>,
    handle:   Option<JoinHandle<()>>,
    failures: Arc<AtomicUsize>,
}

impl AutoSaver {
    pub fn spawn(provider: Arc<dyn PersistenceProvider>) -> GameResult<Self> {
        let (tx, rx) = mpsc::channel::<String>();
        let failures = Arc::new(AtomicUsize::new(0));
        let worker_failures = Arc::clone(&failures);

        let handle = thread::Builder::new()
            .name("autosave".into())
            .spawn(move || {
                for payload in rx {
                    match provider.save(&payload) {
                        Ok(()) => log::debug!("autosave: wrote {} bytes", payload.len()),
                        Err(e) => {
                            worker_failures.fetch_add(1, Ordering::SeqCst);
                            log::warn!("autosave: write failed: {e}");
                        }
                    }
                }
            })
            .map_err(|e| GameError::Persistence(format!("cannot start autosave worker: {e}")))?;

        Ok(Self { tx: Some(tx), handle: Some(handle), failures })
    }

    /// Queue a payload. Returns false if the worker is gone.
    pub fn submit(&self, payload: String) -> bool {
        match &self.tx {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Writes that failed since the worker started.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Flush pending writes and join the worker.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("autosave: worker panicked");
            }
        }
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.close();
    }
}
