//! Change watcher: coalesces bursts of document mutations into one rescan.

use std::cell::Cell;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use crate::dom::MutationRecord;

/// Debounce state. Scans are synchronous, so `Scanning` never overlaps
/// another `Scanning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Pending,
    Scanning,
}

/// Drives `Idle -> Pending -> Scanning -> Idle` over a mutation stream.
///
/// Every relevant mutation seen while `Pending` pushes the deadline out by a
/// full debounce window. Irrelevant mutations neither start nor extend a
/// window.
pub struct ChangeWatcher {
    debounce: Duration,
    state: Cell<WatchState>,
    rescans: Cell<u64>,
}

impl ChangeWatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            state: Cell::new(WatchState::Idle),
            rescans: Cell::new(0),
        }
    }

    pub fn state(&self) -> WatchState {
        self.state.get()
    }

    /// Number of rescans triggered so far.
    pub fn rescans(&self) -> u64 {
        self.rescans.get()
    }

    /// Consume mutations until the observer is disconnected. `rescan` gets
    /// the relevant records of each quiescent window.
    pub async fn run<F, S>(&self, mut rx: UnboundedReceiver<MutationRecord>, relevant: F, mut rescan: S)
    where
        F: Fn(&MutationRecord) -> bool,
        S: FnMut(&[MutationRecord]),
    {
        loop {
            self.state.set(WatchState::Idle);
            let first = loop {
                match rx.recv().await {
                    Some(record) if relevant(&record) => break record,
                    Some(_) => continue,
                    None => return,
                }
            };

            self.state.set(WatchState::Pending);
            let mut batch = vec![first];
            let timer = tokio::time::sleep(self.debounce);
            tokio::pin!(timer);
            let mut disconnected = false;
            loop {
                tokio::select! {
                    next = rx.recv() => match next {
                        Some(record) if relevant(&record) => {
                            batch.push(record);
                            timer.as_mut().reset(Instant::now() + self.debounce);
                        }
                        Some(_) => {}
                        None => {
                            disconnected = true;
                            break;
                        }
                    },
                    () = &mut timer => break,
                }
            }
            if disconnected {
                log::debug!("Observer disconnected with {} pending mutations", batch.len());
                return;
            }

            self.state.set(WatchState::Scanning);
            log::debug!("Rescanning after {} mutations", batch.len());
            rescan(&batch);
            self.rescans.set(self.rescans.get() + 1);
        }
    }
}
