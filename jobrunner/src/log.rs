use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::{JobError, Result};
use crate::status::JobStatus;
use crate::types::JobId;

/// Caller-side half of a job's cancellation handle.
///
/// Held in the job's log entry while the job is active. Firing it consumes
/// the switch, wakes the driver's kill branch, and hands back the receiver
/// the driver completes once the Killed transition is recorded.
pub struct KillSwitch {
    signal: oneshot::Sender<()>,
    acked: oneshot::Receiver<()>,
}

/// Driver-side half of the cancellation handle.
pub struct KillSignal {
    pub fired: oneshot::Receiver<()>,
    pub ack: oneshot::Sender<()>,
}

pub fn kill_channel() -> (KillSwitch, KillSignal) {
    let (signal, fired) = oneshot::channel();
    let (ack, acked) = oneshot::channel();
    (KillSwitch { signal, acked }, KillSignal { fired, ack })
}

impl KillSwitch {
    pub fn fire(self) -> oneshot::Receiver<()> {
        let _ = self.signal.send(());
        self.acked
    }
}

struct JobEntry {
    status: JobStatus,
    output: Vec<u8>,
    kill: Option<KillSwitch>,
}

/// Shared in-memory map from job id to status, output, and cancellation
/// handle. Entries are created on submission and never removed, so
/// terminated jobs stay queryable.
///
/// The map itself is under a readers-writer lock; each entry has its own
/// mutex so pollers of one job never wait on another job's appends, and an
/// output read holds the entry lock only for the length of a buffer copy.
#[derive(Default)]
pub struct ProcessLog {
    entries: RwLock<HashMap<JobId, Mutex<JobEntry>>>,
}

impl ProcessLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for a freshly submitted job. The id comes from the
    /// supervisor's generator, which guarantees it does not collide.
    pub fn insert(&self, id: JobId, kill: KillSwitch) {
        let entry = JobEntry {
            status: JobStatus::Active,
            output: Vec::new(),
            kill: Some(kill),
        };
        self.entries.write().unwrap().insert(id, Mutex::new(entry));
    }

    fn with_entry<T>(&self, id: &str, f: impl FnOnce(&mut JobEntry) -> T) -> Result<T> {
        let entries = self.entries.read().unwrap();
        let entry = entries.get(id).ok_or(JobError::NotFound)?;
        let mut entry = entry.lock().unwrap();
        Ok(f(&mut entry))
    }

    /// Record a status transition. A terminal status is never overwritten,
    /// so the first terminal write wins; the driver writes Killed before it
    /// inspects the exit, which keeps Killed ahead of any exit error the
    /// kill itself provokes.
    pub fn set_status(&self, id: &str, status: JobStatus) -> Result<()> {
        self.with_entry(id, |entry| {
            if !entry.status.is_terminal() {
                entry.status = status;
            }
        })
    }

    pub fn append_output(&self, id: &str, chunk: &[u8]) -> Result<()> {
        self.with_entry(id, |entry| entry.output.extend_from_slice(chunk))
    }

    pub fn get_status(&self, id: &str) -> Result<JobStatus> {
        self.with_entry(id, |entry| entry.status.clone())
    }

    /// Stable snapshot of the output produced so far; concurrent appends do
    /// not invalidate it.
    pub fn get_output(&self, id: &str) -> Result<Bytes> {
        self.with_entry(id, |entry| Bytes::copy_from_slice(&entry.output))
    }

    /// Remove and return the kill switch. `NotActive` when the job is known
    /// but no longer holds one (terminal, or a kill is already in flight).
    pub fn take_kill_switch(&self, id: &str) -> Result<KillSwitch> {
        self.with_entry(id, |entry| entry.kill.take())?
            .ok_or(JobError::NotActive)
    }

    /// Drop the kill switch on the driver's way out, whatever the reason.
    pub fn clear_kill_switch(&self, id: &str) {
        let _ = self.with_entry(id, |entry| {
            entry.kill = None;
        });
    }
}
