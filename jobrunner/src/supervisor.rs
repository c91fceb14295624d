use std::io::{self, Read};
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tokio::task;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::log::{kill_channel, KillSignal, ProcessLog};
use crate::status::JobStatus;
use crate::types::{generate_job_id, Job, JobId};

/// How long `kill` waits for the driver to record the Killed transition
/// before reporting success anyway.
const KILL_ACK_WAIT: Duration = Duration::from_millis(50);

/// The contract the gateway programs against.
///
/// `submit` returns once the job's log record exists; a status query with
/// the returned id always succeeds, even if the child never starts.
#[async_trait]
pub trait JobWorker: Send + Sync {
    async fn submit(&self, job: Job) -> JobId;
    async fn status(&self, id: &str) -> Result<JobStatus>;
    async fn output(&self, id: &str) -> Result<Bytes>;
    async fn kill(&self, id: &str) -> Result<JobStatus>;
}

/// Owns child-process execution. Each submitted job runs under its own
/// driver task, which is the only writer of that job's log entry; the
/// supervisor handle itself is cheap to clone and share.
#[derive(Clone, Default)]
pub struct Supervisor {
    log: Arc<ProcessLog>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobWorker for Supervisor {
    async fn submit(&self, job: Job) -> JobId {
        let id = generate_job_id();
        let (switch, signal) = kill_channel();
        // No suspension between insert and spawn: the record is visible
        // before the id escapes, and an abandoned caller cannot leave an
        // Active record with no driver behind it.
        self.log.insert(id.clone(), switch);
        info!(job_id = %id, command = %job.command, "job submitted");
        tokio::spawn(drive(Arc::clone(&self.log), id.clone(), job, signal));
        id
    }

    async fn status(&self, id: &str) -> Result<JobStatus> {
        self.log.get_status(id)
    }

    async fn output(&self, id: &str) -> Result<Bytes> {
        self.log.get_output(id)
    }

    async fn kill(&self, id: &str) -> Result<JobStatus> {
        let switch = self.log.take_kill_switch(id)?;
        let acked = switch.fire();
        match timeout(KILL_ACK_WAIT, acked).await {
            Ok(Ok(())) => Ok(JobStatus::Killed),
            // The driver dropped the acknowledgement without sending: the
            // signal landed after the child had already exited, and the job
            // finished on its own terms. The driver only drops the sender
            // after its terminal transition, so the log holds the real
            // outcome by the time the drop is observable here.
            Ok(Err(_)) => {
                debug!(job_id = %id, "kill lost the race against natural exit");
                self.log.get_status(id)
            }
            // Signal delivered but not yet acknowledged; Killed becomes
            // visible once the driver finishes reaping.
            Err(_) => {
                debug!(job_id = %id, "kill not acknowledged within bound");
                Ok(JobStatus::Killed)
            }
        }
    }
}

/// Per-job driver: sole writer of the job's status and output.
async fn drive(log: Arc<ProcessLog>, id: JobId, job: Job, signal: KillSignal) {
    let KillSignal {
        fired: mut kill_rx,
        ack,
    } = signal;

    // One pipe, with the write end handed to the child twice, so stdout and
    // stderr interleave in emission order instead of being merged after the
    // fact.
    let ends = io::pipe().and_then(|(reader, writer)| {
        let stderr_end = writer.try_clone()?;
        Ok((reader, writer, stderr_end))
    });
    let (reader, stdout_end, stderr_end) = match ends {
        Ok(ends) => ends,
        Err(error) => {
            warn!(job_id = %id, %error, "could not establish output pipe");
            let _ = log.set_status(&id, JobStatus::Error("output pipe failed".into()));
            log.clear_kill_switch(&id);
            return;
        }
    };

    let mut command = Command::new(&job.command);
    command
        .args(&job.args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_end))
        .stderr(Stdio::from(stderr_end));
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(error) => {
            warn!(job_id = %id, command = %job.command, %error, "spawn failed");
            let _ = log.set_status(&id, JobStatus::Error("invalid command".into()));
            log.clear_kill_switch(&id);
            return;
        }
    };
    // The command still holds the parent's copies of the pipe's write end;
    // they must close for the reader to see EOF once the child exits.
    drop(command);

    let reader_log = Arc::clone(&log);
    let reader_id = id.clone();
    let reader_task = task::spawn_blocking(move || pump_output(reader, &reader_log, &reader_id));

    let mut killed = false;
    let exit = tokio::select! {
        fired = &mut kill_rx => {
            if fired.is_ok() {
                killed = true;
                let _ = child.kill().await;
            }
            child.wait().await
        }
        exit = child.wait() => exit,
    };

    // Drain whatever output made it through the pipe before the terminal
    // transition; readers never observe appends after a non-Active status.
    let _ = reader_task.await;

    let status = if killed {
        // The exit of a killed child reads as a failure; the kill takes
        // precedence over it.
        JobStatus::Killed
    } else {
        match exit {
            Ok(exit) if exit.success() => JobStatus::Complete,
            Ok(exit) => JobStatus::Error(describe_exit(exit)),
            Err(error) => JobStatus::Error(format!("wait failed: {error}")),
        }
    };
    info!(job_id = %id, status = %status, "job finished");
    let _ = log.set_status(&id, status);
    if killed {
        let _ = ack.send(());
    }
    log.clear_kill_switch(&id);
}

fn pump_output(mut reader: io::PipeReader, log: &ProcessLog, id: &str) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if log.append_output(id, &buf[..n]).is_err() {
                    break;
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

fn describe_exit(exit: ExitStatus) -> String {
    if let Some(code) = exit.code() {
        format!("exit status {code}")
    } else if let Some(signal) = exit.signal() {
        format!("terminated by signal {signal}")
    } else {
        "abnormal exit".to_string()
    }
}
