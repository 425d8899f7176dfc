//! A single isolated worker process and its IPC channel.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use uuid::Uuid;

use crate::error::WorkerError;
use crate::ipc::{read_response, write_request, WireRequest};
use crate::state::WorkerState;

/// One isolated compute process, holding its own preloaded kernel context.
pub struct WorkerSlot {
    pub id: usize,
    state: WorkerState,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    pub jobs_completed: u64,
}

impl WorkerSlot {
    /// Spawn a worker subprocess by running `command` with `args`. The
    /// process is expected to speak the line-oriented protocol in
    /// [`crate::ipc`] and print a single `"ready"` line on stdout once its
    /// kernel bundle has loaded.
    pub async fn spawn(id: usize, command: &str, args: &[String]) -> Result<Self, WorkerError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        let stdin = child.stdin.take().ok_or_else(|| WorkerError::SpawnFailed("no stdin".to_string()))?;
        let stdout = child.stdout.take().ok_or_else(|| WorkerError::SpawnFailed("no stdout".to_string()))?;
        let stdout = BufReader::new(stdout);

        let mut slot = Self { id, state: WorkerState::Initializing, child, stdin, stdout, jobs_completed: 0 };

        match tokio::time::timeout(Duration::from_secs(30), wait_for_ready(&mut slot.stdout)).await {
            Ok(Ok(())) => {
                slot.state = WorkerState::Idle;
                Ok(slot)
            }
            Ok(Err(e)) => {
                slot.state = WorkerState::Dead;
                Err(WorkerError::SpawnFailed(e.to_string()))
            }
            Err(_) => {
                slot.state = WorkerState::Dead;
                Err(WorkerError::SpawnFailed("kernel load timed out".to_string()))
            }
        }
    }

    pub const fn state(&self) -> WorkerState {
        self.state
    }

    pub const fn is_alive(&self) -> bool {
        !matches!(self.state, WorkerState::Dead)
    }

    /// Run one job on this slot, enforcing `timeout`.
    ///
    /// A structured error reported by the worker ([`WorkerError::JobFailed`])
    /// leaves the slot `Idle` — the process answered the protocol and is
    /// healthy. Timeout or IO failure transitions the slot to `Dead`; it is
    /// never reused.
    pub async fn run_job(&mut self, payload: Value, timeout: Duration) -> Result<Value, WorkerError> {
        if !self.state.accepts_jobs() {
            return Err(WorkerError::ComputeFailed(format!("slot {} not idle", self.id)));
        }
        self.state = WorkerState::Busy;

        let job_id = Uuid::new_v4().to_string();
        let req = WireRequest { job_id: job_id.clone(), payload };

        let outcome = tokio::time::timeout(timeout, async {
            write_request(&mut self.stdin, &req).await.map_err(|e| WorkerError::ComputeFailed(e.to_string()))?;
            let resp = read_response(&mut self.stdout)
                .await
                .map_err(|e| WorkerError::ComputeFailed(e.to_string()))?
                .ok_or_else(|| WorkerError::ComputeFailed("worker process exited".to_string()))?;
            if resp.job_id != job_id {
                return Err(WorkerError::ComputeFailed("job id mismatch in worker response".to_string()));
            }
            if let Some(err) = resp.error {
                return Err(WorkerError::JobFailed(err));
            }
            resp.result.ok_or_else(|| WorkerError::ComputeFailed("worker returned neither result nor error".to_string()))
        })
        .await;

        match outcome {
            Ok(Ok(value)) => {
                self.state = WorkerState::Idle;
                self.jobs_completed += 1;
                Ok(value)
            }
            Ok(Err(e @ WorkerError::JobFailed(_))) => {
                self.state = WorkerState::Idle;
                self.jobs_completed += 1;
                Err(e)
            }
            Ok(Err(e)) => {
                self.state = WorkerState::Dead;
                Err(e)
            }
            Err(_) => {
                self.state = WorkerState::Dead;
                Err(WorkerError::Timeout)
            }
        }
    }

    /// Enter draining: refuse new jobs, allow any in-flight job to finish.
    pub fn begin_draining(&mut self) {
        if matches!(self.state, WorkerState::Idle | WorkerState::Busy) {
            self.state = WorkerState::Draining;
        }
    }

    /// Kill the subprocess and mark the slot `Dead`.
    pub async fn kill(&mut self) {
        let _ = self.child.kill().await;
        self.state = WorkerState::Dead;
    }
}

async fn wait_for_ready(stdout: &mut BufReader<ChildStdout>) -> std::io::Result<()> {
    use tokio::io::AsyncBufReadExt;
    let mut line = String::new();
    stdout.read_line(&mut line).await?;
    if line.trim() == "ready" {
        Ok(())
    } else {
        Err(std::io::Error::new(std::io::ErrorKind::InvalidData, format!("expected 'ready', got {line:?}")))
    }
}
