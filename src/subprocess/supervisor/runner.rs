//! Supervised command runner
//!
//! Both pipes are drained by reader tasks into one queue. The run loop waits
//! on that queue for at most one poll interval, then asks the watchdog which
//! heartbeat, stall or timeout notifications are due.
//!
//! The child gets its own process group, so a terminal Ctrl-C never reaches
//! it directly. SIGINT and SIGTERM are caught here instead and the whole group
//! is killed before the run fails with `ProcessError::Interrupted`.

use async_trait::async_trait;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::progress::ArtifactProgress;
use super::reporter::{ProgressReporter, StderrReporter};
use super::types::{StreamSource, WatchEvent, WatchSettings};
use super::watchdog::Watchdog;
use crate::subprocess::{ExitStatus, ProcessCommand, ProcessError, ProcessOutput, ProcessRunner};

type Line = (StreamSource, String);

/// Runs a child process under heartbeat, stall and overall-timeout supervision
pub struct SupervisedRunner {
    settings: WatchSettings,
    reporter: Arc<dyn ProgressReporter>,
}

impl SupervisedRunner {
    pub fn new(settings: WatchSettings, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { settings, reporter }
    }

    /// Runner that prints notifications to stderr
    pub fn with_stderr(settings: WatchSettings) -> Self {
        Self::new(settings, Arc::new(StderrReporter))
    }

    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    /// Configure the command with environment, working directory and pipes
    fn configure_command(command: &ProcessCommand) -> Command {
        let mut cmd = Command::new(&command.program);

        // own process group so a timeout can take rustc children down with cargo
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd.args(&command.args);
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    async fn supervise<F>(
        &self,
        command: ProcessCommand,
        shutdown: F,
    ) -> Result<ProcessOutput, ProcessError>
    where
        F: Future<Output = i32>,
    {
        let cmd_display = command.display();
        tracing::debug!("Executing supervised subprocess: {}", cmd_display);
        if let Some(ref dir) = command.working_dir {
            tracing::trace!("Working directory: {:?}", dir);
        }

        let start = Instant::now();
        let mut child = Self::configure_command(&command)
            .spawn()
            .map_err(|e| ProcessError::spawn(cmd_display.clone(), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProcessError::MissingPipe("stderr"))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Line>();
        let readers = [
            spawn_reader(stdout, StreamSource::Stdout, tx.clone()),
            spawn_reader(stderr, StreamSource::Stderr, tx),
        ];

        let mut watchdog = Watchdog::new(self.settings.clone(), start, child.id());
        let mut progress = ArtifactProgress::default();
        let mut stdout_lines = Vec::new();
        let mut stderr_lines = Vec::new();
        tokio::pin!(shutdown);

        loop {
            let wait = watchdog.poll_interval(Instant::now());
            let received = tokio::select! {
                received = tokio::time::timeout(wait, rx.recv()) => received,
                signal = &mut shutdown => {
                    return Err(interrupt(&mut child, &readers, signal, &cmd_display).await);
                }
            };
            match received {
                Ok(Some((source, line))) => {
                    watchdog.record_output(Instant::now());
                    match source {
                        StreamSource::Stdout => {
                            progress.observe(&line);
                            stdout_lines.push(line);
                        }
                        StreamSource::Stderr => stderr_lines.push(line),
                    }
                }
                // both pipes closed
                Ok(None) => break,
                Err(_) => {}
            }

            let events = watchdog.tick(Instant::now(), &progress);
            let mut timed_out = false;
            for event in &events {
                self.reporter.report(event);
                timed_out |= matches!(event, WatchEvent::Timeout { .. });
            }

            if timed_out {
                terminate(&mut child).await;
                for reader in &readers {
                    reader.abort();
                }
                return Ok(ProcessOutput {
                    status: ExitStatus::Timeout,
                    stdout: stdout_lines.join("\n"),
                    stderr: stderr_lines.join("\n"),
                    duration: start.elapsed(),
                });
            }
        }

        // pipes are drained; the child may still be finishing up
        let remaining = watchdog.deadline().saturating_duration_since(Instant::now());
        let waited = tokio::select! {
            waited = tokio::time::timeout(remaining, child.wait()) => waited,
            signal = &mut shutdown => {
                return Err(interrupt(&mut child, &readers, signal, &cmd_display).await);
            }
        };
        let status = match waited {
            Ok(status) => ExitStatus::from_std(status?),
            Err(_) => {
                self.reporter.report(&WatchEvent::Timeout {
                    limit: self.settings.overall_timeout,
                });
                terminate(&mut child).await;
                ExitStatus::Timeout
            }
        };

        tracing::debug!(
            "{} finished with {:?}: {} stdout lines, {} stderr lines, {} artifacts",
            cmd_display,
            status,
            stdout_lines.len(),
            stderr_lines.len(),
            progress.compiled()
        );

        Ok(ProcessOutput {
            status,
            stdout: stdout_lines.join("\n"),
            stderr: stderr_lines.join("\n"),
            duration: start.elapsed(),
        })
    }
}

#[async_trait]
impl ProcessRunner for SupervisedRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.supervise(command, shutdown_signal()).await
    }
}

/// Resolves with the signal number once SIGINT or SIGTERM arrives
async fn shutdown_signal() -> i32 {
    #[cfg(unix)]
    {
        use nix::sys::signal::Signal;
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(mut interrupt), Ok(mut terminate)) => tokio::select! {
                _ = interrupt.recv() => Signal::SIGINT as i32,
                _ = terminate.recv() => Signal::SIGTERM as i32,
            },
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Could not install signal handlers: {}", e);
                std::future::pending().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => 2,
            Err(e) => {
                tracing::warn!("Could not install Ctrl-C handler: {}", e);
                std::future::pending().await
            }
        }
    }
}

/// Stop the child's process group after a signal and build the error
async fn interrupt(
    child: &mut Child,
    readers: &[JoinHandle<()>],
    signal: i32,
    cmd_display: &str,
) -> ProcessError {
    tracing::warn!("Received signal {}, stopping {}", signal, cmd_display);
    terminate(child).await;
    for reader in readers {
        reader.abort();
    }
    ProcessError::Interrupted(signal)
}

/// Forward every line of `stream` into the shared queue until EOF
fn spawn_reader<R>(stream: R, source: StreamSource, tx: mpsc::UnboundedSender<Line>) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send((source, normalize_line(&buf))).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read {:?} of child process: {}", source, e);
                    break;
                }
            }
        }
    })
}

/// Decode lossily and strip the trailing newline
fn normalize_line(raw: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(raw).into_owned();
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Kill the child's whole process group, then the child itself, and reap it
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            if let Err(e) = signal::killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                tracing::debug!("killpg({}) failed: {}", pid, e);
            }
        }
    }

    if let Err(e) = child.kill().await {
        tracing::debug!("Failed to kill child process: {}", e);
    }
}
