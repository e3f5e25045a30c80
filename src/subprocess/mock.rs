//! Scripted stand-in for cargo
//!
//! Replies are registered per cargo subcommand (the first argument). A command
//! nothing was scripted for fails the way a missing `cargo` binary does.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ExitStatusHelper, ProcessCommand, ProcessOutput, ProcessRunner};
use crate::cargo::CargoSubcommand;

#[derive(Clone, Default)]
pub struct MockCargo {
    replies: Arc<Mutex<Vec<Reply>>>,
    calls: Arc<Mutex<Vec<ProcessCommand>>>,
}

struct Reply {
    subcommand: String,
    flag: Option<String>,
    uses_left: Option<usize>,
    output: ProcessOutput,
}

impl Reply {
    fn answers(&self, args: &[String]) -> bool {
        args.first() == Some(&self.subcommand)
            && self.uses_left != Some(0)
            && self
                .flag
                .as_ref()
                .is_none_or(|flag| args.iter().any(|arg| arg == flag))
    }
}

/// Builder for one scripted reply; registered by `finish`
pub struct ReplyBuilder {
    cargo: MockCargo,
    reply: Reply,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockCargo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply to `cargo <subcommand> ...`
    pub fn on(&self, subcommand: CargoSubcommand) -> ReplyBuilder {
        self.reply_to(subcommand.as_str())
    }

    /// Script the reply to `cargo clean`
    pub fn on_clean(&self) -> ReplyBuilder {
        self.reply_to("clean")
    }

    fn reply_to(&self, subcommand: &str) -> ReplyBuilder {
        ReplyBuilder {
            cargo: self.clone(),
            reply: Reply {
                subcommand: subcommand.to_string(),
                flag: None,
                uses_left: None,
                output: ProcessOutput {
                    status: ExitStatus::Success,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: Duration::from_millis(10),
                },
            },
        }
    }

    /// Every command received so far, in order
    pub fn calls(&self) -> Vec<ProcessCommand> {
        lock(&self.calls).clone()
    }

    /// Drop all scripted replies, keeping the call log
    pub fn clear_replies(&self) {
        lock(&self.replies).clear();
    }
}

impl ReplyBuilder {
    /// Only answer invocations carrying `flag`
    pub fn with_flag(mut self, flag: &str) -> Self {
        self.reply.flag = Some(flag.to_string());
        self
    }

    pub fn stdout(mut self, stdout: &str) -> Self {
        self.reply.output.stdout = stdout.to_string();
        self
    }

    pub fn stderr(mut self, stderr: &str) -> Self {
        self.reply.output.stderr = stderr.to_string();
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.reply.output.status = ExitStatusHelper::failure(code);
        self
    }

    /// The supervisor killed cargo at the overall deadline
    pub fn timed_out(mut self) -> Self {
        self.reply.output.status = ExitStatus::Timeout;
        self
    }

    /// Answer a single invocation, then fall through to later replies
    pub fn once(mut self) -> Self {
        self.reply.uses_left = Some(1);
        self
    }

    pub fn finish(self) {
        lock(&self.cargo.replies).push(self.reply);
    }
}

#[async_trait]
impl ProcessRunner for MockCargo {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        lock(&self.calls).push(command.clone());

        let mut replies = lock(&self.replies);
        let reply = replies
            .iter_mut()
            .find(|reply| reply.answers(&command.args))
            .ok_or_else(|| ProcessError::CommandNotFound(command.display()))?;

        if let Some(left) = reply.uses_left.as_mut() {
            *left -= 1;
        }
        Ok(reply.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::ProcessCommandBuilder;

    fn cargo(args: &[&str]) -> ProcessCommand {
        ProcessCommandBuilder::new("cargo").args(args).build()
    }

    #[tokio::test]
    async fn test_replies_by_subcommand_and_flag() {
        let mock = MockCargo::new();
        mock.on(CargoSubcommand::Test)
            .with_flag("--no-run")
            .stdout("compiled only")
            .finish();
        mock.on(CargoSubcommand::Test).stdout("ran").exit_code(101).finish();
        mock.on_clean().finish();

        let compiled = mock.run(cargo(&["test", "--no-run"])).await.unwrap();
        assert_eq!(compiled.stdout, "compiled only");

        let ran = mock.run(cargo(&["test", "--message-format=json"])).await.unwrap();
        assert_eq!(ran.stdout, "ran");
        assert_eq!(ran.exit_code(), 101);

        assert!(mock.run(cargo(&["clean"])).await.unwrap().status.success());
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_once_falls_through_then_runs_out() {
        let mock = MockCargo::new();
        mock.on(CargoSubcommand::Check).stdout("first").once().finish();
        mock.on(CargoSubcommand::Build).timed_out().finish();

        assert_eq!(mock.run(cargo(&["check"])).await.unwrap().stdout, "first");
        assert!(matches!(
            mock.run(cargo(&["check"])).await,
            Err(ProcessError::CommandNotFound(ref c)) if c == "cargo check"
        ));
        assert!(mock.run(cargo(&["build"])).await.unwrap().timed_out());
    }
}
