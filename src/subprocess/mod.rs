pub mod builder;
pub mod error;
#[cfg(test)]
pub mod mock;
pub mod runner;
pub mod supervisor;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
#[cfg(test)]
pub use mock::MockCargo;
pub use runner::{
    ExitStatus, ExitStatusHelper, ProcessCommand, ProcessOutput, ProcessRunner, TIMEOUT_EXIT_CODE,
};
pub use supervisor::{SupervisedRunner, WatchSettings};

use std::sync::Arc;

#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Supervised runner reporting to stderr
    pub fn production(settings: WatchSettings) -> Self {
        Self::new(Arc::new(SupervisedRunner::with_stderr(settings)))
    }

    #[cfg(test)]
    pub fn mock() -> (Self, MockCargo) {
        let mock = MockCargo::new();
        let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
        (Self::new(runner), mock)
    }

    pub fn runner(&self) -> Arc<dyn ProcessRunner> {
        Arc::clone(&self.runner)
    }
}
