//! Construction of the cargo command line

use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};

/// The cargo subcommands this tool knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CargoSubcommand {
    Check,
    Build,
    Clippy,
    Test,
}

impl CargoSubcommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CargoSubcommand::Check => "check",
            CargoSubcommand::Build => "build",
            CargoSubcommand::Clippy => "clippy",
            CargoSubcommand::Test => "test",
        }
    }

    /// Whether `--tests` is added so test targets are type-checked too
    pub fn includes_tests(&self) -> bool {
        matches!(self, CargoSubcommand::Check | CargoSubcommand::Clippy)
    }
}

impl fmt::Display for CargoSubcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to launch one cargo run
#[derive(Debug, Clone)]
pub struct CargoInvocation {
    pub program: String,
    pub subcommand: CargoSubcommand,
    pub package: Option<String>,
    pub manifest_path: Option<PathBuf>,
    /// `test` only: build the test binaries without running them
    pub compile_only: bool,
}

impl CargoInvocation {
    pub fn new(subcommand: CargoSubcommand) -> Self {
        Self {
            program: "cargo".to_string(),
            subcommand,
            package: None,
            manifest_path: None,
            compile_only: false,
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn package(mut self, package: Option<String>) -> Self {
        self.package = package;
        self
    }

    pub fn manifest_path(mut self, manifest_path: Option<PathBuf>) -> Self {
        self.manifest_path = manifest_path;
        self
    }

    pub fn compile_only(mut self, compile_only: bool) -> Self {
        self.compile_only = compile_only;
        self
    }

    /// Whether this run executes tests and therefore prints harness output
    pub fn runs_tests(&self) -> bool {
        self.subcommand == CargoSubcommand::Test && !self.compile_only
    }

    /// Build the process command, run from `root`
    pub fn to_command(&self, root: &Path) -> ProcessCommand {
        let mut builder = ProcessCommandBuilder::new(&self.program)
            .arg(self.subcommand.as_str())
            .args(["--message-format=json", "--color=never"]);

        if let Some(manifest) = &self.manifest_path {
            builder = builder.arg("--manifest-path").arg(&manifest.to_string_lossy());
        }
        if let Some(package) = &self.package {
            builder = builder.args(["-p", package.as_str()]);
        }

        builder = builder.arg_if(self.subcommand.includes_tests(), "--tests");
        if self.subcommand == CargoSubcommand::Clippy {
            builder = builder.args(["--", "-D", "warnings"]);
        }

        builder
            .arg_if(
                self.subcommand == CargoSubcommand::Test && self.compile_only,
                "--no-run",
            )
            .current_dir(root)
            .build()
    }

    /// `cargo clean` in the same workspace
    pub fn clean_command(&self, root: &Path) -> ProcessCommand {
        let mut builder = ProcessCommandBuilder::new(&self.program).arg("clean");
        if let Some(manifest) = &self.manifest_path {
            builder = builder.arg("--manifest-path").arg(&manifest.to_string_lossy());
        }
        builder.current_dir(root).build()
    }
}
