use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

use cargo_diag::cargo::CargoSubcommand;
use cargo_diag::config::load_config;
use cargo_diag::error::{describe_error_code, DiagResult};
use cargo_diag::project::Project;
use cargo_diag::session::{Session, SessionOptions};
use cargo_diag::subprocess::SubprocessManager;

/// Name cargo passes as the first argument when run as `cargo diag`
const CARGO_SUBCOMMAND_NAME: &str = "diag";

/// Run cargo and print a compact, grouped diagnostics report
#[derive(Parser)]
#[command(name = "cargo-diag", version)]
#[command(about = "Cargo diagnostics with stall detection and cross-run fix tracking", long_about = None)]
struct Cli {
    /// Cargo command to run
    #[arg(value_enum)]
    command: CargoSubcommand,

    /// Include warnings in output
    #[arg(long)]
    include_warnings: bool,

    /// Check a specific crate
    #[arg(short, long)]
    package: Option<String>,

    /// Clear the tracker and start fresh
    #[arg(long)]
    reset_tracker: bool,

    /// Also list diagnostics fixed in earlier runs
    #[arg(long)]
    show_fixed: bool,

    /// Run cargo clean first
    #[arg(long)]
    fresh: bool,

    /// For the test command: only compile, do not run tests
    #[arg(long)]
    compile_only: bool,

    /// Path to Cargo.toml (overrides auto-detection)
    #[arg(long)]
    manifest_path: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            command: self.command,
            include_warnings: self.include_warnings,
            package: self.package.clone(),
            reset_tracker: self.reset_tracker,
            show_fixed: self.show_fixed,
            fresh: self.fresh,
            compile_only: self.compile_only,
        }
    }
}

/// Drop the `diag` argument cargo inserts for `cargo diag ...`
fn strip_cargo_subcommand(mut args: Vec<OsString>) -> Vec<OsString> {
    if args.get(1).is_some_and(|arg| arg == CARGO_SUBCOMMAND_NAME) {
        args.remove(1);
    }
    args
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .init();
}

async fn run(cli: &Cli) -> DiagResult<String> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let project = Project::discover(cli.manifest_path.as_deref(), &cwd)?;
    let config = load_config(&project.root)?;
    let subprocess = SubprocessManager::production(config.watch.clone());

    let session = Session::new(project, config, subprocess);
    let run = session.run(&cli.session_options()).await?;
    Ok(run.report)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(strip_cargo_subcommand(std::env::args_os().collect()));
    init_logging(cli.verbose);

    debug!("cargo-diag started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    match run(&cli).await {
        Ok(report) => println!("{}", report),
        Err(e) => {
            error!("{} ({})", e, describe_error_code(e.code()));
            if e.replaces_report() {
                println!("{}", e.user_message());
            } else {
                eprintln!("{}", e.user_message());
            }
            std::process::exit(e.exit_code());
        }
    }
}
