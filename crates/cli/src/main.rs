//! HAL Mock Test Manager - Main Entry Point
//!
//! Runs fixture-backed JSON-RPC conformance suites against a plugin host and
//! writes CSV, HTML and JSON reports.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use halmock_common::{HarnessConfig, MatchMode, MultiGroupPolicy, TransportKind};
use halmock_runner::TestManager;

mod output;

/// HAL Mock Test Manager
#[derive(Parser, Debug)]
#[command(name = "test-manager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Plugin names (e.g. FrontPanel), a single test case (TCID...), or `all`
    targets: Vec<String>,

    /// Configuration file path
    #[arg(short, long, env = "HALMOCK_CONFIG", default_value = "halmock.toml")]
    config: PathBuf,

    /// Build name stamped on the report
    #[arg(long, env = "HALMOCK_BUILD_NAME")]
    build_name: Option<String>,

    /// JSON-RPC endpoint
    #[arg(long, env = "HALMOCK_ENDPOINT")]
    endpoint: Option<String>,

    /// Request transport (curl, http)
    #[arg(long, env = "HALMOCK_TRANSPORT")]
    transport: Option<TransportKind>,

    /// Response comparison (exact, json)
    #[arg(long, env = "HALMOCK_MATCH_MODE")]
    match_mode: Option<MatchMode>,

    /// What to run when several plugins are given (first, union)
    #[arg(long, env = "HALMOCK_MULTI_GROUP")]
    multi_group: Option<MultiGroupPolicy>,

    /// Output directory for reports
    #[arg(short, long, env = "HALMOCK_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory of additional YAML suites
    #[arg(long, env = "HALMOCK_SUITES_DIR")]
    suites_dir: Option<PathBuf>,

    /// List the test catalogue and exit
    #[arg(long)]
    list: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Configuration file values, overridden by flags and environment
    fn harness_config(&self) -> halmock_common::Result<HarnessConfig> {
        let mut config = HarnessConfig::load(&self.config)?;

        if let Some(build_name) = &self.build_name {
            config.build_name = build_name.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(match_mode) = self.match_mode {
            config.match_mode = match_mode;
        }
        if let Some(multi_group) = self.multi_group {
            config.multi_group = multi_group;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(suites_dir) = &self.suites_dir {
            config.suites_dir = Some(suites_dir.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    // Requests run strictly one after another on a single thread.
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            output::print_error(&format!("Failed to create tokio runtime: {}", e));
            std::process::exit(2);
        }
    };

    let result = rt.block_on(run(cli));
    if let Err(e) = &result {
        output::print_error(&format!("{:#}", e));
    }
    std::process::exit(exit_code(&result));
}

/// 0 when every test passed, 1 when any failed, 2 when the harness itself failed
fn exit_code(result: &anyhow::Result<bool>) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = cli.harness_config()?;
    let manager = TestManager::from_config(config)?;

    if cli.list {
        output::print_catalogue(manager.registry());
        return Ok(true);
    }

    info!("Initializing HAL mock test framework v{}", halmock_common::VERSION);
    info!("GIVEN PLUGIN NAMES/TC NAME {:?}", cli.targets);

    let outcome = manager.run(cli.targets.as_slice()).await?;
    output::print_summary(&outcome);

    Ok(outcome.success())
}
