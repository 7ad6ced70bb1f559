//! buildgate - main entry point

use std::io::stdout;

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use buildgate::cli::{Cli, STRICT_ENV};
use buildgate::{BuildConfig, TaskContext, TaskGraph, TaskRunner, VersionGate};

/// Initialize logging on stderr. `RUST_LOG` overrides the default level.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Err(e) = buildgate::process_guard::init_signal_handlers() {
        tracing::warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    let root = cli.directory.as_path();
    let config = BuildConfig::resolve(root, cli.config.as_deref())?;
    config.validate().context("Invalid configuration")?;

    let env_strict = std::env::var(STRICT_ENV).ok();
    let policy = cli.policy(env_strict.as_deref());
    debug!("Version policy: {}", policy);

    if let Some(actual) = &cli.check_version {
        VersionGate::new("Node", &config.required_node_version, policy).verify(actual)?;
        println!(
            "✓ {} satisfies {} [{}]",
            actual,
            policy.qualifier(),
            config.required_node_version
        );
        return Ok(());
    }

    let graph = TaskGraph::standard(&config);

    if cli.list {
        let width = graph.described().map(|t| t.name.len()).max().unwrap_or(0);
        for task in graph.described() {
            println!(
                "buildgate {:<width$}  # {}",
                task.name,
                task.description.unwrap_or_default(),
                width = width
            );
        }
        return Ok(());
    }

    let ctx = TaskContext::new(root, config, policy);
    let mut runner = TaskRunner::new(graph, ctx, stdout());
    let ran = runner.run(&cli.tasks())?;
    info!("Completed {} task(s)", ran.len());
    Ok(())
}
