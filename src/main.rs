//! Gridconf CLI entrypoint.
//!
//! This is the main entrypoint for the gridconf command-line tool.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use gridconf::cli::{Cli, Commands, OutputFormatter};
use gridconf::config::{find_config_file, ClusterConfig, ConfigValidator, SnapshotParser};
use gridconf::control::{generate_holder_id, LocalControlPlane, LockFile, ThrottledControlPlane};
use gridconf::error::Result;
use gridconf::planner::compare;
use gridconf::reconciler::Reconciler;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Global options shared by every command.
struct Context {
    config: Option<PathBuf>,
    state: Option<PathBuf>,
    delay: Duration,
    formatter: OutputFormatter,
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        config: cli.config,
        state: cli.state,
        delay: Duration::from_millis(cli.delay_ms),
        formatter: OutputFormatter::new(cli.output),
    };

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(&ctx, warnings),
        Commands::Diff { old, new } => cmd_diff(&ctx, &old, &new),
        Commands::Plan => cmd_plan(&ctx).await,
        Commands::Apply { dry_run, yes } => cmd_apply(&ctx, dry_run, yes).await,
        Commands::Drift => cmd_drift(&ctx).await,
        Commands::Destroy { continue_on_error, yes } => {
            cmd_destroy(&ctx, continue_on_error, yes).await
        }
        Commands::Show => cmd_show(&ctx).await,
        Commands::Export { path } => cmd_export(&ctx, &path).await,
        Commands::Unlock { lock_id, force } => cmd_unlock(&ctx, lock_id, force).await,
    }
}

/// Validate the desired configuration.
fn cmd_validate(ctx: &Context, show_warnings: bool) -> Result<()> {
    let config_file = resolve_config_path(ctx.config.as_ref())?;
    info!("Validating configuration: {}", config_file.display());

    let config = parser_for(&config_file)?.load_file(&config_file)?;

    let validator = ConfigValidator::new();
    let result = validator.check(&config);
    eprintln!("{}", ctx.formatter.format_validation(&result, &config, show_warnings));

    validator.validate(&config)?;
    Ok(())
}

/// Compare two snapshot files.
fn cmd_diff(ctx: &Context, old: &Path, new: &Path) -> Result<()> {
    let parser = SnapshotParser::new();
    let old_config = parser.load_file(old)?;
    let new_config = parser.load_file(new)?;

    let comparison = compare(&old_config, &new_config)?;
    eprintln!("{}", ctx.formatter.format_comparison(&comparison));

    Ok(())
}

/// Show the apply plan.
async fn cmd_plan(ctx: &Context) -> Result<()> {
    let desired = load_desired(ctx.config.as_ref())?;
    let (plane, _lock) = open_plane(ctx).await?;

    let plan = Reconciler::new(&plane).plan(&desired).await?;
    eprintln!("{}", ctx.formatter.format_plan(&plan));

    Ok(())
}

/// Apply the desired configuration.
async fn cmd_apply(ctx: &Context, dry_run: bool, auto_approve: bool) -> Result<()> {
    let desired = load_desired(ctx.config.as_ref())?;
    let (plane, lock) = open_plane(ctx).await?;
    let reconciler = Reconciler::new(&plane);

    let plan = reconciler.plan(&desired).await?;
    if plan.is_empty() {
        eprintln!("No changes to apply.");
        return Ok(());
    }

    eprintln!("{}", ctx.formatter.format_plan(&plan));

    if !dry_run && !auto_approve && !confirm("Do you want to apply this plan? [y/N]: ", "y")? {
        eprintln!("Apply cancelled.");
        return Ok(());
    }

    let lock = if dry_run { None } else { lock };
    let outcome = with_lock(lock, reconciler.apply(&desired, dry_run)).await?;
    eprintln!("{}", ctx.formatter.format_outcome(&outcome));

    Ok(())
}

/// Check for drift.
async fn cmd_drift(ctx: &Context) -> Result<()> {
    let desired = load_desired(ctx.config.as_ref())?;
    let (plane, _lock) = open_plane(ctx).await?;

    let report = Reconciler::new(&plane).check_drift(&desired).await?;
    eprintln!("{}", ctx.formatter.format_drift(&report));

    Ok(())
}

/// Delete every live entity.
async fn cmd_destroy(ctx: &Context, continue_on_error: bool, auto_approve: bool) -> Result<()> {
    let (plane, lock) = open_plane(ctx).await?;
    let reconciler = Reconciler::new(&plane);

    let live = reconciler.read_current().await?;
    if live.entity_count() == 0 {
        eprintln!("No entities to destroy.");
        return Ok(());
    }

    eprintln!("{}", ctx.formatter.format_snapshot(&live));

    if !auto_approve
        && !confirm("\nThis action is IRREVERSIBLE. Type 'destroy' to confirm: ", "destroy")?
    {
        eprintln!("Destruction cancelled.");
        return Ok(());
    }

    let report = with_lock(lock, reconciler.destroy(continue_on_error)).await?;
    eprintln!("{}", ctx.formatter.format_phase(&report));

    report.into_result()?;
    Ok(())
}

/// Show the live configuration.
async fn cmd_show(ctx: &Context) -> Result<()> {
    let (plane, _lock) = open_plane(ctx).await?;

    let live = Reconciler::new(&plane).read_current().await?;
    eprintln!("{}", ctx.formatter.format_snapshot(&live));

    Ok(())
}

/// Export the live configuration to a snapshot file.
async fn cmd_export(ctx: &Context, path: &Path) -> Result<()> {
    let (plane, _lock) = open_plane(ctx).await?;

    let live = Reconciler::new(&plane).read_current().await?;
    let written = SnapshotParser::write_file(&live, path)?;
    eprintln!("Exported {} entities to {}", live.entity_count(), written.display());

    Ok(())
}

/// Release the state lock.
async fn cmd_unlock(ctx: &Context, lock_id: Option<String>, force: bool) -> Result<()> {
    let (_plane, lock) = open_plane(ctx).await?;
    let Some(lock) = lock else {
        eprintln!("No lock file for this state.");
        return Ok(());
    };

    if force {
        if let Some(lock_info) = lock.read().await? {
            lock.release(&lock_info.lock_id).await?;
            eprintln!("State forcefully unlocked (was held by {}).", lock_info.holder);
        } else {
            eprintln!("State is not locked.");
        }
    } else if let Some(id) = lock_id {
        lock.release(&id).await?;
        eprintln!("State unlocked.");
    } else {
        eprintln!("Please provide --lock-id or use --force");
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Creates a parser rooted next to the snapshot and loads its `.env`.
fn parser_for(config_file: &Path) -> Result<SnapshotParser> {
    let parser = SnapshotParser::for_config_file(config_file);
    parser.load_dotenv()?;
    Ok(parser)
}

/// Loads and validates the desired snapshot.
fn load_desired(config_path: Option<&PathBuf>) -> Result<ClusterConfig> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading configuration from: {}", config_file.display());

    let config = parser_for(&config_file)?.load_file(&config_file)?;

    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    Ok(config)
}

/// Opens the live state and wraps it with the configured throttle.
async fn open_plane(
    ctx: &Context,
) -> Result<(ThrottledControlPlane<LocalControlPlane>, Option<LockFile>)> {
    let state_path = ctx
        .state
        .clone()
        .unwrap_or_else(|| LocalControlPlane::default_path(Path::new(".")));

    let local = LocalControlPlane::open(state_path).await?;
    let lock = local.lock_file();

    if !ctx.delay.is_zero() {
        debug!("Throttling control plane calls by {:?}", ctx.delay);
    }

    Ok((ThrottledControlPlane::new(local, ctx.delay), lock))
}

/// Runs `work` while holding the state lock, if there is one.
async fn with_lock<T>(lock: Option<LockFile>, work: impl Future<Output = Result<T>>) -> Result<T> {
    let Some(lock) = lock else {
        return work.await;
    };

    let info = lock.acquire(&generate_holder_id()).await?;
    let result = work.await;
    lock.release(&info.lock_id).await?;
    result
}

/// Asks for confirmation on stderr.
fn confirm(prompt: &str, expected: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case(expected))
}
