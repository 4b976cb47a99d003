use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use jotter_server::{JotterServer, ServerConfig};
use jotter_store::{render, Dataset, JsonFileSnapshot, PersistPolicy, SnapshotWriter};

use crate::cli::*;
use crate::logging;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => cmd_serve(args, cli.verbose),
        Command::Snapshot(args) => match args.action {
            SnapshotAction::Show { path, config } => cmd_snapshot_show(path, config, cli.verbose),
        },
    }
}

fn base_config(path: Option<&PathBuf>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(p) => ServerConfig::load(p).with_context(|| format!("failed to load {}", p.display())),
        None => Ok(ServerConfig::default()),
    }
}

/// Merge the config file (if any) with command-line overrides.
pub fn resolve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = base_config(args.config.as_ref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(snapshot) = &args.snapshot {
        config.snapshot_path = snapshot.clone();
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = log_file.clone();
    }
    if args.strict_persistence {
        config.persistence = PersistPolicy::Strict;
    }
    if args.cascade_post_delete {
        config.cascade_post_delete = true;
    }
    if args.restore {
        config.restore_on_start = true;
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs, verbose: bool) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    logging::init_with_file(&config.log_file, verbose)?;
    tracing::debug!(?config, "resolved configuration");

    println!(
        "{} jotter on {} (snapshot: {}, log: {})",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        config.snapshot_path.display().to_string().cyan(),
        config.log_file.display(),
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(JotterServer::new(config).serve())
        .context("server error")?;

    println!("{} Server has been shut down.", "✓".green().bold());
    Ok(())
}

fn cmd_snapshot_show(
    path: Option<PathBuf>,
    config: Option<PathBuf>,
    verbose: bool,
) -> anyhow::Result<()> {
    logging::init_stderr(verbose)?;
    let path = match path {
        Some(p) => p,
        None => base_config(config.as_ref())?.snapshot_path,
    };

    let snapshot = JsonFileSnapshot::new(&path);
    let Some(loaded) = snapshot
        .load()
        .with_context(|| format!("failed to read {}", path.display()))?
    else {
        println!("No snapshot at {}.", path.display().to_string().bold());
        return Ok(());
    };

    let data = Dataset::from_snapshot(loaded);
    println!("Snapshot {}", path.display().to_string().bold());
    println!("  Posts:    {}", data.posts.len().to_string().yellow());
    println!("  Comments: {}", data.comments.len().to_string().yellow());
    let profile = if data.profile.is_empty() {
        "(unset)".dimmed().to_string()
    } else {
        data.profile.name.green().to_string()
    };
    println!("  Profile:  {profile}");
    println!();
    print!("{}", String::from_utf8_lossy(&render(&data.document())?));
    Ok(())
}
