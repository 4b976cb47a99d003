use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "jotter",
    about = "jotter — posts, comments and a profile over HTTP, snapshotted to JSON",
    version,
)]
pub struct Cli {
    /// Defaults to `serve` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server until SIGINT or SIGTERM
    Serve(ServeArgs),
    /// Inspect the persisted snapshot
    Snapshot(SnapshotArgs),
}

#[derive(Args, Default)]
pub struct ServeArgs {
    /// TOML config file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Snapshot file path
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Fail requests with 500 when the snapshot cannot be written
    #[arg(long)]
    pub strict_persistence: bool,
    /// Delete a post's comments together with the post
    #[arg(long)]
    pub cascade_post_delete: bool,
    /// Load the snapshot file before serving
    #[arg(long)]
    pub restore: bool,
}

#[derive(Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub action: SnapshotAction,
}

#[derive(Subcommand)]
pub enum SnapshotAction {
    /// Print the persisted document and record counts
    Show {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_no_subcommand() {
        let cli = Cli::try_parse_from(["jotter"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "jotter",
            "serve",
            "--bind",
            "127.0.0.1:9000",
            "--snapshot",
            "/tmp/db.json",
            "--strict-persistence",
            "--restore",
        ])
        .unwrap();
        if let Some(Command::Serve(args)) = cli.command {
            assert_eq!(args.bind, Some("127.0.0.1:9000".parse().unwrap()));
            assert_eq!(args.snapshot, Some(PathBuf::from("/tmp/db.json")));
            assert!(args.strict_persistence);
            assert!(args.restore);
            assert!(!args.cascade_post_delete);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_rejects_bad_bind() {
        assert!(Cli::try_parse_from(["jotter", "serve", "--bind", "nope"]).is_err());
    }

    #[test]
    fn parse_snapshot_show() {
        let cli = Cli::try_parse_from(["jotter", "snapshot", "show", "--path", "x.json"]).unwrap();
        match cli.command {
            Some(Command::Snapshot(SnapshotArgs { action: SnapshotAction::Show { path, config } })) => {
                assert_eq!(path, Some(PathBuf::from("x.json")));
                assert!(config.is_none());
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["jotter", "--verbose", "serve"]).unwrap();
        assert!(cli.verbose);
    }
}
