//! # atrecord CLI entry point
//!
//! Parses command-line arguments, installs logging and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use atrecord_cli::extract::{run_extract, ExtractArgs};
use atrecord_cli::inspect::{run_inspect, InspectArgs};
use atrecord_cli::load_config;
use atrecord_cli::verify::{run_verify, VerifyArgs};

/// Verify AT Protocol records against the signed repositories that hold them.
#[derive(Parser, Debug)]
#[command(name = "atrecord", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML verification config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a claimed record against its repository container.
    Verify(VerifyArgs),

    /// Print a container's roots, commit and tree entries.
    Inspect(InspectArgs),

    /// Write the single-record proof container for one key.
    Extract(ExtractArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        tracing::debug!(?config, "loaded configuration");
        match &cli.command {
            Commands::Verify(args) => run_verify(args, &config),
            Commands::Inspect(args) => run_inspect(args, &config),
            Commands::Extract(args) => run_extract(args, &config),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_verify_with_car() {
        let cli = Cli::try_parse_from([
            "atrecord",
            "verify",
            "--uri",
            "at://did:plc:abc/app.bsky.feed.post/3k2a",
            "--cid",
            "bafyreie5737gdxlw5i64vzichcalba3z2v5n6icifvx5xytvske7mr3hpm",
            "--record",
            "post.json",
            "--did-doc",
            "did.json",
            "--car",
            "repo.car",
            "--json",
        ])
        .unwrap();
        if let Commands::Verify(args) = cli.command {
            assert_eq!(args.car, Some(PathBuf::from("repo.car")));
            assert!(args.car_dir.is_none());
            assert!(args.json);
        } else {
            panic!("expected verify");
        }
    }

    #[test]
    fn cli_parse_verify_requires_a_source() {
        let result = Cli::try_parse_from([
            "atrecord", "verify", "--uri", "u", "--cid", "c", "--record", "r", "--did-doc", "d",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_verify_rejects_both_sources() {
        let result = Cli::try_parse_from([
            "atrecord", "verify", "--uri", "u", "--cid", "c", "--record", "r", "--did-doc", "d",
            "--car", "a.car", "--car-dir", "repos",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_inspect() {
        let cli = Cli::try_parse_from(["atrecord", "inspect", "repo.car"]).unwrap();
        assert!(matches!(cli.command, Commands::Inspect(_)));
    }

    #[test]
    fn cli_parse_extract() {
        let cli = Cli::try_parse_from([
            "atrecord",
            "extract",
            "repo.car",
            "--key",
            "app.bsky.feed.post/3k2a",
            "--out",
            "proof.car",
        ])
        .unwrap();
        if let Commands::Extract(args) = cli.command {
            assert_eq!(args.key, "app.bsky.feed.post/3k2a");
            assert_eq!(args.out, PathBuf::from("proof.car"));
        } else {
            panic!("expected extract");
        }
    }

    #[test]
    fn cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "atrecord",
            "-vv",
            "--log-json",
            "--config",
            "atrecord.yaml",
            "inspect",
            "repo.car",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert_eq!(cli.config, Some(PathBuf::from("atrecord.yaml")));
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["atrecord"]).is_err());
    }
}
