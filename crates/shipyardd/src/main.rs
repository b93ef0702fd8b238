//! shipyardd: the continuous build daemon.
//!
//! Clones the tracked repository fresh at startup, then polls forever:
//! sync the branch, build every commit not yet present in the destination
//! directory, package and archive each one. Unrecoverable setup errors
//! (clone failure, uncreatable destination) exit non-zero; everything after
//! that is logged and retried.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use shipyard_core::{init_tracing, BuildOrchestrator, Manifest, Platform, Poller, WorkingRepo};

/// Directory name of the working clone under the daemon's working
/// directory.
const CHECKOUT_DIR: &str = "checkout";

/// Directory holding pre-built dependencies, passed to the configure step.
const DEPENDENCIES_DIR: &str = "Dependencies";

#[derive(Debug, Parser)]
#[command(name = "shipyardd", version, about = "Continuous build daemon")]
struct Args {
    /// Remote repository to track.
    #[arg(
        short,
        long,
        env = "SHIPYARD_REPO",
        default_value = "https://github.com/shipyard-build/quay.git"
    )]
    repo: String,

    /// Destination root for versioned build output.
    #[arg(short, long, env = "SHIPYARD_PATH")]
    path: PathBuf,

    /// Branch to build.
    #[arg(short, long, env = "SHIPYARD_BRANCH", default_value = "master")]
    branch: String,

    /// Polling interval in seconds.
    #[arg(short = 't', long, env = "SHIPYARD_PERIOD", default_value_t = 600)]
    period: u64,

    /// JSON packaging manifest; the built-in default is used when omitted.
    #[arg(long, env = "SHIPYARD_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Per-toolchain-step timeout in seconds; unbounded when omitted.
    #[arg(long)]
    step_timeout: Option<u64>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs, Level::INFO);

    let manifest = match &args.manifest {
        Some(path) => Manifest::load(path)
            .with_context(|| format!("failed to load manifest {}", path.display()))?,
        None => Manifest::default(),
    };

    let workdir = std::env::current_dir().context("cannot determine working directory")?;
    let checkout = workdir.join(CHECKOUT_DIR);
    let dependencies = workdir.join(DEPENDENCIES_DIR);

    info!(repo = %args.repo, checkout = %checkout.display(), "cloning working copy");
    let repo = WorkingRepo::clone_from(&args.repo, &checkout)
        .with_context(|| format!("failed to clone {}", args.repo))?;

    std::fs::create_dir_all(&args.path)
        .with_context(|| format!("cannot create destination {}", args.path.display()))?;

    let orchestrator = BuildOrchestrator::new(
        repo,
        args.path.clone(),
        dependencies,
        manifest,
        Platform::host(),
        args.step_timeout.map(Duration::from_secs),
    );

    info!(
        branch = %args.branch,
        destination = %args.path.display(),
        version = shipyard_core::VERSION,
        "shipyardd started"
    );
    Poller::new(orchestrator, args.branch, Duration::from_secs(args.period))
        .run()
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_with_required_path() {
        let args = Args::parse_from(["shipyardd", "--path", "/tmp/out"]);
        assert_eq!(args.path, PathBuf::from("/tmp/out"));
        assert_eq!(args.branch, "master");
        assert_eq!(args.period, 600);
        assert!(args.manifest.is_none());
        assert!(args.step_timeout.is_none());
    }

    #[test]
    fn args_accept_short_flags() {
        let args = Args::parse_from([
            "shipyardd",
            "-p",
            "/srv/builds",
            "-b",
            "release",
            "-t",
            "60",
            "-r",
            "https://example.com/repo.git",
        ]);
        assert_eq!(args.branch, "release");
        assert_eq!(args.period, 60);
        assert_eq!(args.repo, "https://example.com/repo.git");
    }
}
