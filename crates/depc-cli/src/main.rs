//! depc - disposable deployer dev-container provisioner

mod usage;

use clap::Parser;
use depc_config::{GlobalConfig, ProvisionConfig, ProvisionRequest};
use depc_core::Provisioner;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "depc")]
#[command(author, version, about = "Disposable deployer dev-container provisioner", long_about = None)]
struct Cli {
    /// Project kind
    #[arg(short, long, value_parser = ["konrad", "higgs", "racdb"])]
    project: String,

    /// Base source directory
    #[arg(short, long)]
    basedir: PathBuf,

    /// Install manifest copied into the workdir as install_json.json
    #[arg(short = 'j', long = "json")]
    json: PathBuf,

    /// Command that keeps the container alive
    #[arg(short, long, default_value = "tail -f /dev/null")]
    cmd: String,

    /// Container name (generated when omitted)
    #[arg(long)]
    cname: Option<String>,

    /// UID in container (defaults to the host user's)
    #[arg(long)]
    uid: Option<u32>,

    /// GID in container (defaults to the host user's)
    #[arg(long)]
    gid: Option<u32>,

    /// User name in container
    #[arg(long, default_value = "deployer")]
    uname: String,

    /// Group name in container
    #[arg(long, default_value = "deployer")]
    gname: String,

    /// Explicit image id (overrides the project image repository)
    #[arg(long)]
    imageid: Option<String>,

    /// Image tag
    #[arg(long, default_value = "latest")]
    tag: String,

    /// No-proxy host list
    #[arg(long, default_value = "localhost,127.0.0.1")]
    noproxy: String,

    /// Run the container in privileged mode
    #[arg(long)]
    privileged: bool,

    /// Force privileged tooling inside the container to run as root
    #[arg(long)]
    root: bool,

    /// Working directory (a fresh one is created when omitted)
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let global = GlobalConfig::load().unwrap_or_default();

    let request = ProvisionRequest {
        project: cli.project.parse().map_err(anyhow::Error::msg)?,
        image_id: cli.imageid,
        tag: cli.tag,
        command: cli.cmd,
        container_name: cli.cname,
        uid: cli.uid,
        gid: cli.gid,
        uname: cli.uname,
        gname: cli.gname,
        no_proxy: cli.noproxy,
        privileged: cli.privileged,
        run_as_root: cli.root,
        base_dir: cli.basedir,
        install_manifest: cli.json,
        workdir: cli.workdir,
    };
    let config = ProvisionConfig::resolve(request)?;
    tracing::info!(
        "Provisioning {} container {} in {}",
        config.project,
        config.container_name,
        config.workdir.display()
    );

    let provider = depc_provider::connect(&global.daemon.socket).await?;
    let mut provisioner = Provisioner::new(provider, global, config);
    let outcome = provisioner.run().await?;

    usage::print_hints(&outcome);
    Ok(())
}
