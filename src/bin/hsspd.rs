//! Two-endpoint submission server.

use clap::Parser;
use hsspd::config::{ServerConfig, DEFAULT_PORT};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hsspd")]
#[command(about = "HSSP/DSSP submission server", long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    address: String,

    /// Port of the legacy endpoint
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Port of the v2 endpoint (default: port + 1)
    #[arg(long)]
    port2: Option<u16>,

    /// Location advertised by the legacy endpoint
    #[arg(short, long, default_value = "")]
    location: String,

    /// Location advertised by the v2 endpoint
    #[arg(short = 'n', long, default_value = "")]
    location2: String,

    /// User to run as in daemon mode
    #[arg(short, long, default_value = "nobody")]
    user: String,

    /// Structure-assignment tool
    #[arg(long, default_value = "/usr/local/bin/mkdssp")]
    dssp: PathBuf,

    /// Legacy profile-alignment tool
    #[arg(long, default_value = "/usr/local/bin/maxhom")]
    maxhom: PathBuf,

    /// V2 profile-construction tool
    #[arg(long, default_value = "/usr/local/bin/clustalo")]
    clustalo: PathBuf,

    /// Root directory holding the databanks
    #[arg(long, default_value = "/data/databanks")]
    databank_dir: PathBuf,

    /// Sequence databank searched for relatives
    #[arg(short = 'b', long, default_value = "uniprot")]
    databank: String,

    /// Maximum hits in a rendered alignment summary
    #[arg(short = 'm', long, default_value_t = 1500)]
    max_hits: u32,

    /// Worker threads per endpoint
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Do not fork a daemon
    #[arg(short = 'D', long)]
    no_daemon: bool,
}

#[cfg(unix)]
fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };
    let config = ServerConfig {
        address: args.address,
        port: args.port,
        port2: args.port2,
        location: args.location,
        location2: args.location2,
        user: Some(args.user),
        daemonize: !args.no_daemon,
        workers: args.threads,
        databank_dir: args.databank_dir,
        databank: args.databank,
        structure_tool: args.dssp,
        legacy_tool: args.maxhom,
        v2_tool: args.clustalo,
        max_hits: args.max_hits,
        ..ServerConfig::default()
    };

    if let Err(err) = hsspd::lifecycle::run(config) {
        eprintln!("hsspd: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(not(unix))]
fn main() {
    eprintln!("hsspd only runs on unix systems");
    std::process::exit(1);
}
