//! The `mkhssp` command: build an HSSP alignment report for one structure.
//!
//! Input is a coordinate file (optionally gzip/bzip2 compressed) or a
//! 4-character identifier resolved against the structure databank. Output
//! goes to a file — a `.gz`/`.bz2` suffix selects compression — or to
//! standard output. A per-user `~/.mkhssprc` supplies defaults for any flag
//! left unset on the command line.

use crate::databank::DatabankTable;
use crate::error::ServiceError;
use crate::pipeline::{self, PLACEHOLDER_ID};
use anyhow::{bail, Context};
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use clap::Parser;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Output value that selects standard output instead of a file.
const STDOUT_SENTINEL: &str = "stdout";

/// Databank holding structure records, used to resolve identifier inputs.
const STRUCTURE_DATABANK: &str = "pdb";

/// Databank mapping structure identifiers to per-chain profile lists.
const CHAIN_INDEX_DATABANK: &str = "hssp2ix";

#[derive(Parser, Debug)]
#[command(name = "mkhssp")]
#[command(about = "Build an HSSP alignment report for a structure", long_about = None)]
pub struct Cli {
    /// Input PDB file (.gz/.bz2 supported) or a 4-character structure identifier
    pub input: String,

    /// Output file (.gz/.bz2 triggers compression); 'stdout' or absent writes to standard output
    pub output: Option<String>,

    /// Sequence databank to search
    #[arg(short = 'b', long)]
    pub databank: Option<String>,

    /// Root directory holding the databanks
    #[arg(long)]
    pub databank_dir: Option<PathBuf>,

    /// Directory containing fasta databank files
    #[arg(short = 'f', long)]
    pub fastadir: Option<PathBuf>,

    /// Search/profile tool executable
    #[arg(long)]
    pub search_tool: Option<PathBuf>,

    /// Max runtime in seconds for the search tool
    #[arg(long)]
    pub max_runtime: Option<u32>,

    /// Number of threads (default is the number of cores)
    #[arg(short = 'a', long)]
    pub threads: Option<u32>,

    /// Number of search iterations
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Maximum number of search hits to read
    #[arg(long)]
    pub max_search_hits: Option<u32>,

    /// Maximum number of hits to include in the report
    #[arg(short = 'm', long)]
    pub max_hits: Option<u32>,

    /// Directory containing precomputed per-chain alignment profiles
    #[arg(long)]
    pub datadir: Option<PathBuf>,

    /// Chain to profile-file mapping, CHAIN=FILE, repeatable
    #[arg(long)]
    pub chain: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Debug level (for even more verbose output)
    #[arg(short, long)]
    pub debug: Option<u8>,
}

/// Defaults read from `~/.mkhssprc`. Every field is optional; a value here
/// applies only where the corresponding flag was not given.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RcFile {
    pub databank: Option<String>,
    pub databank_dir: Option<PathBuf>,
    pub fastadir: Option<PathBuf>,
    pub search_tool: Option<PathBuf>,
    pub max_runtime: Option<u32>,
    pub threads: Option<u32>,
    pub iterations: Option<u32>,
    pub max_search_hits: Option<u32>,
    pub max_hits: Option<u32>,
    pub datadir: Option<PathBuf>,
}

impl RcFile {
    /// Load the per-user configuration file, if any.
    pub fn load() -> Self {
        match dirs::home_dir() {
            Some(home) => Self::from_path(&home.join(".mkhssprc")),
            None => Self::default(),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let Ok(text) = fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&text).unwrap_or_else(|e| {
            warn!(file = %path.display(), error = %e, "ignoring unreadable configuration file");
            Self::default()
        })
    }
}

/// Fully resolved run parameters: flag value, else configuration file value,
/// else built-in default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: String,
    pub output: Option<String>,
    pub databank: String,
    pub databank_dir: PathBuf,
    pub fastadir: PathBuf,
    pub search_tool: PathBuf,
    pub max_runtime: u32,
    pub threads: u32,
    pub iterations: u32,
    pub max_search_hits: u32,
    pub max_hits: u32,
    pub datadir: PathBuf,
    pub chains: Vec<String>,
}

impl Settings {
    pub fn resolve(cli: Cli, rc: RcFile) -> Self {
        let default_threads = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        Self {
            input: cli.input,
            output: cli.output,
            databank: cli
                .databank
                .or(rc.databank)
                .unwrap_or_else(|| "uniref100".to_string()),
            databank_dir: cli
                .databank_dir
                .or(rc.databank_dir)
                .unwrap_or_else(|| PathBuf::from("/data/databanks")),
            fastadir: cli
                .fastadir
                .or(rc.fastadir)
                .unwrap_or_else(|| PathBuf::from("/data/fasta")),
            search_tool: cli
                .search_tool
                .or(rc.search_tool)
                .unwrap_or_else(|| PathBuf::from("/usr/local/bin/jackhmmer")),
            max_runtime: cli.max_runtime.or(rc.max_runtime).unwrap_or(3600),
            threads: cli.threads.or(rc.threads).unwrap_or(default_threads).max(1),
            iterations: cli.iterations.or(rc.iterations).unwrap_or(5),
            max_search_hits: cli.max_search_hits.or(rc.max_search_hits).unwrap_or(1500),
            max_hits: cli.max_hits.or(rc.max_hits).unwrap_or(1500),
            datadir: cli.datadir.or(rc.datadir).unwrap_or_else(|| PathBuf::from(".")),
            chains: cli.chain,
        }
    }

    /// Startup checks. Explicit chain mappings bypass the search step, so
    /// the search tool and fasta directory are only required without them.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.chains.is_empty() {
            if !self.search_tool.is_file() {
                return Err(ServiceError::config(format!(
                    "search tool {} not found",
                    self.search_tool.display()
                )));
            }
            if !self.fastadir.is_dir() {
                return Err(ServiceError::config(format!(
                    "fasta databank directory {} not found",
                    self.fastadir.display()
                )));
            }
        }
        if !self.datadir.is_dir() {
            return Err(ServiceError::config(format!(
                "data directory {} not found",
                self.datadir.display()
            )));
        }
        Ok(())
    }
}

/// Entry point for the binary. Usage errors and `--help` exit 1, like every
/// other failure of this tool.
pub fn run() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, cli.debug);
    raise_core_limit();

    let settings = Settings::resolve(cli, RcFile::load());
    execute(&settings)
}

/// Run one report build with fully resolved settings.
pub fn execute(settings: &Settings) -> anyhow::Result<()> {
    settings.validate()?;

    let table = DatabankTable::new(settings.databank_dir.clone());
    let structure = read_input(settings, &table)?;
    let chains = resolve_chains(settings, &table, &structure);

    match settings.output.as_deref() {
        Some(path) if path != STDOUT_SENTINEL => {
            // The file exists for the duration of the run; a failed run
            // must not leave it behind.
            let file = File::create(path)
                .with_context(|| format!("could not create output file {path}"))?;
            let written = build_report(settings, &table, &structure, &chains)
                .map_err(anyhow::Error::from)
                .and_then(|report| write_output(file, path, &report));
            if let Err(err) = written {
                let _ = fs::remove_file(path);
                return Err(err);
            }
        }
        _ => {
            let report = build_report(settings, &table, &structure, &chains)?;
            std::io::stdout().write_all(report.as_bytes())?;
        }
    }
    Ok(())
}

/// Read the structure text: a local file first, otherwise a 4-character
/// identifier looked up in the structure databank.
fn read_input(settings: &Settings, table: &DatabankTable) -> anyhow::Result<String> {
    let path = Path::new(&settings.input);
    if path.is_file() {
        let file =
            File::open(path).with_context(|| format!("cannot open {}", settings.input))?;
        let mut text = String::new();
        if settings.input.ends_with(".bz2") {
            BzDecoder::new(file).read_to_string(&mut text)?;
        } else if settings.input.ends_with(".gz") {
            GzDecoder::new(file).read_to_string(&mut text)?;
        } else {
            let mut file = file;
            file.read_to_string(&mut text)?;
        }
        Ok(text)
    } else if settings.input.len() == 4 {
        let pdb = table.load(STRUCTURE_DATABANK)?;
        Ok(pdb.fetch(&settings.input)?)
    } else {
        bail!(
            "input {} is neither a readable file nor a 4-character identifier",
            settings.input
        );
    }
}

/// Chain profile mappings: explicit flags win; otherwise the chain index
/// databank is consulted. A missing index only disables the bypass.
fn resolve_chains(settings: &Settings, table: &DatabankTable, structure: &str) -> Vec<String> {
    if !settings.chains.is_empty() {
        return settings.chains.clone();
    }
    let Some(id) = pipeline::structure_id(structure) else {
        return Vec::new();
    };
    match table
        .load(CHAIN_INDEX_DATABANK)
        .and_then(|ix| ix.fetch(&id))
    {
        Ok(info) => info
            .lines()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
        Err(err) => {
            warn!(error = %err, "no chain profile index for this structure");
            Vec::new()
        }
    }
}

fn build_report(
    settings: &Settings,
    table: &DatabankTable,
    structure: &str,
    chains: &[String],
) -> Result<String, ServiceError> {
    let db = table.load(&settings.databank)?;
    let id = pipeline::structure_id(structure).unwrap_or_else(|| PLACEHOLDER_ID.to_string());

    let mut args = vec![
        "--databank".to_string(),
        db.dir().display().to_string(),
        "--fastadir".to_string(),
        settings.fastadir.display().to_string(),
        "--datadir".to_string(),
        settings.datadir.display().to_string(),
        "--id".to_string(),
        id,
        "--threads".to_string(),
        settings.threads.to_string(),
        "--iterations".to_string(),
        settings.iterations.to_string(),
        "--max-runtime".to_string(),
        settings.max_runtime.to_string(),
        "--max-search-hits".to_string(),
        settings.max_search_hits.to_string(),
        "--max-hits".to_string(),
        settings.max_hits.to_string(),
    ];
    for chain in chains {
        args.push("--chain".to_string());
        args.push(chain.clone());
    }

    pipeline::invoke(&settings.search_tool, &args, structure)
}

fn write_output(file: File, path: &str, body: &str) -> anyhow::Result<()> {
    if path.ends_with(".bz2") {
        let mut w = BzEncoder::new(file, bzip2::Compression::best());
        w.write_all(body.as_bytes())?;
        w.finish()?;
    } else if path.ends_with(".gz") {
        let mut w = GzEncoder::new(file, flate2::Compression::default());
        w.write_all(body.as_bytes())?;
        w.finish()?;
    } else {
        let mut file = file;
        file.write_all(body.as_bytes())?;
    }
    Ok(())
}

fn init_tracing(verbose: bool, debug: Option<u8>) {
    let filter = match (debug, verbose) {
        (Some(_), _) => "trace",
        (None, true) => "debug",
        (None, false) => "info",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Allow core dumps for post-mortem debugging of crashed runs.
#[cfg(unix)]
fn raise_core_limit() {
    unsafe {
        let mut limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        if libc::getrlimit(libc::RLIMIT_CORE, &mut limit) == 0 {
            limit.rlim_cur = limit.rlim_max;
            if limit.rlim_cur == 0 || libc::setrlimit(libc::RLIMIT_CORE, &limit) < 0 {
                warn!("failed to raise the core size limit");
            }
        }
    }
}

#[cfg(not(unix))]
fn raise_core_limit() {}
