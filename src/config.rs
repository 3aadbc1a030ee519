//! Server startup configuration.
//!
//! Everything tunable is gathered here once, at startup, and passed down by
//! reference; nothing in the request path reads process-wide mutable state.

use crate::error::ServiceError;
use crate::pipeline::PipelineConfig;
use std::path::{Path, PathBuf};

/// Where the daemon records its process id.
pub const PID_FILE: &str = "/var/run/hsspd.pid";
/// Where the daemon's stdout/stderr land.
pub const LOG_FILE: &str = "/var/log/hsspd.log";

/// Default port of the legacy endpoint; the v2 endpoint takes the next port
/// unless overridden.
pub const DEFAULT_PORT: u16 = 10334;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address both endpoints bind to.
    pub address: String,
    /// Port of the legacy endpoint.
    pub port: u16,
    /// Port of the v2 endpoint; `port + 1` when unset.
    pub port2: Option<u16>,
    /// Location advertised by the legacy endpoint.
    pub location: String,
    /// Location advertised by the v2 endpoint.
    pub location2: String,
    /// Unprivileged account the daemon drops to; `None` keeps the invoking
    /// user.
    pub user: Option<String>,
    /// Detach from the terminal and run in the background.
    pub daemonize: bool,
    /// Worker threads per accept loop.
    pub workers: usize,
    /// Root directory holding the databanks.
    pub databank_dir: PathBuf,
    /// Logical name of the sequence databank.
    pub databank: String,
    /// Structure-assignment binary.
    pub structure_tool: PathBuf,
    /// Legacy profile-alignment binary.
    pub legacy_tool: PathBuf,
    /// V2 profile-construction binary.
    pub v2_tool: PathBuf,
    /// Hit ceiling for rendered alignment summaries.
    pub max_hits: u32,
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            port2: None,
            location: String::new(),
            location2: String::new(),
            user: Some("nobody".to_string()),
            daemonize: true,
            workers: 1,
            databank_dir: PathBuf::from("/data/databanks"),
            databank: "uniprot".to_string(),
            structure_tool: PathBuf::from("/usr/local/bin/mkdssp"),
            legacy_tool: PathBuf::from("/usr/local/bin/maxhom"),
            v2_tool: PathBuf::from("/usr/local/bin/clustalo"),
            max_hits: 1500,
            pid_file: PathBuf::from(PID_FILE),
            log_file: PathBuf::from(LOG_FILE),
        }
    }
}

impl ServerConfig {
    /// Port of the v2 endpoint.
    pub fn second_port(&self) -> u16 {
        self.port2.unwrap_or_else(|| self.port.saturating_add(1))
    }

    /// Check everything serving depends on. A violation is fatal: the
    /// process must never reach the serving state with a broken setup.
    pub fn validate(&self) -> Result<(), ServiceError> {
        require_tool(&self.structure_tool)?;
        require_tool(&self.legacy_tool)?;
        require_tool(&self.v2_tool)?;
        if !self.databank_dir.is_dir() {
            return Err(ServiceError::config(format!(
                "databank directory {} not found",
                self.databank_dir.display()
            )));
        }
        if self.workers == 0 {
            return Err(ServiceError::config("worker count must be at least 1"));
        }
        if self.port2.is_none() && self.port == u16::MAX {
            return Err(ServiceError::config(
                "no port left for the second endpoint; pass an explicit port",
            ));
        }
        Ok(())
    }

    pub fn legacy_pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            databank: self.databank.clone(),
            structure_tool: self.structure_tool.clone(),
            profile_tool: self.legacy_tool.clone(),
            max_hits: self.max_hits,
        }
    }

    pub fn v2_pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            databank: self.databank.clone(),
            structure_tool: self.structure_tool.clone(),
            profile_tool: self.v2_tool.clone(),
            max_hits: self.max_hits,
        }
    }
}

fn require_tool(path: &Path) -> Result<(), ServiceError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ServiceError::config(format!(
            "required tool {} not found",
            path.display()
        )))
    }
}
