//! Process lifecycle for the server binary.
//!
//! `Configuring → (Daemonizing) → Binding → Serving → ShuttingDown →
//! Stopped`. Configuration violations are fatal before anything binds; once
//! serving, the only way out is a termination signal, after which both
//! endpoints stop accepting before either is waited on.

use crate::config::ServerConfig;
use crate::daemon;
use crate::databank::DatabankTable;
use crate::error::ServiceError;
use crate::pipeline::{LegacyPipeline, PipelineStrategy, V2Pipeline};
use crate::server::ServiceEndpoint;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::iterator::Signals;
use std::sync::Arc;
use tracing::info;

/// Run the server to completion: returns `Ok(())` only after an orderly
/// signal-driven shutdown, so the caller can exit 0.
pub fn run(config: ServerConfig) -> anyhow::Result<()> {
    // Configuring: never reach the serving state with a broken setup.
    config.validate()?;

    if config.daemonize {
        daemon::open_log_file(&config.log_file)?;
        daemon::daemonize(config.user.as_deref(), &config.pid_file)?;
    }

    may::config().set_workers(config.workers);

    // Install the termination watcher before binding so a signal arriving
    // during startup is not lost.
    let mut signals = Signals::new(TERM_SIGNALS)?;

    let endpoints = bind_endpoints(&config)?;
    info!(
        legacy = %endpoints.0.addr(),
        v2 = %endpoints.1.addr(),
        "serving"
    );

    // Serving: block this thread until a termination trigger arrives. The
    // endpoint threads keep handling requests meanwhile.
    let signal = signals.forever().next();
    info!(?signal, "termination signal received");

    shutdown(endpoints);
    Ok(())
}

/// Construct both endpoints. The databank table is shared read-only; each
/// endpoint is bound to its own strategy for good.
pub fn bind_endpoints(
    config: &ServerConfig,
) -> Result<(ServiceEndpoint, ServiceEndpoint), ServiceError> {
    let databanks = Arc::new(DatabankTable::new(config.databank_dir.clone()));

    let legacy: Arc<dyn PipelineStrategy> = Arc::new(LegacyPipeline::new(
        databanks.clone(),
        config.legacy_pipeline(),
    ));
    let v2: Arc<dyn PipelineStrategy> =
        Arc::new(V2Pipeline::new(databanks, config.v2_pipeline()));

    let first = ServiceEndpoint::bind(
        "legacy",
        &config.address,
        config.port,
        &config.location,
        legacy,
    )
    .map_err(|e| {
        ServiceError::config(format!(
            "cannot bind {}:{}: {e}",
            config.address, config.port
        ))
    })?;

    let second = ServiceEndpoint::bind(
        "v2",
        &config.address,
        config.second_port(),
        &config.location2,
        v2,
    )
    .map_err(|e| {
        ServiceError::config(format!(
            "cannot bind {}:{}: {e}",
            config.address,
            config.second_port()
        ))
    })?;

    Ok((first, second))
}

/// Stop both endpoints accepting, then wait for each accept loop. The two
/// stop calls are issued before any join, so neither endpoint's shutdown can
/// block on the other's.
pub fn shutdown((first, second): (ServiceEndpoint, ServiceEndpoint)) {
    first.stop_accepting();
    second.stop_accepting();
    first.join();
    second.join();
    info!("all endpoints stopped");
}
