//! # hsspd
//!
//! A network front end that turns protein structure and sequence submissions
//! into annotated alignment reports (DSSP, HSSP). The heavy computation —
//! structure assignment, homology search, alignment/profile construction —
//! is delegated to external tools and databanks; this crate is the
//! request-ingestion and service-lifecycle layer in front of them.
//!
//! ## Architecture
//!
//! - **[`multipart`]** - hand-rolled streaming decoder for
//!   `multipart/form-data` submissions
//! - **[`router`]** - method/URI dispatch shared by both protocol versions;
//!   maps every failure to the HTML error page
//! - **[`pipeline`]** - the [`pipeline::PipelineStrategy`] seam with its
//!   legacy and v2 tool-chain implementations
//! - **[`databank`]** - shared read-only record stores opened by logical name
//! - **[`server`]** - `may_minihttp` transport glue and the endpoint handle
//! - **[`lifecycle`]** - daemonize, bind two endpoints, serve, coordinated
//!   signal-driven shutdown
//! - **[`config`]** - startup configuration, built once and passed down
//! - **[`cli`]** - the `mkhssp` report builder
//!
//! A server process runs two endpoints at once, one per pipeline strategy,
//! with identical routing and error handling. Request handling is fully
//! synchronous per connection: decode, dispatch, pipeline call, respond. A
//! pipeline call blocks its handling thread for the duration of the external
//! tool run; that is the intended operating mode, not an error.
//!
//! ## Quick start
//!
//! ```no_run
//! use hsspd::config::ServerConfig;
//!
//! let config = ServerConfig {
//!     daemonize: false,
//!     ..ServerConfig::default()
//! };
//! hsspd::lifecycle::run(config).expect("server failed");
//! ```
//!
//! ## Error handling
//!
//! One taxonomy, [`ServiceError`], covers the whole crate. Malformed input,
//! unknown identifiers, and tool failures are recovered at the router
//! boundary and rendered as an error page; configuration errors are fatal
//! before serving begins and never afterwards.

pub mod cli;
pub mod config;
#[cfg(unix)]
pub mod daemon;
pub mod databank;
pub mod error;
#[cfg(unix)]
pub mod lifecycle;
pub mod multipart;
pub mod pages;
pub mod pipeline;
pub mod router;
pub mod server;

pub use error::ServiceError;
pub use pipeline::{LegacyPipeline, PipelineConfig, PipelineStrategy, V2Pipeline};
pub use router::{Router, RouterResponse};
