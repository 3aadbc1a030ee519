//! The computation seam behind the submission endpoints.
//!
//! All heavy work — structure assignment, homology search, alignment/profile
//! construction — happens in external tools. A [`PipelineStrategy`] exposes
//! the three operations the front end needs; the two implementations differ
//! only in which alignment tool chain they drive. Both endpoints of a server
//! process hold their strategy behind `Arc` and never swap it after startup.

mod legacy;
mod tools;
mod v2;

pub use legacy::LegacyPipeline;
pub use tools::invoke;
pub use v2::V2Pipeline;

use crate::error::ServiceError;
use std::path::PathBuf;

/// Identifier used when a submission carries no usable structure identifier.
pub const PLACEHOLDER_ID: &str = "UNKN";

/// Tunables for one tool chain, built once at startup and passed by value to
/// the strategy that owns it. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Logical name of the sequence databank searched for relatives.
    pub databank: String,
    /// Binary that turns coordinate text into the per-residue assignment.
    pub structure_tool: PathBuf,
    /// Binary that performs the search and renders the alignment summary.
    pub profile_tool: PathBuf,
    /// Ceiling on the number of hits included in a rendered summary.
    pub max_hits: u32,
}

/// The three computations a submission endpoint can request.
///
/// Implementations must be safe to share across concurrent requests; a call
/// blocks its handling thread for the full duration of the tool run. Any
/// failure surfaces as a descriptive error — no partial results.
pub trait PipelineStrategy: Send + Sync {
    /// Per-residue structural-state assignment from coordinate text.
    fn assign_structure(&self, structure: &str) -> Result<String, ServiceError>;

    /// Alignment summary for a structure: assignment, then homology search
    /// against the configured databank, then profile rendering.
    fn align_from_structure(&self, structure: &str) -> Result<String, ServiceError>;

    /// Alignment summary for a bare sequence.
    fn align_from_sequence(&self, sequence: &str) -> Result<String, ServiceError>;
}

/// Extract the 4-character identifier a structure file carries at byte
/// offsets `[62, 66)` of its header line. `None` when the text is too short
/// to carry one.
pub fn structure_id(structure: &str) -> Option<String> {
    let bytes = structure.as_bytes();
    if bytes.len() > 66 {
        Some(String::from_utf8_lossy(&bytes[62..66]).into_owned())
    } else {
        None
    }
}

/// Assignment shared by both strategies: pipe the coordinate text through
/// the structure tool.
fn assign(config: &PipelineConfig, structure: &str) -> Result<String, ServiceError> {
    if structure.trim().is_empty() {
        return Err(ServiceError::malformed("empty structure submission"));
    }
    tools::invoke(&config.structure_tool, &[], structure)
}

fn require_sequence(sequence: &str) -> Result<(), ServiceError> {
    if sequence.trim().is_empty() {
        return Err(ServiceError::malformed("empty sequence submission"));
    }
    Ok(())
}
