//! The original alignment tool chain.

use super::{assign, require_sequence, structure_id, tools, PipelineConfig, PipelineStrategy};
use super::PLACEHOLDER_ID;
use crate::databank::DatabankTable;
use crate::error::ServiceError;
use std::sync::Arc;

/// Strategy driving the legacy profile-alignment tool. Align-from-sequence
/// first synthesizes a placeholder assignment so the downstream chain always
/// sees the same record shape.
pub struct LegacyPipeline {
    databanks: Arc<DatabankTable>,
    config: PipelineConfig,
}

impl LegacyPipeline {
    pub fn new(databanks: Arc<DatabankTable>, config: PipelineConfig) -> Self {
        Self { databanks, config }
    }

    /// Search the configured databank and render the bounded alignment
    /// summary for an assignment record.
    fn search_and_render(&self, id: &str, assignment: &str) -> Result<String, ServiceError> {
        let db = self.databanks.load(&self.config.databank)?;
        let args = vec![
            "--databank".to_string(),
            db.dir().display().to_string(),
            "--id".to_string(),
            id.to_string(),
            "--max-hits".to_string(),
            self.config.max_hits.to_string(),
        ];
        tools::invoke(&self.config.profile_tool, &args, assignment)
    }
}

impl PipelineStrategy for LegacyPipeline {
    fn assign_structure(&self, structure: &str) -> Result<String, ServiceError> {
        assign(&self.config, structure)
    }

    fn align_from_structure(&self, structure: &str) -> Result<String, ServiceError> {
        let assignment = assign(&self.config, structure)?;
        let id = structure_id(structure).unwrap_or_else(|| PLACEHOLDER_ID.to_string());
        self.search_and_render(&id, &assignment)
    }

    fn align_from_sequence(&self, sequence: &str) -> Result<String, ServiceError> {
        require_sequence(sequence)?;
        let assignment = placeholder_assignment(sequence);
        self.search_and_render(PLACEHOLDER_ID, &assignment)
    }
}

/// Synthesize a single-chain assignment record for a bare sequence: fixed
/// header lines, one row per residue, every residue in the same
/// uninformative state.
fn placeholder_assignment(sequence: &str) -> String {
    let mut out = String::new();
    out.push_str(
        "==== Secondary Structure Definition by the program DSSP, \
         updated CMBI version by ElmK / April 1,2000 ==== DATE=28-MAY-2010     .\n",
    );
    out.push_str("REFERENCE\n");
    out.push_str("HEADER                                                        9UNK\n");
    out.push_str("COMPND\n");
    out.push_str("SOURCE\n");
    out.push_str("AUTHOR\n");
    out.push_str(&format!("{:05}  1  0  0  0\n", sequence.len()));
    out.push_str("  #\n");
    for (n, aa) in sequence.chars().enumerate() {
        let n = n + 1;
        out.push_str(&format!("{n:5}{n:5} A {}\n", aa.to_ascii_uppercase()));
    }
    out
}
