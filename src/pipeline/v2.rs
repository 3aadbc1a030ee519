//! The second-generation alignment tool chain.
//!
//! Same external contract as the legacy chain, different profile
//! construction: the tool builds the alignment in one pass and needs no hit
//! ceiling, and a bare sequence is handed over as-is instead of being
//! wrapped in a synthesized assignment record.

use super::{assign, require_sequence, structure_id, tools, PipelineConfig, PipelineStrategy};
use super::PLACEHOLDER_ID;
use crate::databank::DatabankTable;
use crate::error::ServiceError;
use std::sync::Arc;

pub struct V2Pipeline {
    databanks: Arc<DatabankTable>,
    config: PipelineConfig,
}

impl V2Pipeline {
    pub fn new(databanks: Arc<DatabankTable>, config: PipelineConfig) -> Self {
        Self { databanks, config }
    }

    fn render(&self, id: &str, input: &str) -> Result<String, ServiceError> {
        let db = self.databanks.load(&self.config.databank)?;
        let args = vec![
            "--databank".to_string(),
            db.dir().display().to_string(),
            "--id".to_string(),
            id.to_string(),
        ];
        tools::invoke(&self.config.profile_tool, &args, input)
    }
}

impl PipelineStrategy for V2Pipeline {
    fn assign_structure(&self, structure: &str) -> Result<String, ServiceError> {
        assign(&self.config, structure)
    }

    fn align_from_structure(&self, structure: &str) -> Result<String, ServiceError> {
        let assignment = assign(&self.config, structure)?;
        let id = structure_id(structure).unwrap_or_else(|| PLACEHOLDER_ID.to_string());
        self.render(&id, &assignment)
    }

    fn align_from_sequence(&self, sequence: &str) -> Result<String, ServiceError> {
        require_sequence(sequence)?;
        self.render(PLACEHOLDER_ID, sequence)
    }
}
