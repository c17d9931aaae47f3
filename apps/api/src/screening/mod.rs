// Screening — everything downstream of the anonymizer: section segmentation,
// role resolution, skills scoring, the external judge and the decision
// combiner, plus the pipeline and HTTP handlers that drive them.

pub mod decision;
pub mod handlers;
pub mod judge;
pub mod pipeline;
pub mod prompts;
pub mod roles;
pub mod sections;
pub mod skills;

pub use pipeline::Screener;
