//! Song evaluation pipeline: audio in, schema-conformant A&R report out.
//!
//! The pipeline is deliberately failure-masking: once an upload has passed
//! input validation, every downstream problem (model transport error,
//! unparseable response, schema violation) is substituted with a fixed
//! fallback report so the client-facing flow never breaks.

mod extract;
mod models;
pub mod rubric;
mod service;

pub use extract::{parse_evaluation, PARSE_STRATEGIES};
pub use models::{ArReport, EvaluationReport, SongEvaluation, SongScores};
pub use service::{EvaluationOutcome, SongEvaluator};
