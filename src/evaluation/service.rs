use super::models::EvaluationReport;
use super::{extract::parse_evaluation, rubric};
use crate::gemini::{GenerativeModel, ModelError};
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Falls back to this when the upload declares no usable content type and
/// sniffing fails, matching the most common upload format.
const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// How an evaluation was produced, for diagnostics and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// The model's own evaluation, with the parse strategy that decoded it.
    Model { parse_path: &'static str },
    /// The fixed fallback, with the cause it masks.
    Fallback { cause: &'static str },
}

/// Turns an uploaded audio file into a schema-conformant evaluation.
///
/// Failures past input validation never surface to the caller: the model's
/// evaluation is substituted wholesale with [`EvaluationReport::fallback`]
/// so the client flow stays intact. Every substitution is logged with the
/// masked cause.
pub struct SongEvaluator {
    model: Arc<dyn GenerativeModel>,
}

impl SongEvaluator {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn evaluate(
        &self,
        audio: &[u8],
        declared_mime: Option<&str>,
    ) -> (EvaluationReport, EvaluationOutcome) {
        let mime_type = resolve_mime_type(audio, declared_mime);
        debug!(
            bytes = audio.len(),
            mime_type = %mime_type,
            "Encoding uploaded audio for evaluation"
        );
        let audio_b64 = base64::engine::general_purpose::STANDARD.encode(audio);

        info!(model = self.model.name(), "Requesting song evaluation");
        let response_text = match self.model.generate_from_audio(&mime_type, &audio_b64).await {
            Ok(text) => text,
            Err(err) => return self.fallback(cause_of(&err), &err.to_string()),
        };
        debug!(
            response_chars = response_text.len(),
            "Received model response"
        );

        let (parse_path, report) = match parse_evaluation(&response_text) {
            Some(parsed) => parsed,
            None => return self.fallback("unparseable-response", "no strategy decoded the text"),
        };
        info!(parse_path, "Decoded evaluation from model response");

        if let Err(err) = report.validate() {
            return self.fallback("schema-violation", &err.to_string());
        }

        if report.evaluation.mint_ip == "Yes"
            && report.evaluation.scores.final_score < rubric::MINT_THRESHOLD
        {
            // Well-formed but inconsistent with the rubric; keep it, log the drift
            warn!(
                final_score = report.evaluation.scores.final_score,
                "Model recommended minting below the rubric threshold"
            );
        }

        (report, EvaluationOutcome::Model { parse_path })
    }

    fn fallback(
        &self,
        cause: &'static str,
        detail: &str,
    ) -> (EvaluationReport, EvaluationOutcome) {
        warn!(cause, detail, "Substituting fallback evaluation");
        (
            EvaluationReport::fallback(),
            EvaluationOutcome::Fallback { cause },
        )
    }
}

fn cause_of(err: &ModelError) -> &'static str {
    match err {
        ModelError::Blocked(_) => "model-blocked",
        _ => "model-invocation-error",
    }
}

fn resolve_mime_type(audio: &[u8], declared: Option<&str>) -> String {
    if let Some(declared) = declared.filter(|mime| !mime.is_empty()) {
        return declared.to_string();
    }
    if let Some(kind) = infer::get(audio) {
        if kind.mime_type().starts_with("audio/") {
            return kind.mime_type().to_string();
        }
    }
    DEFAULT_AUDIO_MIME.to_string()
}
