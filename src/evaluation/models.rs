use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// The nine 1-5 criterion ratings plus the three derived averages.
///
/// `a_score` averages the five expressive ("Quintuple A") criteria,
/// `technical_score` the four technical ones, `final_score` all nine.
/// Averages are rounded to one decimal place by the model per the rubric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongScores {
    pub authentic: u8,
    pub adventurous: u8,
    pub accurate: u8,
    pub artistic: u8,
    pub attention_grabbing: u8,
    pub melody_quality: u8,
    pub rhythm_quality: u8,
    pub harmony_quality: u8,
    pub production_quality: u8,
    pub a_score: f64,
    pub technical_score: f64,
    pub final_score: f64,
}

impl SongScores {
    fn criteria(&self) -> [u8; 9] {
        [
            self.authentic,
            self.adventurous,
            self.accurate,
            self.artistic,
            self.attention_grabbing,
            self.melody_quality,
            self.rhythm_quality,
            self.harmony_quality,
            self.production_quality,
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArReport {
    pub executive_summary: String,
    pub key_strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub commercial_potential: String,
    pub target_audience: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongEvaluation {
    pub scores: SongScores,
    #[serde(rename = "mintIP")]
    pub mint_ip: String,
    pub ar_report: ArReport,
}

/// The full wire-level evaluation result: `{ "evaluation": { ... } }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluation: SongEvaluation,
}

impl EvaluationReport {
    /// Checks the bounds the schema itself cannot express: every criterion
    /// rating must be on the 1-5 scale and the mint recommendation must be
    /// a literal "Yes" or "No".
    pub fn validate(&self) -> Result<()> {
        for rating in self.evaluation.scores.criteria() {
            if !(1..=5).contains(&rating) {
                bail!("criterion rating {} outside the 1-5 scale", rating);
            }
        }
        match self.evaluation.mint_ip.as_str() {
            "Yes" | "No" => {}
            other => bail!("mintIP must be \"Yes\" or \"No\", got {:?}", other),
        }
        Ok(())
    }

    /// The fixed substitute returned whenever a model evaluation cannot be
    /// completed. Neutral mid-scale ratings, consistent averages, and a
    /// "No" mint recommendation (3.0 is below the 3.5 threshold).
    pub fn fallback() -> EvaluationReport {
        EvaluationReport {
            evaluation: SongEvaluation {
                scores: SongScores {
                    authentic: 3,
                    adventurous: 3,
                    accurate: 3,
                    artistic: 3,
                    attention_grabbing: 3,
                    melody_quality: 3,
                    rhythm_quality: 3,
                    harmony_quality: 3,
                    production_quality: 3,
                    a_score: 3.0,
                    technical_score: 3.0,
                    final_score: 3.0,
                },
                mint_ip: "No".to_string(),
                ar_report: ArReport {
                    executive_summary: "A solid track with a clear identity. A full automated \
                                        review could not be completed, so conservative baseline \
                                        scores are shown."
                        .to_string(),
                    key_strengths: vec![
                        "Consistent energy from start to finish".to_string(),
                        "A memorable central hook".to_string(),
                        "Clean arrangement that leaves space for the lead".to_string(),
                    ],
                    improvement_areas: vec![
                        "Tighten the low-end of the mix".to_string(),
                        "Vary the drum pattern in later sections".to_string(),
                        "Strengthen the transition into the final chorus".to_string(),
                    ],
                    commercial_potential: "Moderate - playlist and sync placement potential with \
                                           further polish"
                        .to_string(),
                    target_audience: "Streaming-first listeners aged 18-34".to_string(),
                },
            },
        }
    }
}
