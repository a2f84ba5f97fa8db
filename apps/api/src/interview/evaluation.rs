//! Evaluation: weighted scoring plus the model's assessment and screening decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interview::candidate::Candidate;
use crate::interview::parser::{complete_structured, marker_number, marker_value, ParseError, ReplySchema};
use crate::interview::prompts::{build_decision_prompt, build_evaluation_prompt, evaluation_system};
use crate::interview::transcript::AnsweredQuestion;
use crate::llm_client::CompletionClient;

pub const TECHNICAL_WEIGHT: f64 = 0.7;
pub const COMMUNICATION_WEIGHT: f64 = 0.2;
pub const CULTURAL_FIT_WEIGHT: f64 = 0.1;
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// The three scored components, each on a 0–10 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub technical: f64,
    pub communication: f64,
    pub cultural_fit: f64,
}

impl EvaluationScore {
    pub fn new(technical: f64, communication: f64, cultural_fit: f64) -> Self {
        Self {
            technical,
            communication,
            cultural_fit,
        }
    }

    /// 0.7 × technical + 0.2 × communication + 0.1 × cultural fit, clamped to 0–10.
    pub fn final_score(&self) -> f64 {
        let weighted = TECHNICAL_WEIGHT * self.technical
            + COMMUNICATION_WEIGHT * self.communication
            + CULTURAL_FIT_WEIGHT * self.cultural_fit;
        weighted.clamp(SCORE_MIN, SCORE_MAX)
    }

    fn validated(self) -> Result<Self, ParseError> {
        for (field, value) in [
            ("technical", self.technical),
            ("communication", self.communication),
            ("cultural_fit", self.cultural_fit),
        ] {
            if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(ParseError::OutOfRange {
                    field,
                    value,
                    min: SCORE_MIN,
                    max: SCORE_MAX,
                });
            }
        }
        Ok(self)
    }
}

/// Folds case, spaces, underscores and hyphens so "Strong Yes", "strong_yes" and
/// "StrongYes" compare equal.
fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Recommendation {
    StrongYes,
    Yes,
    No,
    StrongNo,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongYes => "Strong Yes",
            Recommendation::Yes => "Yes",
            Recommendation::No => "No",
            Recommendation::StrongNo => "Strong No",
        }
    }
}

impl FromStr for Recommendation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "strongyes" => Ok(Recommendation::StrongYes),
            "yes" => Ok(Recommendation::Yes),
            "no" => Ok(Recommendation::No),
            "strongno" => Ok(Recommendation::StrongNo),
            _ => Err(ParseError::UnknownValue(s.to_string())),
        }
    }
}

impl TryFrom<String> for Recommendation {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Recommendation> for String {
    fn from(value: Recommendation) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl FromStr for Confidence {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            _ => Err(ParseError::UnknownValue(s.to_string())),
        }
    }
}

impl TryFrom<String> for Confidence {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Confidence> for String {
    fn from(value: Confidence) -> Self {
        value.label().to_string()
    }
}

/// The model's written assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDetail {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: Recommendation,
    pub justification: String,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningDecision {
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    pub summary: String,
}

impl ReplySchema for ScreeningDecision {
    fn validated(self) -> Result<Self, ParseError> {
        Ok(Self {
            summary: self.summary.trim().to_string(),
            ..self
        })
    }

    /// `Recommendation: Yes` / `Confidence: High` / `Summary: ...`
    fn from_markers(text: &str) -> Option<Self> {
        Some(Self {
            recommendation: marker_value(text, "Recommendation:")?.parse().ok()?,
            confidence: marker_value(text, "Confidence:")?.parse().ok()?,
            summary: marker_value(text, "Summary:")?.to_string(),
        })
    }
}

/// Shape of the evaluation reply. Split into score and detail once validated.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationReply {
    pub technical: f64,
    pub communication: f64,
    pub cultural_fit: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl EvaluationReply {
    pub fn score(&self) -> EvaluationScore {
        EvaluationScore::new(self.technical, self.communication, self.cultural_fit)
    }

    pub fn into_detail(self) -> EvaluationDetail {
        EvaluationDetail {
            strengths: self.strengths,
            weaknesses: self.weaknesses,
            recommendation: self.recommendation,
            justification: self.justification,
            next_steps: self.next_steps,
        }
    }
}

impl ReplySchema for EvaluationReply {
    fn validated(self) -> Result<Self, ParseError> {
        self.score().validated()?;
        Ok(self)
    }

    /// `Technical: 7/10`, `Communication: 8/10`, `Cultural Fit: 6/10`, `Recommendation: Yes`.
    fn from_markers(text: &str) -> Option<Self> {
        Some(Self {
            technical: marker_number(text, "Technical:")?,
            communication: marker_number(text, "Communication:")?,
            cultural_fit: marker_number(text, "Cultural Fit:")?,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            recommendation: marker_value(text, "Recommendation:")?.parse().ok()?,
            justification: marker_value(text, "Justification:")
                .unwrap_or_default()
                .to_string(),
            next_steps: Vec::new(),
        })
    }
}

/// Everything the evaluation stage produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub score: EvaluationScore,
    pub detail: EvaluationDetail,
    pub decision: ScreeningDecision,
}

impl EvaluationOutcome {
    /// The message shown to the candidate when evaluation completes.
    pub fn summary_message(&self) -> String {
        let mut message = format!(
            "## Evaluation Complete\n\n\
             Technical: {:.1}/10 · Communication: {:.1}/10 · Cultural fit: {:.1}/10\n\
             **Final score: {:.2}/10**\n\n\
             **Recommendation**: {}",
            self.score.technical,
            self.score.communication,
            self.score.cultural_fit,
            self.score.final_score(),
            self.detail.recommendation,
        );
        if !self.detail.justification.is_empty() {
            message.push_str(&format!("\n\n{}", self.detail.justification));
        }
        message.push_str(&format!(
            "\n\n**Decision**: {} (confidence: {})\n{}",
            self.decision.recommendation,
            self.decision.confidence.label(),
            self.decision.summary
        ));
        message
    }
}

/// Runs the evaluation call, then the screening-decision call on its result.
pub async fn evaluate_candidate(
    llm: &dyn CompletionClient,
    candidate: &Candidate,
    answered: &[AnsweredQuestion],
) -> Result<EvaluationOutcome, AppError> {
    let system = evaluation_system();

    let prompt = build_evaluation_prompt(candidate, answered);
    let reply: EvaluationReply = complete_structured(llm, &prompt, &system).await?;
    let score = reply.score();
    let detail = reply.into_detail();

    let evaluation_json = serde_json::to_string_pretty(&serde_json::json!({
        "scores": score,
        "final_score": score.final_score(),
        "evaluation": detail,
    }))
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize evaluation: {e}")))?;

    let decision: ScreeningDecision =
        complete_structured(llm, &build_decision_prompt(&evaluation_json), &system).await?;

    info!(
        "Evaluated {}: final score {:.2}, decision {}",
        candidate.name(),
        score.final_score(),
        decision.recommendation
    );

    Ok(EvaluationOutcome {
        score,
        detail,
        decision,
    })
}
