//! Report Generator: one in-memory [`Report`], rendered as pretty JSON and as a PDF.

pub mod font_metrics;
pub mod pdf;
pub mod writer;

use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::interview::candidate::Candidate;
use crate::interview::evaluation::{
    EvaluationDetail, EvaluationOutcome, EvaluationScore, ScreeningDecision,
};
use crate::interview::transcript::{AnsweredQuestion, ConversationTurn};

pub use writer::ReportWriter;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render PDF: {0}")]
    Pdf(String),

    #[error("PDF render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Completed,
    EndedEarly,
}

impl ReportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Completed => "Completed",
            ReportStatus::EndedEarly => "Ended early",
        }
    }
}

/// The fields both renderers must agree on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary<'a> {
    pub name: &'a str,
    pub final_score: Option<f64>,
    pub question_count: usize,
}

impl ReportSummary<'_> {
    /// `7.60/10`, or `Not evaluated` for sessions that ended before evaluation.
    pub fn score_text(&self) -> String {
        match self.final_score {
            Some(score) => format!("{score:.2}/10"),
            None => "Not evaluated".to_string(),
        }
    }
}

/// Write-once screening report. Candidate and score fields are flattened to the top level.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub status: ReportStatus,
    #[serde(flatten)]
    pub score: Option<EvaluationScore>,
    pub final_score: Option<f64>,
    pub question_count: usize,
    pub evaluation: Option<EvaluationDetail>,
    pub decision: Option<ScreeningDecision>,
    pub responses: Vec<AnsweredQuestion>,
    pub transcript: Vec<ConversationTurn>,
    pub generated_at: DateTime<Utc>,
}

/// Rounded once here so JSON and PDF print the same number.
fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

impl Report {
    /// A report for a finished interview.
    pub fn completed(
        candidate: Candidate,
        outcome: &EvaluationOutcome,
        responses: Vec<AnsweredQuestion>,
        transcript: Vec<ConversationTurn>,
    ) -> Self {
        Self {
            candidate,
            status: ReportStatus::Completed,
            score: Some(outcome.score),
            final_score: Some(round_score(outcome.score.final_score())),
            question_count: responses.len(),
            evaluation: Some(outcome.detail.clone()),
            decision: Some(outcome.decision.clone()),
            responses,
            transcript,
            generated_at: Utc::now(),
        }
    }

    /// A report for a session the candidate ended before evaluation.
    pub fn ended_early(
        candidate: Candidate,
        responses: Vec<AnsweredQuestion>,
        transcript: Vec<ConversationTurn>,
    ) -> Self {
        Self {
            candidate,
            status: ReportStatus::EndedEarly,
            score: None,
            final_score: None,
            question_count: responses.len(),
            evaluation: None,
            decision: None,
            responses,
            transcript,
            generated_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> ReportSummary<'_> {
        ReportSummary {
            name: self.candidate.name(),
            final_score: self.final_score,
            question_count: self.question_count,
        }
    }

    /// Filesystem-safe stem derived from the candidate name: `Ada Lovelace` → `Ada_Lovelace`.
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .candidate
            .name()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .collect();
        let stem = stem.trim_start_matches('.');
        if stem.is_empty() {
            "candidate".to_string()
        } else {
            stem.to_string()
        }
    }
}

/// A written report: the in-memory value, where it went, and the PDF bytes for download.
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub report: Report,
    pub json_path: PathBuf,
    pub pdf_path: PathBuf,
    pub pdf: Bytes,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::interview::candidate::sample_candidate;
    use crate::interview::evaluation::{Confidence, Recommendation};
    use crate::interview::stage::Stage;
    use crate::interview::transcript::{PendingQuestion, Speaker, Transcript};

    pub fn sample_outcome() -> EvaluationOutcome {
        EvaluationOutcome {
            score: EvaluationScore::new(8.0, 7.0, 6.0),
            detail: EvaluationDetail {
                strengths: vec!["Solid grasp of indexing".to_string()],
                weaknesses: vec!["Little production Python".to_string()],
                recommendation: Recommendation::Yes,
                justification: "Answers were accurate and well structured.".to_string(),
                next_steps: vec!["Schedule a system design round".to_string()],
            },
            decision: ScreeningDecision {
                recommendation: Recommendation::Yes,
                confidence: Confidence::High,
                summary: "Strong backend fundamentals.".to_string(),
            },
        }
    }

    pub fn sample_report() -> Report {
        let responses = vec![
            PendingQuestion::hr("Why this role?").answered("I enjoy building APIs."),
            PendingQuestion::technical("SQL", "What is an index?")
                .answered("A structure that speeds up lookups."),
        ];
        let mut transcript = Transcript::default();
        transcript.push(Speaker::Assistant, "What is an index?", Stage::TechAssessment);
        transcript.push(
            Speaker::Candidate,
            "A structure that speeds up lookups.",
            Stage::TechAssessment,
        );
        Report::completed(
            sample_candidate("Python, SQL"),
            &sample_outcome(),
            responses,
            transcript.turns().to_vec(),
        )
    }
}
