//! Stage Controller: the forward-only sequence of interview phases.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named phase of the screening conversation. Declaration order is the only legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greeting,
    CollectInfo,
    HrQuestions,
    TechAssessment,
    Evaluation,
    Report,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Greeting,
        Stage::CollectInfo,
        Stage::HrQuestions,
        Stage::TechAssessment,
        Stage::Evaluation,
        Stage::Report,
        Stage::Done,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Greeting => "Welcome",
            Stage::CollectInfo => "Information Gathering",
            Stage::HrQuestions => "HR Questions",
            Stage::TechAssessment => "Technical Assessment",
            Stage::Evaluation => "Evaluation",
            Stage::Report => "Report",
            Stage::Done => "Complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done)
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("illegal stage transition {from:?} -> {to:?}")]
pub struct StageError {
    pub from: Stage,
    pub to: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Done,
    Current,
    Pending,
}

/// One row of the progress list shown next to the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct StageProgress {
    pub stage: Stage,
    pub label: &'static str,
    pub status: ProgressStatus,
}

/// Tracks the current stage and every stage entered so far.
///
/// Invariant: `history` is strictly increasing and ends with `current`.
#[derive(Debug, Clone)]
pub struct StageController {
    current: Stage,
    history: Vec<Stage>,
}

impl Default for StageController {
    fn default() -> Self {
        Self {
            current: Stage::Greeting,
            history: vec![Stage::Greeting],
        }
    }
}

impl StageController {
    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    /// Moves to a later stage. Skipping ahead is allowed; staying put or going back is not.
    pub fn advance_to(&mut self, next: Stage) -> Result<(), StageError> {
        if next <= self.current {
            return Err(StageError {
                from: self.current,
                to: next,
            });
        }
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    pub fn progress(&self) -> Vec<StageProgress> {
        Stage::ALL
            .iter()
            .map(|&stage| StageProgress {
                stage,
                label: stage.label(),
                status: if stage < self.current {
                    ProgressStatus::Done
                } else if stage == self.current {
                    ProgressStatus::Current
                } else {
                    ProgressStatus::Pending
                },
            })
            .collect()
    }
}
