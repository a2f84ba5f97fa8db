//! Conversation record: the append-only transcript and the answered questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interview::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Assistant,
    Candidate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub stage: Stage,
    pub at: DateTime<Utc>,
}

/// Ordered conversation turns. Turns can be appended but never edited or removed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>, stage: Stage) {
        self.turns.push(ConversationTurn {
            speaker,
            text: text.into(),
            stage,
            at: Utc::now(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Assistant messages appended at or after `from`.
    pub fn assistant_texts_since(&self, from: usize) -> Vec<String> {
        self.turns
            .iter()
            .skip(from)
            .filter(|t| t.speaker == Speaker::Assistant)
            .map(|t| t.text.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    Hr,
    Technical { technology: String },
}

/// A question waiting to be asked, or the one currently awaiting an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuestion {
    pub kind: QuestionKind,
    pub text: String,
}

impl PendingQuestion {
    pub fn hr(text: impl Into<String>) -> Self {
        Self {
            kind: QuestionKind::Hr,
            text: text.into(),
        }
    }

    pub fn technical(technology: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: QuestionKind::Technical {
                technology: technology.into(),
            },
            text: text.into(),
        }
    }

    /// How the question appears in the conversation.
    pub fn display(&self) -> String {
        match &self.kind {
            QuestionKind::Hr => self.text.clone(),
            QuestionKind::Technical { technology } => format!("[{technology}] {}", self.text),
        }
    }

    pub fn answered(self, answer: impl Into<String>) -> AnsweredQuestion {
        AnsweredQuestion {
            kind: self.kind,
            question: self.text,
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub question: String,
    pub answer: String,
}
