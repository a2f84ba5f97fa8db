//! HR Question Bank: static dataset of general interview questions, loaded once at start-up.

use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrQuestion {
    pub question: String,
    /// Target role, e.g. "Backend Engineer". "General" applies to every position.
    pub role: String,
    /// Levels the question suits, e.g. "Entry, Mid".
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

impl ExperienceLevel {
    /// < 3 years → Entry, < 6 → Mid, otherwise Senior.
    pub fn from_years(years: u32) -> Self {
        if years < 3 {
            ExperienceLevel::Entry
        } else if years < 6 {
            ExperienceLevel::Mid
        } else {
            ExperienceLevel::Senior
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HrQuestionBank {
    questions: Vec<HrQuestion>,
}

impl HrQuestionBank {
    pub fn new(questions: Vec<HrQuestion>) -> Self {
        Self { questions }
    }

    /// Reads the JSON dataset. A missing or malformed file is a start-up error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read HR questions from {}", path.display()))?;
        let questions: Vec<HrQuestion> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse HR questions in {}", path.display()))?;
        Ok(Self::new(questions))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions for this position (or "General") that list the given level.
    pub fn matching(&self, position: &str, level: ExperienceLevel) -> Vec<&HrQuestion> {
        let position = position.to_lowercase();
        self.questions
            .iter()
            .filter(|q| q.role.to_lowercase().contains(&position) || q.role.contains("General"))
            .filter(|q| q.experience.contains(level.as_str()))
            .collect()
    }

    /// Draws up to `count` distinct matching questions at random.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        position: &str,
        years: u32,
        count: usize,
        rng: &mut R,
    ) -> Vec<HrQuestion> {
        let level = ExperienceLevel::from_years(years);
        self.matching(position, level)
            .choose_multiple(rng, count)
            .map(|q| (*q).clone())
            .collect()
    }
}
