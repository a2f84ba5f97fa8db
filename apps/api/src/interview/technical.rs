//! Technical question generation, one model call per declared technology.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::interview::candidate::Candidate;
use crate::interview::parser::{complete_structured, ParseError, ReplySchema};
use crate::interview::prompts::{build_tech_questions_prompt, technical_system};
use crate::interview::transcript::PendingQuestion;
use crate::llm_client::CompletionClient;

/// Only the first N declared technologies are assessed.
pub const MAX_TECHNOLOGIES: usize = 5;
pub const MIN_QUESTIONS_PER_TECHNOLOGY: usize = 3;
pub const MAX_QUESTIONS_PER_TECHNOLOGY: usize = 5;

static NUMBERING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s*").expect("valid numbering regex"));

#[derive(Debug, Clone, Deserialize)]
pub struct TechQuestionsReply {
    pub questions: Vec<String>,
}

/// Removes list numbering and bullets: "2) What is..." → "What is...".
fn strip_numbering(line: &str) -> String {
    NUMBERING_RE.replace(line, "").trim().to_string()
}

impl ReplySchema for TechQuestionsReply {
    fn validated(self) -> Result<Self, ParseError> {
        let mut questions: Vec<String> = self
            .questions
            .iter()
            .map(|q| strip_numbering(q))
            .filter(|q| !q.is_empty())
            .collect();

        if questions.len() < MIN_QUESTIONS_PER_TECHNOLOGY {
            return Err(ParseError::TooFew {
                field: "questions",
                min: MIN_QUESTIONS_PER_TECHNOLOGY,
                got: questions.len(),
            });
        }
        questions.truncate(MAX_QUESTIONS_PER_TECHNOLOGY);
        Ok(Self { questions })
    }

    /// Numbered or bulleted lines, the plain-text format models fall back to.
    fn from_markers(text: &str) -> Option<Self> {
        let questions: Vec<String> = text
            .lines()
            .filter(|line| NUMBERING_RE.is_match(line))
            .map(|line| line.to_string())
            .collect();
        (!questions.is_empty()).then_some(Self { questions })
    }
}

/// Generates 3–5 questions for each of the first [`MAX_TECHNOLOGIES`] declared technologies.
/// Every question is tagged with the technology it was generated for.
pub async fn generate_tech_questions(
    llm: &dyn CompletionClient,
    candidate: &Candidate,
) -> Result<Vec<PendingQuestion>, AppError> {
    let system = technical_system();
    let mut questions = Vec::new();

    for technology in candidate.tech_stack().iter().take(MAX_TECHNOLOGIES) {
        let prompt = build_tech_questions_prompt(technology, candidate.years_experience());
        let reply: TechQuestionsReply = complete_structured(llm, &prompt, &system).await?;
        info!(
            "Generated {} questions for {}",
            reply.questions.len(),
            technology
        );
        questions.extend(
            reply
                .questions
                .into_iter()
                .map(|q| PendingQuestion::technical(technology.as_str(), q)),
        );
    }

    Ok(questions)
}

/// Shuffles the questions into the order they will be asked.
pub fn shuffled_queue<R: Rng + ?Sized>(
    mut questions: Vec<PendingQuestion>,
    rng: &mut R,
) -> VecDeque<PendingQuestion> {
    questions.shuffle(rng);
    questions.into()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::interview::candidate::sample_candidate;
    use crate::interview::parser::parse_reply;
    use crate::interview::transcript::QuestionKind;
    use crate::llm_client::testing::ScriptedClient;

    fn technology_of(question: &PendingQuestion) -> &str {
        match &question.kind {
            QuestionKind::Technical { technology } => technology.as_str(),
            QuestionKind::Hr => panic!("expected a technical question"),
        }
    }

    #[test]
    fn test_validated_strips_numbering_and_truncates() {
        let reply = TechQuestionsReply {
            questions: (1..=7).map(|i| format!("{i}. Question {i}?")).collect(),
        };
        let reply = reply.validated().unwrap();
        assert_eq!(reply.questions.len(), MAX_QUESTIONS_PER_TECHNOLOGY);
        assert_eq!(reply.questions[0], "Question 1?");
    }

    #[test]
    fn test_validated_rejects_too_few() {
        let reply = TechQuestionsReply {
            questions: vec!["Only one?".to_string(), "  ".to_string()],
        };
        assert_eq!(
            reply.validated().unwrap_err(),
            ParseError::TooFew {
                field: "questions",
                min: 3,
                got: 1
            }
        );
    }

    #[test]
    fn test_numbered_plain_text_is_accepted() {
        let text = "Here are your questions:\n1. What is a GIL?\n2) How do decorators work?\n- Describe a memory leak you fixed.";
        let reply: TechQuestionsReply = parse_reply(text).unwrap();
        assert_eq!(
            reply.questions,
            vec![
                "What is a GIL?",
                "How do decorators work?",
                "Describe a memory leak you fixed."
            ]
        );
    }

    #[tokio::test]
    async fn test_questions_are_tagged_with_declared_stack_only() {
        // experience "5 years", stack {Python, SQL}
        let candidate = sample_candidate("Python, SQL");
        let client = ScriptedClient::new([
            r#"{"questions": ["What is a generator?", "Explain the GIL.", "How would you profile a slow script?", "What are dataclasses?"]}"#,
            r#"{"questions": ["What is an index?", "Explain isolation levels.", "How would you fix a slow query in production?"]}"#,
        ]);

        let questions = generate_tech_questions(&client, &candidate).await.unwrap();

        let mut per_technology: HashMap<&str, usize> = HashMap::new();
        for question in &questions {
            *per_technology.entry(technology_of(question)).or_default() += 1;
        }
        assert_eq!(per_technology.len(), 2);
        for (technology, count) in per_technology {
            assert!(technology == "Python" || technology == "SQL");
            assert!((3..=5).contains(&count), "{technology} got {count} questions");
        }

        let prompts = client.prompts();
        assert!(prompts[0].contains("Technology: Python"));
        assert!(prompts[0].contains("5 years"));
        assert!(prompts[1].contains("Technology: SQL"));
    }

    #[tokio::test]
    async fn test_only_first_five_technologies_are_assessed() {
        let candidate = sample_candidate("A, B, C, D, E, F, G");
        let reply = r#"{"questions": ["q1?", "q2?", "q3?"]}"#;
        let client = ScriptedClient::new(std::iter::repeat(reply).take(MAX_TECHNOLOGIES));

        let questions = generate_tech_questions(&client, &candidate).await.unwrap();
        assert_eq!(questions.len(), MAX_TECHNOLOGIES * 3);
        assert!(questions
            .iter()
            .all(|q| !matches!(technology_of(q), "F" | "G")));
        assert_eq!(client.prompts().len(), MAX_TECHNOLOGIES);
    }

    #[tokio::test]
    async fn test_failed_technology_aborts_generation() {
        let candidate = sample_candidate("Rust");
        let client = ScriptedClient::new(["{}", "garbage", "{\"questions\": []}"]);
        let err = generate_tech_questions(&client, &candidate)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedCompletion(_)));
    }

    #[test]
    fn test_shuffled_queue_keeps_every_question() {
        let questions: Vec<PendingQuestion> = (0..10)
            .map(|i| PendingQuestion::technical("Rust", format!("q{i}")))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let queue = shuffled_queue(questions.clone(), &mut rng);
        assert_eq!(queue.len(), questions.len());
        for question in &questions {
            assert!(queue.contains(question));
        }
    }
}
