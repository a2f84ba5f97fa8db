// All model prompts for the screening interview.
// Templates use `{placeholder}` substitution; see the build_* helpers below.

use crate::interview::candidate::Candidate;
use crate::interview::transcript::{AnsweredQuestion, QuestionKind};
use crate::llm_client::prompts::json_system;

/// Role for technical question generation.
pub const TECHNICAL_ROLE: &str = "Generate technical interview questions based on these rules:\
    \n- Create 3-5 questions per technology\
    \n- Questions should assess practical knowledge\
    \n- Include 1 scenario-based question per technology\
    \n- Difficulty should match candidate's experience level\
    \n- Cover both theoretical and practical aspects";

/// Role for evaluation and the screening decision.
pub const EVALUATION_ROLE: &str = "Evaluate candidates based on:\
    \n1. Technical competence (70% weight)\
    \n2. Communication skills (20% weight)\
    \n3. Cultural fit (10% weight)\
    \n\nProvide:\
    \n- Strengths and weaknesses\
    \n- Recommendation (Strong Yes/Yes/No/Strong No)\
    \n- Justification for recommendation\
    \n- Suggested next steps";

/// Replace: {technology}, {experience}
pub const TECH_QUESTIONS_PROMPT_TEMPLATE: &str = r#"Candidate Profile:
- Technology: {technology}
- Experience: {experience} years

Generate 3-5 technical questions that:
1. Assess core concepts
2. Include one real-world scenario
3. Cover best practices
4. Match {experience} years experience level

Return a JSON object with this EXACT schema:
{
  "questions": [
    "First question about {technology}?",
    "Second question about {technology}?",
    "Third question about {technology}?"
  ]
}

Every question must be about {technology} only. Do NOT number the questions."#;

/// Replace: {position}, {experience}, {tech_stack}, {responses}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"CANDIDATE EVALUATION
Position: {position}
Experience: {experience} years
Tech Stack: {tech_stack}

INTERVIEW RESPONSES:
{responses}

EVALUATION CRITERIA:
- Technical Competence (70%)
- Communication Skills (20%)
- Cultural Fit (10%)

Score each criterion from 0 to 10. Return a JSON object with this EXACT schema:
{
  "technical": 7,
  "communication": 8,
  "cultural_fit": 6,
  "strengths": ["Clear explanation of indexing trade-offs"],
  "weaknesses": ["Limited exposure to distributed systems"],
  "recommendation": "Yes",
  "justification": "Two or three sentences grounded in the responses above.",
  "next_steps": ["Schedule a system design interview"]
}

`recommendation` must be one of: "Strong Yes", "Yes", "No", "Strong No".
Base every statement on the responses above. Do NOT invent answers the candidate did not give."#;

/// Replace: {evaluation}
pub const DECISION_PROMPT_TEMPLATE: &str = r#"Based on this evaluation:
{evaluation}

Provide a final screening decision as a JSON object with this EXACT schema:
{
  "recommendation": "Strong Yes | Yes | No | Strong No",
  "confidence": "High | Medium | Low",
  "summary": "One-sentence summary"
}"#;

pub fn technical_system() -> String {
    json_system(TECHNICAL_ROLE)
}

pub fn evaluation_system() -> String {
    json_system(EVALUATION_ROLE)
}

pub fn build_tech_questions_prompt(technology: &str, years: u32) -> String {
    TECH_QUESTIONS_PROMPT_TEMPLATE
        .replace("{technology}", technology)
        .replace("{experience}", &years.to_string())
}

/// Formats answered questions as `Q:`/`A:` pairs. The whole history is included.
pub fn format_responses(answered: &[AnsweredQuestion]) -> String {
    if answered.is_empty() {
        return "(no questions were answered)".to_string();
    }
    answered
        .iter()
        .map(|a| match &a.kind {
            QuestionKind::Hr => format!("Q: {}\nA: {}", a.question, a.answer),
            QuestionKind::Technical { technology } => {
                format!("Q ({technology}): {}\nA: {}", a.question, a.answer)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_evaluation_prompt(candidate: &Candidate, answered: &[AnsweredQuestion]) -> String {
    EVALUATION_PROMPT_TEMPLATE
        .replace("{position}", candidate.position())
        .replace("{experience}", &candidate.years_experience().to_string())
        .replace("{tech_stack}", &candidate.tech_stack().join(", "))
        .replace("{responses}", &format_responses(answered))
}

/// `evaluation` is the validated evaluation, re-serialized for the model.
pub fn build_decision_prompt(evaluation: &str) -> String {
    DECISION_PROMPT_TEMPLATE.replace("{evaluation}", evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::candidate::sample_candidate;
    use crate::interview::transcript::PendingQuestion;

    #[test]
    fn test_tech_prompt_substitutes_every_placeholder() {
        let prompt = build_tech_questions_prompt("Python", 5);
        assert!(prompt.contains("Technology: Python"));
        assert!(prompt.contains("Match 5 years experience level"));
        assert!(!prompt.contains("{technology}"));
        assert!(!prompt.contains("{experience}"));
    }

    #[test]
    fn test_evaluation_prompt_includes_profile_and_answers() {
        let candidate = sample_candidate("Python, SQL");
        let answered = vec![
            PendingQuestion::hr("Why this role?").answered("I like data."),
            PendingQuestion::technical("SQL", "What is a JOIN?").answered("It combines rows."),
        ];
        let prompt = build_evaluation_prompt(&candidate, &answered);
        assert!(prompt.contains("Position: Backend Engineer"));
        assert!(prompt.contains("Tech Stack: Python, SQL"));
        assert!(prompt.contains("Q: Why this role?\nA: I like data."));
        assert!(prompt.contains("Q (SQL): What is a JOIN?\nA: It combines rows."));
        assert!(!prompt.contains("{responses}"));
    }

    #[test]
    fn test_format_responses_handles_empty_history() {
        assert_eq!(format_responses(&[]), "(no questions were answered)");
    }

    #[test]
    fn test_systems_demand_json() {
        assert!(technical_system().contains("valid JSON only"));
        assert!(evaluation_system().starts_with("Evaluate candidates"));
    }
}
