//! Stage Controller: drives one session through the screening conversation.
//!
//! Every submission is handled in two phases. Model calls needed for the transition run
//! first, reading the session only; the session is mutated once they have succeeded, so a
//! failed submission leaves it untouched and the candidate can simply resend.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::candidate::{Candidate, InfoField};
use crate::interview::evaluation::evaluate_candidate;
use crate::interview::question_bank::HrQuestionBank;
use crate::interview::session::Session;
use crate::interview::stage::Stage;
use crate::interview::technical::{generate_tech_questions, shuffled_queue};
use crate::interview::transcript::PendingQuestion;
use crate::llm_client::CompletionClient;
use crate::report::{Report, ReportWriter};

pub const WELCOME_MESSAGE: &str = "Welcome to TalentScout! I'm your hiring assistant. \
    I'll conduct an initial screening to assess your fit for technical roles. \
    Say hello when you're ready to begin. You can type 'exit' anytime to end the session.";
pub const HR_INTRO: &str = "Great! Let's start with some general questions.";
pub const NO_HR_QUESTIONS: &str = "I don't have general questions for your profile, so let's skip ahead.";
pub const TECH_INTRO: &str = "Now let's move to technical questions.";
pub const EVALUATING: &str = "Thank you for your responses! I'm now evaluating your answers...";
pub const COMPLETED: &str = "Thank you for completing the screening! Your information has been securely stored. \
    Our recruitment team will contact you about next steps within 3 business days.";
pub const FAREWELL_SAVED: &str =
    "Thank you for your time. Your information has been saved. We'll contact you about next steps.";
pub const FAREWELL_UNSAVED: &str =
    "Thank you for your time. The session has ended before your profile was complete.";

/// Inputs that end the session from any non-terminal stage.
pub const EXIT_COMMANDS: [&str; 6] = ["exit", "quit", "bye", "goodbye", "stop", "end"];

/// HR questions drawn per session.
pub const DEFAULT_HR_QUESTION_COUNT: usize = 3;

pub fn is_exit_command(text: &str) -> bool {
    let text = text.trim();
    EXIT_COMMANDS.iter().any(|c| text.eq_ignore_ascii_case(c))
}

#[derive(Clone)]
pub struct InterviewEngine {
    llm: Arc<dyn CompletionClient>,
    question_bank: Arc<HrQuestionBank>,
    reports: ReportWriter,
    hr_question_count: usize,
}

impl InterviewEngine {
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        question_bank: Arc<HrQuestionBank>,
        reports: ReportWriter,
    ) -> Self {
        Self {
            llm,
            question_bank,
            reports,
            hr_question_count: DEFAULT_HR_QUESTION_COUNT,
        }
    }

    pub fn with_hr_question_count(mut self, count: usize) -> Self {
        self.hr_question_count = count;
        self
    }

    /// A fresh session in GREETING with the welcome message already said.
    pub fn start_session(&self) -> Session {
        let mut session = Session::new();
        session.say(WELCOME_MESSAGE);
        info!("Started session {}", session.id);
        session
    }

    /// Appends the candidate turn, dispatches on the current stage and returns the
    /// assistant replies produced by this submission.
    pub async fn handle_input(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<Vec<String>, AppError> {
        if session.stage().is_terminal() {
            return Err(AppError::Conflict(format!(
                "session {} has already finished",
                session.id
            )));
        }

        let text = text.trim();
        let mark = session.transcript().len();

        if is_exit_command(text) {
            self.end_early(session, text).await?;
        } else {
            match session.stage() {
                Stage::Greeting => {
                    session.hear(text);
                    session.advance(Stage::CollectInfo)?;
                    session.say(InfoField::Name.prompt());
                }
                Stage::CollectInfo => self.collect_info(session, text).await?,
                Stage::HrQuestions => self.answer_hr(session, text).await?,
                Stage::TechAssessment => self.answer_tech(session, text).await?,
                // A previous submission evaluated the candidate but the report was not written.
                Stage::Evaluation | Stage::Report => {
                    session.hear(text);
                    self.finish(session).await?;
                }
                Stage::Done => unreachable!("terminal stage handled above"),
            }
        }

        Ok(session.transcript().assistant_texts_since(mark))
    }

    async fn collect_info(&self, session: &mut Session, text: &str) -> Result<(), AppError> {
        let Some(field) = session.draft.next_missing() else {
            return Err(AppError::Internal(anyhow!(
                "session {} is collecting info with a complete profile",
                session.id
            )));
        };

        let mut draft = session.draft.clone();
        if let Err(err) = draft.accept(field, text) {
            info!("Session {}: rejected {:?}: {}", session.id, field, err);
            session.hear(text);
            session.say(err.hint());
            return Ok(());
        }

        if let Some(next) = draft.next_missing() {
            session.hear(text);
            session.draft = draft;
            session.say(next.prompt());
            return Ok(());
        }

        let candidate = draft
            .finish()
            .ok_or_else(|| anyhow!("profile incomplete after the last field"))?;
        let hr_questions = self.sample_hr_questions(&candidate);
        // Skipping HR means entering the technical stage right away, which needs the model.
        let tech_questions = if hr_questions.is_empty() {
            Some(generate_tech_questions(self.llm.as_ref(), &candidate).await?)
        } else {
            None
        };

        session.hear(text);
        session.draft = draft;
        session.set_candidate(candidate);
        session.advance(Stage::HrQuestions)?;

        match tech_questions {
            None => {
                session.say(HR_INTRO);
                session.queue_questions(hr_questions);
                session.ask_next();
            }
            Some(questions) => {
                warn!("Session {}: no HR questions matched the profile", session.id);
                session.say(NO_HR_QUESTIONS);
                self.enter_tech(session, questions)?;
            }
        }
        Ok(())
    }

    async fn answer_hr(&self, session: &mut Session, text: &str) -> Result<(), AppError> {
        if !session.is_last_question() {
            session.hear(text);
            session.record_answer(text);
            session.ask_next();
            return Ok(());
        }

        let candidate = self.candidate_of(session)?;
        let questions = generate_tech_questions(self.llm.as_ref(), &candidate).await?;

        session.hear(text);
        session.record_answer(text);
        self.enter_tech(session, questions)
    }

    async fn answer_tech(&self, session: &mut Session, text: &str) -> Result<(), AppError> {
        if !session.is_last_question() {
            session.hear(text);
            session.record_answer(text);
            session.ask_next();
            return Ok(());
        }

        let candidate = self.candidate_of(session)?;
        let answered = session.answers_including(text);
        let outcome = evaluate_candidate(self.llm.as_ref(), &candidate, &answered).await?;
        info!(
            "Session {}: evaluated {} with final score {:.2}",
            session.id,
            candidate.name(),
            outcome.score.final_score()
        );

        session.hear(text);
        session.record_answer(text);
        session.advance(Stage::Evaluation)?;
        session.say(EVALUATING);
        session.say(outcome.summary_message());
        session.evaluation = Some(outcome);

        self.finish(session).await
    }

    /// REPORT then DONE. Stays in REPORT if the files cannot be written.
    async fn finish(&self, session: &mut Session) -> Result<(), AppError> {
        let candidate = self.candidate_of(session)?;
        let outcome = session
            .evaluation
            .clone()
            .ok_or_else(|| anyhow!("session {} has no evaluation to report", session.id))?;

        if session.stage() < Stage::Report {
            session.advance(Stage::Report)?;
        }
        let report = Report::completed(
            candidate,
            &outcome,
            session.answered().to_vec(),
            session.transcript().turns().to_vec(),
        );
        let artifacts = self.reports.write(report).await?;
        session.set_report(artifacts);

        session.advance(Stage::Done)?;
        session.say(COMPLETED);
        Ok(())
    }

    async fn end_early(&self, session: &mut Session, text: &str) -> Result<(), AppError> {
        session.hear(text);
        let candidate = session.candidate().cloned();
        match candidate {
            Some(candidate) => {
                session.say(FAREWELL_SAVED);
                let answered = session.answered().to_vec();
                let transcript = session.transcript().turns().to_vec();
                let report = match &session.evaluation {
                    Some(outcome) => Report::completed(candidate, outcome, answered, transcript),
                    None => Report::ended_early(candidate, answered, transcript),
                };
                let artifacts = self.reports.write(report).await?;
                session.set_report(artifacts);
            }
            None => session.say(FAREWELL_UNSAVED),
        }
        info!("Session {} ended by the candidate in {:?}", session.id, session.stage());
        session.advance(Stage::Done)?;
        Ok(())
    }

    fn sample_hr_questions(&self, candidate: &Candidate) -> Vec<PendingQuestion> {
        let mut rng = rand::thread_rng();
        self.question_bank
            .sample(
                candidate.position(),
                candidate.years_experience(),
                self.hr_question_count,
                &mut rng,
            )
            .into_iter()
            .map(|q| PendingQuestion::hr(q.question))
            .collect()
    }

    fn enter_tech(
        &self,
        session: &mut Session,
        questions: Vec<PendingQuestion>,
    ) -> Result<(), AppError> {
        session.advance(Stage::TechAssessment)?;
        session.say(TECH_INTRO);
        let queue = shuffled_queue(questions, &mut rand::thread_rng());
        session.queue_questions(queue);
        if !session.ask_next() {
            return Err(AppError::Internal(anyhow!(
                "no technical questions were generated for session {}",
                session.id
            )));
        }
        Ok(())
    }

    fn candidate_of(&self, session: &Session) -> Result<Candidate, AppError> {
        session
            .candidate()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow!("session {} has no candidate", session.id)))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::llm_client::testing::ScriptedClient;
    use crate::llm_client::LlmError;
    use crate::report::ReportStatus;

    async fn submit(engine: &InterviewEngine, session: &mut Session, text: &str) -> Vec<String> {
        engine.handle_input(session, text).await.unwrap()
    }

    async fn fill_profile(engine: &InterviewEngine, session: &mut Session) {
        submit(engine, session, "hello").await;
        for value in PROFILE {
            submit(engine, session, value).await;
        }
    }

    #[test]
    fn test_exit_commands() {
        for command in ["exit", "  QUIT ", "Bye", "goodbye", "stop", "End"] {
            assert!(is_exit_command(command), "{command}");
        }
        assert!(!is_exit_command("I will not stop learning"));
        assert!(!is_exit_command("extend"));
    }

    #[tokio::test]
    async fn test_greeting_moves_to_name_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(Arc::new(ScriptedClient::new(Vec::<String>::new())), dir.path());
        let mut session = engine.start_session();
        assert_eq!(session.stage(), Stage::Greeting);
        assert_eq!(session.transcript().turns()[0].text, WELCOME_MESSAGE);

        let replies = submit(&engine, &mut session, "hi").await;
        assert_eq!(replies, vec![InfoField::Name.prompt().to_string()]);
        assert_eq!(session.stage(), Stage::CollectInfo);
    }

    #[tokio::test]
    async fn test_invalid_field_stays_in_collect_info() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(Arc::new(ScriptedClient::new(Vec::<String>::new())), dir.path());
        let mut session = engine.start_session();
        submit(&engine, &mut session, "hi").await;
        submit(&engine, &mut session, "Ada Lovelace").await;

        let replies = submit(&engine, &mut session, "not-an-email").await;
        assert_eq!(session.stage(), Stage::CollectInfo);
        assert!(replies[0].contains("valid email"));
        assert_eq!(session.draft.next_missing(), Some(InfoField::Email));

        let replies = submit(&engine, &mut session, "   ").await;
        assert_eq!(session.stage(), Stage::CollectInfo);
        assert!(replies[0].contains("required"));

        let replies = submit(&engine, &mut session, "ada@example.com").await;
        assert_eq!(replies, vec![InfoField::Phone.prompt().to_string()]);
    }

    #[tokio::test]
    async fn test_full_interview_reaches_done_with_report() {
        let dir = tempfile::tempdir().unwrap();
        let client = full_run_client();
        let engine = engine(client.clone(), dir.path());
        let mut session = engine.start_session();
        fill_profile(&engine, &mut session).await;

        // 5 years → Mid: two General + one Backend question match.
        assert_eq!(session.stage(), Stage::HrQuestions);
        for _ in 0..2 {
            submit(&engine, &mut session, "An HR answer.").await;
            assert_eq!(session.stage(), Stage::HrQuestions);
        }
        let replies = submit(&engine, &mut session, "The last HR answer.").await;
        assert_eq!(session.stage(), Stage::TechAssessment);
        assert_eq!(replies[0], TECH_INTRO);

        for _ in 0..5 {
            submit(&engine, &mut session, "A technical answer.").await;
            assert_eq!(session.stage(), Stage::TechAssessment);
        }
        let replies = submit(&engine, &mut session, "The last technical answer.").await;

        assert_eq!(session.stage(), Stage::Done);
        assert_eq!(replies.first().map(String::as_str), Some(EVALUATING));
        assert!(replies.iter().any(|r| r.contains("Final score: 7.60/10")));
        assert_eq!(replies.last().map(String::as_str), Some(COMPLETED));
        assert_eq!(client.remaining(), 0);

        assert_eq!(session.answered().len(), 9);
        let artifacts = session.report().unwrap();
        assert_eq!(artifacts.report.status, ReportStatus::Completed);
        assert_eq!(artifacts.report.question_count, 9);
        assert!(artifacts.json_path.exists());
        assert!(artifacts.pdf_path.exists());
    }

    #[tokio::test]
    async fn test_stage_history_strictly_increases() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(full_run_client(), dir.path());
        let mut session = engine.start_session();
        fill_profile(&engine, &mut session).await;
        while !session.stage().is_terminal() {
            submit(&engine, &mut session, "An answer.").await;
        }

        let history = session.stage_history();
        assert!(history.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(history, Stage::ALL);
    }

    #[tokio::test]
    async fn test_done_session_rejects_input() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(Arc::new(ScriptedClient::new(Vec::<String>::new())), dir.path());
        let mut session = engine.start_session();
        submit(&engine, &mut session, "exit").await;
        assert_eq!(session.stage(), Stage::Done);

        let err = engine.handle_input(&mut session, "hello?").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_exit_before_profile_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(Arc::new(ScriptedClient::new(Vec::<String>::new())), dir.path());
        let mut session = engine.start_session();
        submit(&engine, &mut session, "hi").await;
        submit(&engine, &mut session, "Ada Lovelace").await;

        let replies = submit(&engine, &mut session, "quit").await;
        assert_eq!(replies, vec![FAREWELL_UNSAVED.to_string()]);
        assert_eq!(session.stage(), Stage::Done);
        assert!(session.report().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_exit_with_complete_profile_writes_ended_early_report() {
        let dir = tempfile::tempdir().unwrap();
        let client = full_run_client();
        let engine = engine(client.clone(), dir.path());
        let mut session = engine.start_session();
        fill_profile(&engine, &mut session).await;
        submit(&engine, &mut session, "An HR answer.").await;

        let replies = submit(&engine, &mut session, "Goodbye").await;
        assert_eq!(replies, vec![FAREWELL_SAVED.to_string()]);
        assert_eq!(session.stage(), Stage::Done);
        // no evaluation calls were made
        assert_eq!(client.prompts().len(), 0);

        let artifacts = session.report().unwrap();
        assert_eq!(artifacts.report.status, ReportStatus::EndedEarly);
        assert_eq!(artifacts.report.question_count, 1);
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&artifacts.json_path).unwrap()).unwrap();
        assert_eq!(json["status"], "ended_early");
    }

    #[tokio::test]
    async fn test_model_failure_leaves_session_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::with_results([Err(LlmError::Timeout(
            std::time::Duration::from_secs(60),
        ))]));
        let engine = engine(client, dir.path()).with_hr_question_count(1);
        let mut session = engine.start_session();
        fill_profile(&engine, &mut session).await;
        assert_eq!(session.stage(), Stage::HrQuestions);

        let turns_before = session.transcript().len();
        let err = engine
            .handle_input(&mut session, "My only HR answer.")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LlmUnavailable(_)));
        assert_eq!(session.stage(), Stage::HrQuestions);
        assert_eq!(session.transcript().len(), turns_before);
        assert!(session.answered().is_empty());
        assert!(session.current_question().is_some());
    }

    #[tokio::test]
    async fn test_no_matching_hr_questions_skips_to_tech() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new([PYTHON_QUESTIONS, SQL_QUESTIONS]));
        let engine = InterviewEngine::new(
            client,
            Arc::new(HrQuestionBank::default()),
            ReportWriter::new(dir.path()),
        );
        let mut session = engine.start_session();
        fill_profile(&engine, &mut session).await;

        assert_eq!(session.stage(), Stage::TechAssessment);
        assert!(session.stage_history().contains(&Stage::HrQuestions));
        assert!(matches!(
            session.current_question().map(|q| &q.kind),
            Some(crate::interview::transcript::QuestionKind::Technical { .. })
        ));
    }

    #[tokio::test]
    async fn test_report_failure_is_retried_on_next_input() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"file, not a directory").unwrap();

        let client = full_run_client();
        let engine = InterviewEngine::new(
            client,
            Arc::new(hr_bank()),
            ReportWriter::new(blocker.join("reports")),
        )
        .with_hr_question_count(0);
        let mut session = engine.start_session();
        fill_profile(&engine, &mut session).await;

        for _ in 0..5 {
            submit(&engine, &mut session, "A technical answer.").await;
        }
        let err = engine
            .handle_input(&mut session, "Last answer.")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Report(_)));
        assert_eq!(session.stage(), Stage::Report);
        assert!(session.evaluation.is_some());

        std::fs::remove_file(&blocker).unwrap();
        let replies = submit(&engine, &mut session, "Is it done?").await;
        assert_eq!(session.stage(), Stage::Done);
        assert_eq!(replies, vec![COMPLETED.to_string()]);
        assert!(session.report().unwrap().json_path.exists());
    }
}
