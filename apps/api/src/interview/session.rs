//! Session State Store: one explicit object per screening conversation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::interview::candidate::{Candidate, CandidateDraft};
use crate::interview::evaluation::EvaluationOutcome;
use crate::interview::stage::{Stage, StageController, StageError, StageProgress};
use crate::interview::transcript::{
    AnsweredQuestion, ConversationTurn, PendingQuestion, Speaker, Transcript,
};
use crate::report::ReportArtifacts;

/// Tech stack entries shown in the candidate summary before truncating with "...".
const SUMMARY_STACK_PREVIEW: usize = 3;

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    stage: StageController,
    pub(crate) draft: CandidateDraft,
    candidate: Option<Candidate>,
    transcript: Transcript,
    answered: Vec<AnsweredQuestion>,
    queue: VecDeque<PendingQuestion>,
    current_question: Option<PendingQuestion>,
    pub(crate) evaluation: Option<EvaluationOutcome>,
    report: Option<Arc<ReportArtifacts>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            stage: StageController::default(),
            draft: CandidateDraft::default(),
            candidate: None,
            transcript: Transcript::default(),
            answered: Vec::new(),
            queue: VecDeque::new(),
            current_question: None,
            evaluation: None,
            report: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage.current()
    }

    pub fn stage_history(&self) -> &[Stage] {
        self.stage.history()
    }

    pub fn advance(&mut self, next: Stage) -> Result<(), StageError> {
        self.stage.advance_to(next)
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    /// Freezes the profile. Only the first call has any effect.
    pub fn set_candidate(&mut self, candidate: Candidate) {
        if self.candidate.is_none() {
            self.candidate = Some(candidate);
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn answered(&self) -> &[AnsweredQuestion] {
        &self.answered
    }

    pub fn current_question(&self) -> Option<&PendingQuestion> {
        self.current_question.as_ref()
    }

    pub fn report(&self) -> Option<&Arc<ReportArtifacts>> {
        self.report.as_ref()
    }

    pub fn set_report(&mut self, artifacts: ReportArtifacts) {
        info!(
            "Report for session {} written to {} and {}",
            self.id,
            artifacts.json_path.display(),
            artifacts.pdf_path.display()
        );
        self.report = Some(Arc::new(artifacts));
    }

    pub fn say(&mut self, text: impl Into<String>) {
        let stage = self.stage();
        self.transcript.push(Speaker::Assistant, text, stage);
    }

    pub fn hear(&mut self, text: impl Into<String>) {
        let stage = self.stage();
        self.transcript.push(Speaker::Candidate, text, stage);
    }

    /// Replaces the queue of questions still to be asked.
    pub fn queue_questions(&mut self, questions: impl IntoIterator<Item = PendingQuestion>) {
        self.queue = questions.into_iter().collect();
    }

    /// True when answering the current question leaves nothing else to ask.
    pub fn is_last_question(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pops the next question, makes it current and asks it. Returns false when the queue is empty.
    pub fn ask_next(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(question) => {
                self.say(question.display());
                self.current_question = Some(question);
                true
            }
            None => false,
        }
    }

    /// Records `answer` against the current question, if there is one.
    pub fn record_answer(&mut self, answer: &str) {
        if let Some(question) = self.current_question.take() {
            self.answered.push(question.answered(answer));
        }
    }

    /// The answered list as it would look after `record_answer(answer)`, without mutating.
    pub fn answers_including(&self, answer: &str) -> Vec<AnsweredQuestion> {
        let mut answered = self.answered.clone();
        if let Some(question) = &self.current_question {
            answered.push(question.clone().answered(answer));
        }
        answered
    }

    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        SessionView {
            session_id: self.id,
            stage: self.stage(),
            progress: self.stage.progress(),
            elapsed_secs: (now - self.started_at).num_seconds().max(0),
            candidate: self.summary(),
            current_question: self.current_question().map(PendingQuestion::display),
            questions_answered: self.answered.len(),
            report_ready: self.report.is_some(),
            transcript: self.transcript.turns().to_vec(),
        }
    }

    fn summary(&self) -> Option<CandidateSummary> {
        let name = self.draft.name()?;
        let stack = self.draft.tech_stack();
        let mut preview = stack
            .iter()
            .take(SUMMARY_STACK_PREVIEW)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if stack.len() > SUMMARY_STACK_PREVIEW {
            preview.push_str("...");
        }
        Some(CandidateSummary {
            name: name.to_string(),
            position: self.draft.position().map(str::to_string),
            experience: self.draft.experience().map(str::to_string),
            tech_stack: preview,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub name: String,
    pub position: Option<String>,
    pub experience: Option<String>,
    pub tech_stack: String,
}

/// Read-only snapshot returned by the session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub stage: Stage,
    pub progress: Vec<StageProgress>,
    pub elapsed_secs: i64,
    pub candidate: Option<CandidateSummary>,
    pub current_question: Option<String>,
    pub questions_answered: usize,
    pub report_ready: bool,
    pub transcript: Vec<ConversationTurn>,
}

/// All live sessions. Each session has its own lock, so one slow model call only
/// blocks the session that made it.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub async fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::interview::candidate::InfoField;

    #[test]
    fn test_turns_are_tagged_with_current_stage() {
        let mut session = Session::new();
        session.say("Welcome");
        session.advance(Stage::CollectInfo).unwrap();
        session.hear("Ada");

        let turns = session.transcript().turns();
        assert_eq!(turns[0].stage, Stage::Greeting);
        assert_eq!(turns[1].stage, Stage::CollectInfo);
        assert_eq!(turns[1].speaker, Speaker::Candidate);
    }

    #[test]
    fn test_question_cycle_records_answers() {
        let mut session = Session::new();
        session.queue_questions([PendingQuestion::hr("First?"), PendingQuestion::hr("Second?")]);

        assert!(session.ask_next());
        assert!(!session.is_last_question());
        session.record_answer("one");

        assert!(session.ask_next());
        assert!(session.is_last_question());
        let preview = session.answers_including("two");
        assert_eq!(preview.len(), 2);
        assert_eq!(session.answered().len(), 1);

        session.record_answer("two");
        assert!(!session.ask_next());
        assert_eq!(session.answered()[1].answer, "two");
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_record_answer_without_question_is_ignored() {
        let mut session = Session::new();
        session.record_answer("stray");
        assert!(session.answered().is_empty());
    }

    #[test]
    fn test_view_truncates_stack_preview() {
        let mut session = Session::new();
        for (field, value) in [
            (InfoField::Name, "Ada"),
            (InfoField::Email, "ada@example.com"),
            (InfoField::Phone, "+441234567890"),
            (InfoField::Position, "Engineer"),
            (InfoField::Experience, "4"),
            (InfoField::Location, "London"),
            (InfoField::TechStack, "Rust, Go, SQL, Python"),
        ] {
            session.draft.accept(field, value).unwrap();
        }

        let view = session.view(session.started_at + Duration::seconds(75));
        let summary = view.candidate.unwrap();
        assert_eq!(summary.name, "Ada");
        assert_eq!(summary.tech_stack, "Rust, Go, SQL...");
        assert_eq!(view.elapsed_secs, 75);
        assert!(!view.report_ready);
    }

    #[test]
    fn test_view_has_no_summary_before_name() {
        let session = Session::new();
        assert!(session.view(Utc::now()).candidate.is_none());
    }

    #[tokio::test]
    async fn test_store_isolates_sessions() {
        let store = SessionStore::default();
        let first = Session::new();
        let first_id = first.id;
        store.insert(first).await;
        store.insert(Session::new()).await;

        assert_eq!(store.len().await, 2);
        let handle = store.get(first_id).await.unwrap();
        handle.lock().await.say("only here");

        assert_eq!(handle.lock().await.transcript().len(), 1);
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }
}
