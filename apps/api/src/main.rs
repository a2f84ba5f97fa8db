mod config;
mod errors;
mod interview;
mod llm_client;
mod report;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::controller::InterviewEngine;
use crate::interview::question_bank::HrQuestionBank;
use crate::interview::session::SessionStore;
use crate::llm_client::GroqClient;
use crate::report::ReportWriter;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentScout API v{}", env!("CARGO_PKG_VERSION"));

    // HR question dataset, read once
    let question_bank = HrQuestionBank::load(&config.hr_questions_path)?;
    if question_bank.is_empty() {
        warn!(
            "{} has no HR questions; sessions will go straight to technical questions",
            config.hr_questions_path.display()
        );
    } else {
        info!(
            "Loaded {} HR questions from {}",
            question_bank.len(),
            config.hr_questions_path.display()
        );
    }

    // Initialize LLM client
    let llm = GroqClient::new(config.llm_settings())?;
    info!("LLM client initialized (model: {})", llm.model());

    let reports = ReportWriter::new(&config.reports_dir);
    info!("Reports will be written to {}", reports.dir().display());

    let engine = InterviewEngine::new(Arc::new(llm), Arc::new(question_bank), reports)
        .with_hr_question_count(config.hr_question_count);

    // Build app state
    let state = AppState {
        sessions: SessionStore::default(),
        engine,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
