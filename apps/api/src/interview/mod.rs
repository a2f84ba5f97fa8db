pub mod candidate;
pub mod controller;
pub mod evaluation;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod question_bank;
pub mod session;
pub mod stage;
pub mod technical;
pub mod transcript;
