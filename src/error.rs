use std::path::PathBuf;

use teloxide::{dispatching::dialogue::InMemStorageError, RequestError};
use thiserror::Error;

/// Startup failures. Any of these stops the bot before the dispatcher runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set.")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("question bank is empty")]
    EmptyQuestionBank,
    #[error("questions per session must be at least 1")]
    NoQuestionsRequested,
    #[error("{requested} questions per session requested but the bank only has {available}")]
    NotEnoughQuestions { requested: usize, available: usize },
    #[error("question #{question} is invalid: {reason}")]
    InvalidQuestion { question: usize, reason: String },
    #[error("question #{question} produces a {length}-byte payload, the limit is {limit}")]
    PayloadTooLong {
        question: usize,
        length: usize,
        limit: usize,
    },
    #[error(transparent)]
    Bank(#[from] BankError),
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read question bank {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse question bank: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to migrate question bank schema: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("question '{question}' mixes plain and weighted options")]
    MixedOptions { question: String },
    #[error("question '{question}' has correct option {index} but only {count} options")]
    CorrectIndexOutOfRange {
        question: String,
        index: usize,
        count: usize,
    },
}

/// A callback payload that doesn't follow the `q|pos|contribution|id` layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("expected 4 fields, got {0}")]
    FieldCount(usize),
    #[error("field '{field}' is not a valid integer: '{value}'")]
    NotAnInteger { field: &'static str, value: String },
    #[error("malformed contribution '{0}'")]
    Contribution(String),
    #[error("payload is missing")]
    Empty,
}

/// Reasons the engine refuses to act on a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("quiz is not active")]
    Inactive,
    #[error("answer for question {received} while question {expected} is open")]
    Stale { expected: usize, received: usize },
    #[error("question {question} has no option {identity}")]
    UnknownOption { question: usize, identity: usize },
    #[error("payload contribution does not match option {identity}")]
    ContributionMismatch { identity: usize },
    #[error("contribution {contribution} does not fit score {score}")]
    ScoreMismatch { score: String, contribution: String },
    #[error("quiz is not complete yet")]
    NotComplete,
    #[error("no question left to present")]
    Exhausted,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Request(#[from] RequestError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage failed: {0}")]
    Storage(#[from] InMemStorageError),
}
