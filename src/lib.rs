pub mod bank;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
mod keyboard;
pub mod payload;
pub mod presenter;
pub mod runner;
pub mod schema;
pub mod state;
pub mod store;
pub mod transport;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
