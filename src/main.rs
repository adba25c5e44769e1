use std::error::Error;
use std::sync::Arc;

use inlinequizbot::bank::connection::{Connection, RetrieveQuestions};
use inlinequizbot::bank::QuestionBank;
use inlinequizbot::config::{BankSource, Config};
use inlinequizbot::engine::QuizEngine;
use inlinequizbot::error::BankError;
use inlinequizbot::schema::schema;
use inlinequizbot::state::Session;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level)?;

    let bank = load_bank(&config.bank_source).await?;
    let engine = Arc::new(QuizEngine::new(bank, config.settings.clone())?);
    log::info!("Quiz settings: {:?}", engine.settings());

    let bot = Bot::new(config.token);
    log::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![engine, InMemStorage::<Session>::new()])
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook) = config.webhook {
        log::info!("Listening for webhooks on {} via {}", webhook.addr, webhook.url);
        let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }

    Ok(())
}

fn init_tracing(filter: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_log::LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn load_bank(source: &BankSource) -> Result<QuestionBank, BankError> {
    match source {
        BankSource::File(path) => QuestionBank::from_json_file(path),
        BankSource::Database(url) => {
            let connection = Connection::connect(url).await?;
            connection.prepare_schema().await?;
            connection.retrieve_question_bank().await
        }
    }
}
