use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use teloxide::{
    dispatching::dialogue::InMemStorage, prelude::Requester, types::Message,
    utils::command::BotCommands, Bot,
};
use tracing::instrument;

use crate::{engine::QuizEngine, runner, state::Session, HandlerResult};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start a new quiz.")]
    Start,
    #[command(description = "stop the current quiz.")]
    Cancel,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, engine, store, msg), fields(chat = %msg.chat.id))]
pub(crate) async fn start(
    bot: Bot,
    msg: Message,
    engine: Arc<QuizEngine>,
    store: Arc<InMemStorage<Session>>,
) -> HandlerResult {
    log::info!(
        "{} starts a quiz",
        msg.chat.username().unwrap_or("anonymous")
    );
    let mut rng = StdRng::from_entropy();
    runner::begin(&engine, &bot, &store, msg.chat.id, &mut rng).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, store, msg), fields(chat = %msg.chat.id))]
pub(crate) async fn cancel(
    bot: Bot,
    msg: Message,
    store: Arc<InMemStorage<Session>>,
) -> HandlerResult {
    let text = if runner::cancel(&store, msg.chat.id).await? {
        "Quiz cancelled. Use /start to begin a new one."
    } else {
        "There is no quiz to cancel. Use /start to begin."
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}
