use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use teloxide::{
    dispatching::dialogue::{GetChatId, InMemStorage},
    types::{CallbackQuery, ChatId, MessageId},
    Bot,
};
use tracing::instrument;

use crate::{
    engine::QuizEngine,
    error::{SessionError, StoreError},
    presenter::{decode_answer_event, render_question, render_result, OutboundMessage},
    state::Session,
    store::SessionStore,
    transport::Transport,
    HandlerResult,
};

pub const QUIZ_NOT_ACTIVE: &str = "The quiz is not active. Use /start to begin.";
pub const MALFORMED_ANSWER: &str = "Sorry, that answer could not be read. Please try again.";
pub const ALREADY_ANSWERED: &str = "You have already answered this question.";

/// A button press as delivered by the platform.
#[derive(Debug, Clone)]
pub struct AnswerEvent {
    pub chat: ChatId,
    pub callback_id: String,
    pub message_id: Option<MessageId>,
    pub data: Option<String>,
}

/// What happened to an answer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    NotActive,
    Malformed,
    Stale,
    NextQuestion,
    Finished,
}

/// Starts a fresh session for `chat`, replacing any previous one, and sends
/// the first question.
#[instrument(level = "info", skip(engine, transport, store, rng))]
pub async fn begin<T, S, R>(
    engine: &QuizEngine,
    transport: &T,
    store: &S,
    chat: ChatId,
    rng: &mut R,
) -> Result<(), StoreError>
where
    T: Transport + Sync,
    S: SessionStore + Sync,
    R: Rng + Send,
{
    let mut session = engine.begin_session(rng);
    log::info!(
        "{}: starting session {} with {} questions",
        chat,
        session.id(),
        session.total()
    );

    let question = engine.present_question(&session, rng);
    store.put(chat, session.clone()).await?;

    let question = match question {
        Ok(question) => question,
        Err(e) => {
            log::error!("{}: fresh session has no question to present: {}", chat, e);
            return Ok(());
        }
    };
    if let Some(message_id) = deliver(transport, chat, None, render_question(&question)).await {
        session.set_message_id(message_id);
        store.put(chat, session).await?;
    }

    Ok(())
}

/// Scores a button press and moves the session on: next question or result.
///
/// Only storage failures are returned. Delivery failures are logged, the
/// session has already been stored by then.
#[instrument(level = "info", skip(engine, transport, store, rng), fields(chat = %event.chat))]
pub async fn answer<T, S, R>(
    engine: &QuizEngine,
    transport: &T,
    store: &S,
    event: AnswerEvent,
    rng: &mut R,
) -> Result<AnswerOutcome, StoreError>
where
    T: Transport + Sync,
    S: SessionStore + Sync,
    R: Rng + Send,
{
    let chat = event.chat;
    let mut session = match store.get(chat).await? {
        Some(session) if session.is_active() => session,
        _ => {
            log::info!("{}: answer received without an active quiz", chat);
            notify(transport, &event, QUIZ_NOT_ACTIVE, false).await;
            return Ok(AnswerOutcome::NotActive);
        }
    };

    // Buttons on any other message belong to a question that was replaced.
    if let (Some(expected), Some(pressed)) = (session.message_id(), event.message_id) {
        if expected != pressed {
            log::info!(
                "{}: ignoring press on message {} while {} is open",
                chat,
                pressed.0,
                expected.0
            );
            notify(transport, &event, ALREADY_ANSWERED, false).await;
            return Ok(AnswerOutcome::Stale);
        }
    }

    let payload = match decode_answer_event(event.data.as_deref().unwrap_or_default()) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("{}: malformed answer payload {:?}: {}", chat, event.data, e);
            notify(transport, &event, MALFORMED_ANSWER, false).await;
            return Ok(AnswerOutcome::Malformed);
        }
    };

    let feedback = match engine.score_answer(&mut session, &payload) {
        Ok(feedback) => feedback,
        Err(SessionError::Stale { expected, received }) => {
            log::info!(
                "{}: ignoring answer for question {} while {} is open",
                chat,
                received,
                expected
            );
            notify(transport, &event, ALREADY_ANSWERED, false).await;
            return Ok(AnswerOutcome::Stale);
        }
        Err(SessionError::Inactive) => {
            notify(transport, &event, QUIZ_NOT_ACTIVE, false).await;
            return Ok(AnswerOutcome::NotActive);
        }
        Err(e) => {
            log::warn!("{}: rejected answer {:?}: {}", chat, event.data, e);
            notify(transport, &event, MALFORMED_ANSWER, false).await;
            return Ok(AnswerOutcome::Malformed);
        }
    };
    log::info!(
        "{}: session {} answered question {} with option {}, score now {}",
        chat,
        session.id(),
        payload.question_index + 1,
        payload.identity,
        session.score()
    );

    let (outcome, next) = if engine.is_complete(&session) {
        match engine.finalize(&mut session) {
            Ok(summary) => {
                log::info!(
                    "{}: session {} completed with {}",
                    chat,
                    session.id(),
                    summary.score
                );
                (AnswerOutcome::Finished, Some(render_result(&summary)))
            }
            Err(e) => {
                log::error!("{}: failed to finalize session {}: {}", chat, session.id(), e);
                (AnswerOutcome::Finished, None)
            }
        }
    } else {
        match engine.present_question(&session, rng) {
            Ok(question) => (AnswerOutcome::NextQuestion, Some(render_question(&question))),
            Err(e) => {
                log::error!("{}: no next question for session {}: {}", chat, session.id(), e);
                (AnswerOutcome::NextQuestion, None)
            }
        }
    };

    // The score is stored before anything is sent.
    store.put(chat, session.clone()).await?;

    notify(transport, &event, &feedback.to_string(), feedback.is_modal()).await;
    let Some(message) = next else {
        return Ok(outcome);
    };
    match deliver(transport, chat, event.message_id, message).await {
        Some(message_id) if session.message_id() != Some(message_id) => {
            session.set_message_id(message_id);
            store.put(chat, session).await?;
        }
        _ => {}
    }

    Ok(outcome)
}

/// Ends the current session without a result. Returns whether one was active.
#[instrument(level = "info", skip(store))]
pub async fn cancel<S: SessionStore + Sync>(store: &S, chat: ChatId) -> Result<bool, StoreError> {
    match store.get(chat).await? {
        Some(mut session) if session.is_active() => {
            session.cancel();
            log::info!("{}: cancelled session {}", chat, session.id());
            store.put(chat, session).await?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Callback query endpoint: every inline button press lands here.
#[instrument(level = "info", skip(bot, engine, store))]
pub(crate) async fn take_answer(
    bot: Bot,
    q: CallbackQuery,
    engine: Arc<QuizEngine>,
    store: Arc<InMemStorage<Session>>,
) -> HandlerResult {
    let chat = q.chat_id().unwrap_or_else(|| ChatId::from(q.from.id));
    log::info!(
        "{} pressed {:?}",
        q.from.username.as_deref().unwrap_or("anonymous"),
        q.data
    );

    let event = AnswerEvent {
        chat,
        callback_id: q.id.clone(),
        message_id: q.message.as_ref().map(|message| message.id()),
        data: q.data.clone(),
    };
    let mut rng = StdRng::from_entropy();
    answer(&engine, &bot, &store, event, &mut rng).await?;

    Ok(())
}

/// Replaces the answered message when there is one, otherwise sends anew.
/// Returns the message now showing `message`, or `None` if delivery failed.
async fn deliver<T: Transport + Sync>(
    transport: &T,
    chat: ChatId,
    message_id: Option<MessageId>,
    message: OutboundMessage,
) -> Option<MessageId> {
    let result = match message_id {
        Some(message_id) => transport
            .edit(chat, message_id, message)
            .await
            .map(|()| message_id),
        None => transport.send(chat, message).await,
    };
    match result {
        Ok(message_id) => Some(message_id),
        Err(e) => {
            log::warn!("{}: failed to deliver message: {}", chat, e);
            None
        }
    }
}

async fn notify<T: Transport + Sync>(transport: &T, event: &AnswerEvent, text: &str, modal: bool) {
    if let Err(e) = transport
        .acknowledge(event.callback_id.clone(), text.to_owned(), modal)
        .await
    {
        log::warn!("{}: failed to acknowledge answer: {}", event.chat, e);
    }
}
