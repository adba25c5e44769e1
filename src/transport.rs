use std::future::Future;

use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{ChatId, MessageId},
    Bot,
};

use crate::{error::TransportError, keyboard::answers_keyboard, presenter::OutboundMessage};

/// Outbound side of the chat platform.
pub trait Transport {
    fn send(
        &self,
        chat: ChatId,
        message: OutboundMessage,
    ) -> impl Future<Output = Result<MessageId, TransportError>> + Send;

    fn edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: OutboundMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Transient feedback shown only to whoever pressed the button.
    fn acknowledge(
        &self,
        callback_id: String,
        text: String,
        modal: bool,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl Transport for Bot {
    async fn send(
        &self,
        chat: ChatId,
        message: OutboundMessage,
    ) -> Result<MessageId, TransportError> {
        let request = self.send_message(chat, message.text);
        let sent = match answers_keyboard(&message.buttons) {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(sent.id)
    }

    async fn edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: OutboundMessage,
    ) -> Result<(), TransportError> {
        let request = self.edit_message_text(chat, message_id, message.text);
        match answers_keyboard(&message.buttons) {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn acknowledge(
        &self,
        callback_id: String,
        text: String,
        modal: bool,
    ) -> Result<(), TransportError> {
        self.answer_callback_query(callback_id)
            .text(text)
            .show_alert(modal)
            .await?;
        Ok(())
    }
}
