use std::{future::Future, sync::Arc};

use teloxide::{
    dispatching::dialogue::{InMemStorage, Storage},
    types::ChatId,
};

use crate::{error::StoreError, state::Session};

/// Sessions keyed by chat. A `put` replaces whatever was stored before.
pub trait SessionStore {
    fn get(&self, chat: ChatId)
        -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    fn put(
        &self,
        chat: ChatId,
        session: Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl SessionStore for Arc<InMemStorage<Session>> {
    async fn get(&self, chat: ChatId) -> Result<Option<Session>, StoreError> {
        Ok(Arc::clone(self).get_dialogue(chat).await?)
    }

    async fn put(&self, chat: ChatId, session: Session) -> Result<(), StoreError> {
        Ok(Arc::clone(self).update_dialogue(chat, session).await?)
    }
}
