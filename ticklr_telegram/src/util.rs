use teloxide::types::{CallbackQuery, MaybeInaccessibleMessage, Message};

use ticklr_models::reminder::OwnerId;

pub fn try_get_message_from_query(query: &CallbackQuery) -> Option<&Message> {
    query.message.as_ref().and_then(|msg| match msg {
        MaybeInaccessibleMessage::Inaccessible(_) => None,
        MaybeInaccessibleMessage::Regular(message) => Some(message.as_ref()),
    })
}

/// Telegram user ids are positive and fit in an `i64`.
pub fn owner_of(message: &Message) -> Option<OwnerId> {
    message
        .from
        .as_ref()
        .and_then(|user| OwnerId::try_from(user.id.0).ok())
}
