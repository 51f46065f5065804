use crate::prelude::*;
use crate::tg::Messenger;
use std::sync::Arc;
use teloxide::types::ChatId;
use teloxide::utils::html;

/// Chat where the bot reports notable events for the admins
#[derive(Clone)]
pub(crate) struct AdminLog {
    messenger: Arc<dyn Messenger>,
    chat: Option<ChatId>,
}

impl AdminLog {
    pub(crate) fn new(messenger: Arc<dyn Messenger>, chat: Option<ChatId>) -> Self {
        Self { messenger, chat }
    }

    /// Best effort. Failures are only logged. The text is sent as plain text.
    pub(crate) async fn log(&self, text: impl Into<String>) {
        let text = text.into();

        info!(target: "admin_log", "{text}");

        let Some(chat) = self.chat else {
            return;
        };

        if let Err(err) = self.messenger.send_text(chat, html::escape(&text)).await {
            warn!(
                err = tracing_err(&err),
                "Failed to send a message to the admin log chat"
            );
        }
    }
}
