use serde::Deserialize;
use teloxide::types::ChatId;

#[derive(Deserialize)]
pub(crate) struct Config {
    pub(crate) token: String,

    /// Chat for [`crate::tg::AdminLog`]. The admin log goes only to the
    /// application logs when absent.
    #[serde(default)]
    admin_logs_chat_id: Option<i64>,

    /// New users stay on the waitlist until someone invites them
    #[serde(default)]
    pub(crate) waitlist_mode: bool,
}

impl Config {
    pub(crate) fn admin_logs_chat(&self) -> Option<ChatId> {
        self.admin_logs_chat_id.map(ChatId)
    }
}
