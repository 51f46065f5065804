//! Rewards for the community activity

mod stats;
mod uploaded_memes;

pub(crate) use stats::*;
pub(crate) use uploaded_memes::*;

use serde::Deserialize;
use std::time::Duration;
use teloxide::types::ChatId;

#[derive(Deserialize)]
pub(crate) struct Config {
    /// Public channel where the weekly top is announced
    channel_chat_id: i64,

    /// Public link of the channel, e.g. `https://t.me/memes_channel`
    pub(crate) channel_link: String,

    /// Language of the memes that take part in the weekly top and of the
    /// announcements
    #[serde(default = "default_lang")]
    pub(crate) lang: String,

    #[serde(default = "default_dm_delay_secs")]
    dm_delay_secs: u64,
}

fn default_lang() -> String {
    "ru".to_owned()
}

fn default_dm_delay_secs() -> u64 {
    2
}

impl Config {
    pub(crate) fn channel_chat(&self) -> ChatId {
        ChatId(self.channel_chat_id)
    }

    /// Pause between the messages sent in a batch not to hit the Telegram
    /// rate limits
    pub(crate) fn dm_delay(&self) -> Duration {
        Duration::from_secs(self.dm_delay_secs)
    }
}
