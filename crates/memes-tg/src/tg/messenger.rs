use crate::tg::Bot;
use crate::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, MessageId, ParseMode};

/// Outgoing messages. The texts are HTML-formatted.
#[async_trait]
pub(crate) trait Messenger: Send + Sync {
    /// Sends the photos as a single album. The caption is shown under the
    /// first photo. Returns the ids of the messages in the album.
    async fn send_photo_group(
        &self,
        chat_id: ChatId,
        file_ids: Vec<String>,
        caption: String,
    ) -> Result<Vec<MessageId>>;

    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<MessageId>;
}

#[async_trait]
impl Messenger for Bot {
    async fn send_photo_group(
        &self,
        chat_id: ChatId,
        file_ids: Vec<String>,
        caption: String,
    ) -> Result<Vec<MessageId>> {
        let mut caption = Some(caption);

        let media = file_ids.into_iter().map(|file_id| {
            let photo = InputMediaPhoto::new(InputFile::file_id(file_id));
            let photo = match caption.take() {
                Some(caption) => photo.caption(caption).parse_mode(ParseMode::Html),
                None => photo,
            };
            InputMedia::Photo(photo)
        });

        let messages = self.send_media_group(chat_id, media).await?;

        Ok(messages.into_iter().map(|msg| msg.id).collect())
    }

    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<MessageId> {
        Ok(self.send_message(chat_id, text).await?.id)
    }
}
