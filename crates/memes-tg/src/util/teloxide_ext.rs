use easy_ext::ext;
use teloxide::types::{UpdateKind, User};

pub(crate) mod prelude {
    pub(crate) use super::{UpdateKindExt as _, UserExt as _};
}

#[ext(UserExt)]
pub(crate) impl User {
    fn username_or_full_name(&self) -> String {
        self.username.clone().unwrap_or_else(|| self.full_name())
    }

    fn debug_id(&self) -> String {
        format!("{} ({})", self.username_or_full_name(), self.id)
    }
}

#[ext(UpdateKindExt)]
pub(crate) impl UpdateKind {
    /// Short name of the update kind suitable for a metric label
    fn discriminator(&self) -> &'static str {
        match self {
            UpdateKind::Message(_) => "Message",
            UpdateKind::EditedMessage(_) => "EditedMessage",
            UpdateKind::CallbackQuery(_) => "CallbackQuery",
            UpdateKind::InlineQuery(_) => "InlineQuery",
            UpdateKind::MyChatMember(_) => "MyChatMember",
            UpdateKind::ChatMember(_) => "ChatMember",
            UpdateKind::ChannelPost(_) => "ChannelPost",
            _ => "Other",
        }
    }
}
