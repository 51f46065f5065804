use crate::db::{UserService, UserType, UserUpdate};
use crate::prelude::*;
use crate::util::DynResult;
use crate::{tg, Result};
use futures::prelude::*;
use std::sync::Arc;
use teloxide::types::{ChatMemberKind, ChatMemberUpdated, UserId};

fn is_member(chat_member_kind: &ChatMemberKind) -> bool {
    use ChatMemberKind::*;
    match chat_member_kind {
        Owner(_) | Administrator(_) | Member => true,
        Restricted(restricted) => restricted.is_member,
        Left | Banned(_) => false,
    }
}

/// The user blocked the bot in their private chat with it
pub(crate) fn filter(update: ChatMemberUpdated) -> bool {
    update.chat.is_private() && !is_member(&update.new_chat_member.kind)
}

pub(crate) async fn handle(ctx: Arc<tg::Ctx>, update: ChatMemberUpdated) -> DynResult {
    mark_blocked_bot(&*ctx.users, update.from.id)
        .err_into()
        .await
}

/// Regular and waitlisted users become [`UserType::BlockedBot`].
/// Moderators and admins keep their type.
#[instrument(skip(users))]
async fn mark_blocked_bot(users: &dyn UserService, user_id: UserId) -> Result {
    let Some(user) = users.get_user(user_id).await? else {
        return Ok(());
    };

    if !matches!(user.user_type, UserType::Waitlist | UserType::User) {
        info!(
            user_type = %user.user_type,
            "Privileged user blocked the bot, keeping their type"
        );
        return Ok(());
    }

    let update = UserUpdate {
        user_type: Some(UserType::BlockedBot),
        ..Default::default()
    };

    users.update_user(user.id, update).await?;

    info!("User blocked the bot");

    Ok(())
}
