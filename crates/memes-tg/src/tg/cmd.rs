use crate::db::{TgUser, UserType, UserUpdate};
use crate::prelude::*;
use crate::tg::deep_link;
use crate::util::DynResult;
use crate::{tg, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use teloxide::macros::BotCommands;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::User;

#[async_trait]
pub(crate) trait Command: fmt::Debug + Send + Sync + 'static {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result;
}

pub(crate) fn handle<'a, C: Command>(
) -> impl Fn(Arc<tg::Ctx>, Message, C) -> BoxFuture<'a, DynResult> {
    move |ctx, msg, cmd| {
        let cmd_name = format!("{cmd:?}");
        let info = info_span!(
            "handle_message",
            sender = msg.from().map(User::debug_id).as_deref(),
            msg_text = msg.text(),
            chat = %msg.chat.id,
            cmd = format_args!("{cmd:#?}")
        );

        let fut = async move {
            debug!("Processing command");

            let result = cmd.handle(&ctx, &msg).await;
            if let Err(err) = &result {
                let span = warn_span!("err", err = tracing_err(err), id = err.id());
                async {
                    warn!("Command handler returned an error");

                    let lang = msg.from().and_then(|user| user.language_code.as_deref());

                    let reply = ctx
                        .localizer
                        .format("error_generic", lang, &[("error_id", err.id().to_owned())])
                        .unwrap_or_else(|_| format!("Error id: <code>{}</code>", err.id()));

                    let msg_result = ctx
                        .bot
                        .send_message(msg.chat.id, reply)
                        .reply_to_message_id(msg.id)
                        .await;

                    if let Err(err) = msg_result {
                        warn!(
                            err = tracing_err(&err),
                            "Failed to reply with the error message to the user"
                        );
                    }

                    let sender = msg.from().map(User::debug_id).unwrap_or_default();

                    ctx.admin_log
                        .log(format!("❌ {cmd_name} from {sender}: {}", err.display_chain()))
                        .await;
                }
                .instrument(span)
                .await;
            }
            result.map_err(Into::into)
        };

        Box::pin(fut.instrument(info))
    }
}

/// `/start` command in PM with the bot. The optional argument is the deep
/// link payload from `t.me/<bot>?start=<payload>` links.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case")]
pub(crate) enum StartCommand {
    #[command(description = "start using the bot")]
    Start(String),
}

#[async_trait]
impl Command for StartCommand {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        let StartCommand::Start(payload) = self;

        // Messages in private chats always have a sender
        let Some(tg_user) = msg.from() else {
            return Ok(());
        };

        start(
            &ctx.deps(),
            ctx.cfg.waitlist_mode,
            msg.chat.id,
            &TgUser::from(tg_user),
            payload.trim(),
        )
        .await
    }
}

pub(crate) fn filter_pm_with_bot(msg: Message) -> bool {
    msg.chat.is_private()
}

async fn start(
    deps: &tg::Deps<'_>,
    waitlist_mode: bool,
    chat_id: ChatId,
    tg_user: &TgUser,
    payload: &str,
) -> Result {
    let user = deps
        .users
        .get_or_create_user(tg_user.id, tg_user.username.as_deref(), UserType::Waitlist)
        .await?;

    deps.users.upsert_tg_user(tg_user).await?;

    if !payload.is_empty() {
        let attribution =
            deep_link::handle_deep_link_used(deps, &user, &tg_user.full_name(), payload).await;

        match attribution {
            Ok(attribution) => debug!(?attribution, "Handled the deep link"),
            Err(err) => warn!(err = tracing_err(&err), "Failed to handle the deep link"),
        }
    }

    // The deep link might have promoted the user
    let user = deps
        .users
        .get_user(user.id)
        .await?
        .fatal_ctx(|| format!("User {} disappeared right after creation", user.id))?;

    let user_type = if needs_restore(user.user_type, waitlist_mode) {
        let update = UserUpdate {
            user_type: Some(UserType::User),
            ..Default::default()
        };
        deps.users.update_user(user.id, update).await?;

        info!(from = %user.user_type, "Restored the user");

        UserType::User
    } else {
        user.user_type
    };

    let key = match user_type {
        UserType::Waitlist => "start_waitlist",
        _ => "start_welcome",
    };

    let text = deps.localizer.lookup(key, tg_user.language_code.as_deref())?;

    deps.messenger.send_text(chat_id, text.to_owned()).await?;

    Ok(())
}

/// Whether the user that sent `/start` should become a regular user
fn needs_restore(user_type: UserType, waitlist_mode: bool) -> bool {
    match user_type {
        UserType::BlockedBot => true,
        UserType::Waitlist => !waitlist_mode,
        UserType::User | UserType::Moderator | UserType::Admin => false,
    }
}
