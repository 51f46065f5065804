//! Referral attribution through `/start` deep links

use crate::db::{User, UserType, UserUpdate};
use crate::observability::metrics;
use crate::prelude::*;
use crate::tg::Deps;
use crate::treasury::TrxType;
use crate::Result;
use teloxide::types::{ChatId, UserId};
use teloxide::utils::html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeepLink {
    /// Link under a meme shared by a user: `s_<inviter_id>_<meme_id>`
    MemeShare { inviter_id: UserId, meme_id: u64 },
}

impl DeepLink {
    /// The whole payload must match the pattern, anything else is not a
    /// deep link known to the bot.
    // Trailing garbage such as `s_42_7abc` is rejected, not treated as `s_42_7`
    pub(crate) fn parse(payload: &str) -> Option<Self> {
        let (_, inviter_id, meme_id) = lazy_regex::regex_captures!(r"^s_(\d+)_(\d+)$", payload)?;

        Some(Self::MemeShare {
            inviter_id: UserId(inviter_id.parse().ok()?),
            meme_id: meme_id.parse().ok()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attribution {
    Unrecognized,
    SelfInvite,
    UnknownInviter,
    Attributed {
        /// The invitee had no inviter and got this one
        inviter_recorded: bool,
        /// The invitee became a regular user and the inviter was rewarded
        invitee_promoted: bool,
    },
}

impl Attribution {
    fn metric_label(self) -> &'static str {
        match self {
            Attribution::Unrecognized => "unrecognized",
            Attribution::SelfInvite => "self_invite",
            Attribution::UnknownInviter => "unknown_inviter",
            Attribution::Attributed {
                invitee_promoted: true,
                ..
            } => "promoted",
            Attribution::Attributed { .. } => "attributed",
        }
    }
}

/// Attributes the invited user to the inviter from the deep link payload.
///
/// The first inviter of the user is never overwritten. A waitlisted or
/// blocked invitee becomes a regular user if the inviter isn't on the
/// waitlist, in which case the inviter is notified and rewarded once per
/// invitee.
#[instrument(skip_all, fields(invited = %invited.id, payload = %payload))]
pub(crate) async fn handle_deep_link_used(
    deps: &Deps<'_>,
    invited: &User,
    invited_name: &str,
    payload: &str,
) -> Result<Attribution> {
    let attribution = attribute(deps, invited, invited_name, payload).await?;

    ::metrics::increment_counter!(
        metrics::DEEP_LINKS_TOTAL,
        "outcome" => attribution.metric_label()
    );

    Ok(attribution)
}

async fn attribute(
    deps: &Deps<'_>,
    invited: &User,
    invited_name: &str,
    payload: &str,
) -> Result<Attribution> {
    let Some(DeepLink::MemeShare { inviter_id, meme_id }) = DeepLink::parse(payload) else {
        debug!("Unrecognized deep link");
        return Ok(Attribution::Unrecognized);
    };

    debug!(%inviter_id, meme_id, "Meme share deep link");

    if inviter_id == invited.id {
        return Ok(Attribution::SelfInvite);
    }

    let Some(inviter) = deps.users.get_user(inviter_id).await? else {
        debug!(%inviter_id, "Inviter doesn't exist");
        return Ok(Attribution::UnknownInviter);
    };

    let inviter_recorded = invited.inviter_id.is_none();

    if inviter_recorded {
        let update = UserUpdate {
            inviter_id: Some(inviter_id),
            ..Default::default()
        };
        deps.users.update_user(invited.id, update).await?;
    }

    let invitee_promoted = inviter.user_type != UserType::Waitlist
        && matches!(invited.user_type, UserType::Waitlist | UserType::BlockedBot);

    if invitee_promoted {
        reward_inviter(deps, invited, invited_name, inviter_id).await?;
    }

    Ok(Attribution::Attributed {
        inviter_recorded,
        invitee_promoted,
    })
}

async fn reward_inviter(
    deps: &Deps<'_>,
    invited: &User,
    invited_name: &str,
    inviter_id: UserId,
) -> Result {
    let update = UserUpdate {
        user_type: Some(UserType::User),
        ..Default::default()
    };
    deps.users.update_user(invited.id, update).await?;

    let inviter_tg = deps.users.get_tg_user(inviter_id).await?;

    let lang = inviter_tg
        .as_ref()
        .and_then(|tg_user| tg_user.language_code.as_deref());

    let alert = deps.localizer.format(
        "invite_success",
        lang,
        &[("invited_name", html::escape(invited_name))],
    )?;

    if let Err(err) = deps.messenger.send_text(ChatId::from(inviter_id), alert).await {
        warn!(
            err = tracing_err(&err),
            "Failed to notify the inviter about the invitation"
        );
    }

    let is_premium = inviter_tg.is_some_and(|tg_user| tg_user.is_premium);

    let trx_type = if is_premium {
        TrxType::UserInviterPremium
    } else {
        TrxType::UserInviter
    };

    deps.treasury
        .pay_if_not_paid(inviter_id, trx_type, &invited.id.to_string())
        .await?;

    deps.admin_log
        .log(format!("🤝 #{inviter_id} invited {invited_name}"))
        .await;

    Ok(())
}
