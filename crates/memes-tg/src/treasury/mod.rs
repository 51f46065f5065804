//! In-app currency (🍔) payments

use crate::db::{TreasuryRepo, UserService};
use crate::localizer::Localizer;
use crate::observability::metrics;
use crate::prelude::*;
use crate::tg::{AdminLog, Messenger};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::types::{ChatId, UserId};

/// The reason of the payment. Its `snake_case` name is stored in the ledger,
/// so the variants must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum TrxType {
    #[strum(serialize = "uploader_top_weekly_1")]
    UploaderTopWeekly1,
    #[strum(serialize = "uploader_top_weekly_2")]
    UploaderTopWeekly2,
    #[strum(serialize = "uploader_top_weekly_3")]
    UploaderTopWeekly3,
    #[strum(serialize = "uploader_top_weekly_4")]
    UploaderTopWeekly4,
    #[strum(serialize = "uploader_top_weekly_5")]
    UploaderTopWeekly5,
    UserInviter,
    UserInviterPremium,
}

impl TrxType {
    #[cfg(test)]
    pub(crate) const ALL: [TrxType; 7] = [
        TrxType::UploaderTopWeekly1,
        TrxType::UploaderTopWeekly2,
        TrxType::UploaderTopWeekly3,
        TrxType::UploaderTopWeekly4,
        TrxType::UploaderTopWeekly5,
        TrxType::UserInviter,
        TrxType::UserInviterPremium,
    ];

    /// Number of 🍔 paid for this kind of transaction
    pub(crate) fn amount(self) -> u32 {
        match self {
            TrxType::UploaderTopWeekly1 => 500,
            TrxType::UploaderTopWeekly2 => 300,
            TrxType::UploaderTopWeekly3 => 200,
            TrxType::UploaderTopWeekly4 => 100,
            TrxType::UploaderTopWeekly5 => 50,
            TrxType::UserInviter => 100,
            TrxType::UserInviterPremium => 200,
        }
    }

    /// Key of the localized human-readable reason of the payment
    pub(crate) fn reason_key(self) -> &'static str {
        match self {
            TrxType::UploaderTopWeekly1 => "trx_reason_uploader_top_weekly_1",
            TrxType::UploaderTopWeekly2 => "trx_reason_uploader_top_weekly_2",
            TrxType::UploaderTopWeekly3 => "trx_reason_uploader_top_weekly_3",
            TrxType::UploaderTopWeekly4 => "trx_reason_uploader_top_weekly_4",
            TrxType::UploaderTopWeekly5 => "trx_reason_uploader_top_weekly_5",
            TrxType::UserInviter => "trx_reason_user_inviter",
            TrxType::UserInviterPremium => "trx_reason_user_inviter_premium",
        }
    }
}

#[async_trait]
pub(crate) trait Treasury: Send + Sync {
    /// Pays the user unless a payment with the same type and external id was
    /// already made to them. Returns `true` if the payment was made by this call.
    async fn pay_if_not_paid(
        &self,
        user_id: UserId,
        trx_type: TrxType,
        external_id: &str,
    ) -> Result<bool>;
}

/// [`Treasury`] backed by the database ledger that also alerts the user and
/// the admins about every new payment.
pub(crate) struct TreasuryService {
    repo: TreasuryRepo,
    messenger: Arc<dyn Messenger>,
    users: Arc<dyn UserService>,
    localizer: Arc<Localizer>,
    admin_log: AdminLog,
}

impl TreasuryService {
    pub(crate) fn new(
        repo: TreasuryRepo,
        messenger: Arc<dyn Messenger>,
        users: Arc<dyn UserService>,
        localizer: Arc<Localizer>,
        admin_log: AdminLog,
    ) -> Self {
        Self {
            repo,
            messenger,
            users,
            localizer,
            admin_log,
        }
    }

    async fn alert_user(&self, user_id: UserId, trx_type: TrxType) -> Result {
        let lang = self
            .users
            .get_tg_user(user_id)
            .await?
            .and_then(|tg_user| tg_user.language_code);

        let lang = lang.as_deref();

        let reason = self.localizer.lookup(trx_type.reason_key(), lang)?;
        let text = self.localizer.format(
            "payment_received",
            lang,
            &[
                ("amount", trx_type.amount().to_string()),
                ("reason", reason.to_owned()),
            ],
        )?;

        self.messenger
            .send_text(ChatId::from(user_id), text)
            .await
            .map(drop)
    }
}

#[async_trait]
impl Treasury for TreasuryService {
    #[instrument(skip(self))]
    async fn pay_if_not_paid(
        &self,
        user_id: UserId,
        trx_type: TrxType,
        external_id: &str,
    ) -> Result<bool> {
        let paid = self
            .repo
            .pay_if_not_paid(user_id, trx_type, external_id)
            .await?;

        let outcome = if paid { "paid" } else { "already_paid" };

        ::metrics::increment_counter!(
            metrics::TREASURY_PAYMENTS_TOTAL,
            "trx_type" => trx_type.as_ref().to_owned(),
            "outcome" => outcome
        );

        if !paid {
            debug!("The payment was already made earlier");
            return Ok(false);
        }

        info!(amount = trx_type.amount(), "Paid the user");

        if let Err(err) = self.alert_user(user_id, trx_type).await {
            warn!(
                err = tracing_err(&err),
                "Failed to notify the user about the payment"
            );
        }

        self.admin_log
            .log(format!(
                "💰 #{user_id} +{} 🍔 for {trx_type} ({external_id})",
                trx_type.amount()
            ))
            .await;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn ledger_names_and_amounts() {
        let table = TrxType::ALL.map(|trx| format!("{trx} = {}", trx.amount()));

        expect![[r#"
            [
                "uploader_top_weekly_1 = 500",
                "uploader_top_weekly_2 = 300",
                "uploader_top_weekly_3 = 200",
                "uploader_top_weekly_4 = 100",
                "uploader_top_weekly_5 = 50",
                "user_inviter = 100",
                "user_inviter_premium = 200",
            ]
        "#]]
        .assert_debug_eq(&table);
    }

    #[test]
    fn reason_keys_follow_ledger_names() {
        for trx in TrxType::ALL {
            assert_eq!(trx.reason_key(), format!("trx_reason_{trx}"));
        }
    }
}
