use crate::prelude::*;
use crate::treasury::TrxType;
use crate::Result;
use sqlx_bat::prelude::*;
use teloxide::types::UserId;

pub(crate) struct TreasuryRepo {
    db: sqlx::PgPool,
}

impl TreasuryRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    /// Records the transaction and credits the user balance in a single
    /// database transaction. Returns `false` if a transaction with the same
    /// `(user_id, trx_type, external_id)` already exists, in which case
    /// nothing is changed.
    #[instrument(skip(self))]
    pub(crate) async fn pay_if_not_paid(
        &self,
        user_id: UserId,
        trx_type: TrxType,
        external_id: &str,
    ) -> Result<bool> {
        let user_id: i64 = user_id.try_into_db()?;
        let amount = i64::from(trx_type.amount());

        let mut tx = self.db.begin().await?;

        let trx_id: Option<i64> = sqlx::query_scalar(
            "insert into treasury_trx (user_id, type, amount, external_id)
            values ($1, $2, $3, $4)
            on conflict (user_id, type, external_id) do nothing
            returning id",
        )
        .bind(user_id)
        .bind(trx_type.as_ref())
        .bind(amount)
        .bind(external_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(trx_id) = trx_id else {
            return Ok(false);
        };

        sqlx::query(r#"update "user" set balance = balance + $1, updated_at = now() where id = $2"#)
            .bind(amount)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(trx_id, "Recorded treasury transaction");

        Ok(true)
    }
}
