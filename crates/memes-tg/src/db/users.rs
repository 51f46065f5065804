use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use sea_query::{Expr, Iden, Query};
use sqlx_bat::prelude::*;
use sqlx_bat::SqlxQuery;
use teloxide::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, strum::Display)]
#[repr(i16)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum UserType {
    Waitlist = 0,
    User = 1,
    BlockedBot = 2,
    Moderator = 3,
    Admin = 4,
}

sqlx_bat::impl_try_into_from_db_via_std!(UserType, i16);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct User {
    pub(crate) id: UserId,
    pub(crate) user_type: UserType,
    pub(crate) inviter_id: Option<UserId>,
    pub(crate) nickname: Option<String>,
    pub(crate) balance: i64,
}

/// Snapshot of the Telegram profile of the user taken at their last `/start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TgUser {
    pub(crate) id: UserId,
    pub(crate) username: Option<String>,
    pub(crate) first_name: String,
    pub(crate) last_name: Option<String>,
    pub(crate) language_code: Option<String>,
    pub(crate) is_premium: bool,
}

impl TgUser {
    pub(crate) fn full_name(&self) -> String {
        match &self.last_name {
            Some(last_name) => format!("{} {last_name}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

impl From<&teloxide::types::User> for TgUser {
    fn from(user: &teloxide::types::User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            language_code: user.language_code.clone(),
            is_premium: user.is_premium,
        }
    }
}

/// Partial update of the [`User`]. `None` fields are left untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct UserUpdate {
    pub(crate) inviter_id: Option<UserId>,
    pub(crate) user_type: Option<UserType>,
}

/// Read and update access to user profiles
#[async_trait]
pub(crate) trait UserService: Send + Sync {
    /// Creates the user with the given type if they don't exist yet.
    /// An existing user is returned as is.
    async fn get_or_create_user(
        &self,
        id: UserId,
        nickname: Option<&str>,
        default_type: UserType,
    ) -> Result<User>;

    /// Saves the current Telegram profile of the user. The [`User`] must
    /// already exist.
    async fn upsert_tg_user(&self, tg_user: &TgUser) -> Result;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn get_tg_user(&self, id: UserId) -> Result<Option<TgUser>>;

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result;
}

#[derive(sqlx::FromRow)]
struct UserRecord {
    id: i64,
    #[sqlx(rename = "type")]
    user_type: i16,
    inviter_id: Option<i64>,
    nickname: Option<String>,
    balance: i64,
}

impl UserRecord {
    fn into_app(self) -> Result<User> {
        Ok(User {
            id: self.id.try_into_app()?,
            user_type: self.user_type.try_into_app()?,
            inviter_id: self.inviter_id.try_into_app()?,
            nickname: self.nickname,
            balance: self.balance,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TgUserRecord {
    id: i64,
    username: Option<String>,
    first_name: String,
    last_name: Option<String>,
    language_code: Option<String>,
    is_premium: bool,
}

impl TgUserRecord {
    fn into_app(self) -> Result<TgUser> {
        Ok(TgUser {
            id: self.id.try_into_app()?,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            language_code: self.language_code,
            is_premium: self.is_premium,
        })
    }
}

#[derive(Iden)]
enum UserIden {
    #[iden = "user"]
    Table,
    Id,
    Type,
    InviterId,
    UpdatedAt,
}

pub(crate) struct UserRepo {
    db: sqlx::PgPool,
}

impl UserRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserService for UserRepo {
    #[instrument(skip(self))]
    async fn get_or_create_user(
        &self,
        id: UserId,
        nickname: Option<&str>,
        default_type: UserType,
    ) -> Result<User> {
        let id: i64 = id.try_into_db()?;

        sqlx::query(
            r#"insert into "user" (id, type, nickname)
            values ($1, $2, $3)
            on conflict (id) do nothing"#,
        )
        .bind(id)
        .bind(i16::from(default_type))
        .bind(nickname)
        .execute(&self.db)
        .await?;

        sqlx::query_as::<_, UserRecord>(
            r#"select id, type, inviter_id, nickname, balance from "user" where id = $1"#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?
        .into_app()
    }

    #[instrument(skip_all, fields(user = %tg_user.id))]
    async fn upsert_tg_user(&self, tg_user: &TgUser) -> Result {
        let id: i64 = tg_user.id.try_into_db()?;

        sqlx::query(
            "insert into user_tg (id, username, first_name, last_name, language_code, is_premium)
            values ($1, $2, $3, $4, $5, $6)
            on conflict (id) do update set
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                language_code = excluded.language_code,
                is_premium = excluded.is_premium,
                updated_at = now()",
        )
        .bind(id)
        .bind(tg_user.username.as_deref())
        .bind(&tg_user.first_name)
        .bind(tg_user.last_name.as_deref())
        .bind(tg_user.language_code.as_deref())
        .bind(tg_user.is_premium)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRecord>(
            r#"select id, type, inviter_id, nickname, balance from "user" where id = $1"#,
        )
        .bind(id.try_into_db()?)
        .fetch_optional(&self.db)
        .await?
        .map(UserRecord::into_app)
        .transpose()
    }

    #[instrument(skip(self))]
    async fn get_tg_user(&self, id: UserId) -> Result<Option<TgUser>> {
        sqlx::query_as::<_, TgUserRecord>(
            "select id, username, first_name, last_name, language_code, is_premium
            from user_tg where id = $1",
        )
        .bind(id.try_into_db()?)
        .fetch_optional(&self.db)
        .await?
        .map(TgUserRecord::into_app)
        .transpose()
    }

    #[instrument(skip(self))]
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result {
        let Some(mut query) = update_user_query(id, &update)? else {
            return Ok(());
        };

        query.query().execute(&self.db).await?;

        Ok(())
    }
}

fn update_user_query(id: UserId, update: &UserUpdate) -> Result<Option<SqlxQuery>> {
    if update.inviter_id.is_none() && update.user_type.is_none() {
        return Ok(None);
    }

    let mut query = Query::update();

    query
        .table(UserIden::Table)
        .value(UserIden::UpdatedAt, Expr::current_timestamp())
        .and_where(Expr::col(UserIden::Id).eq(id.try_into_db()?));

    if let Some(inviter_id) = update.inviter_id {
        query.value(UserIden::InviterId, inviter_id.try_into_db()?);
    }

    if let Some(user_type) = update.user_type {
        query.value(UserIden::Type, user_type.try_into_db()?);
    }

    Ok(Some(query.into_sqlx()))
}
