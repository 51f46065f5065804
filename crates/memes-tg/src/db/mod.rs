mod cfg;
mod error;
mod memes;
mod treasury;
mod users;

pub(crate) use cfg::*;
pub(crate) use error::*;
pub(crate) use memes::*;
pub(crate) use treasury::*;
pub(crate) use users::*;

use crate::prelude::*;
use crate::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

pub(crate) struct Repo {
    pub(crate) users: Arc<UserRepo>,
    pub(crate) memes: MemeRepo,
    pub(crate) treasury: TreasuryRepo,
}

#[instrument(skip_all)]
pub(crate) async fn init(cfg: Config) -> Result<Repo> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.pool_size)
        .connect(cfg.url.as_str())
        .await
        .map_err(err_ctx!(DbError::Connect))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(err_ctx!(DbError::Migrate))?;

    info!("Database migrations are up to date");

    Ok(Repo {
        users: Arc::new(UserRepo::new(pool.clone())),
        memes: MemeRepo::new(pool.clone()),
        treasury: TreasuryRepo::new(pool),
    })
}
