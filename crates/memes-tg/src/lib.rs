mod config;
mod db;
mod error;
mod localizer;
mod observability;
mod rewards;
mod treasury;
mod tg;

#[cfg(test)]
mod testing;

mod util;

pub use crate::error::*;
pub use config::*;
pub use observability::*;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

use prelude::*;

/// Run the telegram bot processing loop
pub async fn run_bot(config: Config) -> Result<()> {
    let db = db::init(config.db).await?;

    let ctx = tg::Ctx::new(config.tg, config.localization, db)?;

    tg::run_bot(ctx).await
}

/// Run a single weekly reward cycle for the top uploaded memes and exit.
/// Supposed to be invoked by an external scheduler once a week.
pub async fn reward_weekly_uploaded_memes(config: Config, lang: Option<String>) -> Result<()> {
    let rewards_cfg: rewards::Config = config::from_env_or_panic("REWARDS_");

    let db = db::init(config.db).await?;

    let ctx = tg::Ctx::new(config.tg, config.localization, db)?;

    let lang = lang.unwrap_or_else(|| rewards_cfg.lang.clone());

    rewards::run_weekly_uploaded_memes(&ctx, &rewards_cfg, &lang)
        .with_duration_log("Weekly uploaded memes reward cycle")
        .await
        .map(drop)
}
