//! Telegram bot runtime

mod admin_log;
mod cmd;
mod config;
mod deep_link;
mod messenger;
mod my_chat_member;

use crate::db::{self, MemeRepo, UserService};
use crate::localizer::{self, Localizer};
use crate::observability::metrics;
use crate::prelude::*;
use crate::treasury::{Treasury, TreasuryService};
use crate::Result;
use dptree::di::DependencyMap;
use std::sync::Arc;
use teloxide::adaptors::{CacheMe, DefaultParseMode, Throttle, Trace};
use teloxide::dispatching::{HandlerExt, UpdateFilterExt};
use teloxide::prelude::*;
use teloxide::types::ParseMode;

pub(crate) use admin_log::AdminLog;
pub(crate) use config::*;
pub(crate) use messenger::Messenger;

pub(crate) type Bot = Trace<CacheMe<DefaultParseMode<Throttle<teloxide::Bot>>>>;

pub(crate) struct Ctx {
    pub(crate) bot: Bot,
    pub(crate) cfg: Config,
    pub(crate) users: Arc<dyn UserService>,
    pub(crate) memes: MemeRepo,
    pub(crate) treasury: Arc<TreasuryService>,
    pub(crate) localizer: Arc<Localizer>,
    pub(crate) admin_log: AdminLog,
}

impl Ctx {
    pub(crate) fn new(cfg: Config, localization: localizer::Config, db: db::Repo) -> Result<Self> {
        let bot: Bot = teloxide::Bot::new(cfg.token.clone())
            .throttle(Default::default())
            .parse_mode(ParseMode::Html)
            .cache_me()
            .trace(teloxide::adaptors::trace::Settings::all());

        let localizer = Arc::new(Localizer::load(&localization.dir)?);

        let messenger: Arc<dyn Messenger> = Arc::new(bot.clone());
        let admin_log = AdminLog::new(messenger.clone(), cfg.admin_logs_chat());
        let users: Arc<dyn UserService> = db.users;

        let treasury = TreasuryService::new(
            db.treasury,
            messenger,
            users.clone(),
            localizer.clone(),
            admin_log.clone(),
        );

        Ok(Self {
            bot,
            cfg,
            users,
            memes: db.memes,
            treasury: Arc::new(treasury),
            localizer,
            admin_log,
        })
    }

    pub(crate) fn deps(&self) -> Deps<'_> {
        Deps {
            users: &*self.users,
            treasury: &*self.treasury,
            messenger: &self.bot,
            localizer: &self.localizer,
            admin_log: &self.admin_log,
        }
    }
}

/// Collaborators of the update handlers borrowed from the [`Ctx`]
pub(crate) struct Deps<'a> {
    pub(crate) users: &'a dyn UserService,
    pub(crate) treasury: &'a dyn Treasury,
    pub(crate) messenger: &'a dyn Messenger,
    pub(crate) localizer: &'a Localizer,
    pub(crate) admin_log: &'a AdminLog,
}

pub(crate) async fn run_bot(ctx: Ctx) -> Result {
    let bot = ctx.bot.clone();

    let mut di = DependencyMap::new();
    di.insert(Arc::new(ctx));

    info!("Starting bot...");

    let handler = dptree::entry()
        .inspect(|update: Update| {
            ::metrics::increment_counter!(
                metrics::TG_UPDATES_TOTAL,
                "kind" => update.kind.discriminator()
            );
        })
        .branch(
            Update::filter_message()
                .filter(cmd::filter_pm_with_bot)
                .filter_command::<cmd::StartCommand>()
                .endpoint(cmd::handle::<cmd::StartCommand>()),
        )
        .branch(
            Update::filter_my_chat_member()
                .filter(my_chat_member::filter)
                .endpoint(my_chat_member::handle),
        )
        .inspect(|update: Update| {
            ::metrics::increment_counter!(
                metrics::TG_UPDATES_SKIPPED_TOTAL,
                "kind" => update.kind.discriminator()
            );
        });

    Dispatcher::builder(bot, handler)
        .dependencies(di)
        // Most of the updates are not interesting for the bot, so
        // there is a noop default handler to suppress the warnings about them
        .default_handler(|_| std::future::ready(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");

    Ok(())
}
