use super::stats::{EngagementStats, UploadedMeme, WeeklyTop};
use crate::localizer::Localizer;
use crate::observability::metrics;
use crate::prelude::*;
use crate::tg::{self, AdminLog, Messenger};
use crate::treasury::Treasury;
use crate::Result;
use itertools::Itertools;
use std::time::Duration;
use teloxide::types::{ChatId, UserId};
use teloxide::utils::html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RewardCycleOutcome {
    /// There were too few memes this week, nobody was paid or notified
    NotEnoughMemes { total: usize },
    Rewarded {
        /// Payments made by this run. Less than the number of ranks on reruns
        paid: usize,
        /// Authors that received the personal stats
        notified: usize,
    },
}

impl RewardCycleOutcome {
    fn metric_label(self) -> &'static str {
        match self {
            RewardCycleOutcome::NotEnoughMemes { .. } => "not_enough_memes",
            RewardCycleOutcome::Rewarded { .. } => "rewarded",
        }
    }
}

/// Single run of the weekly reward for the best uploaded memes
pub(crate) struct UploadedMemesReward<'a> {
    pub(crate) treasury: &'a dyn Treasury,
    pub(crate) messenger: &'a dyn Messenger,
    pub(crate) localizer: &'a Localizer,
    pub(crate) admin_log: &'a AdminLog,
    pub(crate) channel_chat: ChatId,
    pub(crate) channel_link: &'a str,
    pub(crate) lang: &'a str,
    pub(crate) dm_delay: Duration,

    /// Date of the run, used as the idempotency key of the payments, so
    /// reruns on the same day don't pay twice
    pub(crate) today: String,
}

/// Fetches the memes uploaded during the last week and rewards their authors
pub(crate) async fn run_weekly_uploaded_memes(
    ctx: &tg::Ctx,
    cfg: &super::Config,
    lang: &str,
) -> Result<RewardCycleOutcome> {
    let memes = ctx.memes.uploaded_memes_weekly(lang).await?;

    let reward = UploadedMemesReward {
        treasury: &*ctx.treasury,
        messenger: &ctx.bot,
        localizer: &ctx.localizer,
        admin_log: &ctx.admin_log,
        channel_chat: cfg.channel_chat(),
        channel_link: &cfg.channel_link,
        lang,
        dm_delay: cfg.dm_delay(),
        today: chrono::Local::now().to_day_key(),
    };

    reward.run(&memes).await
}

impl UploadedMemesReward<'_> {
    #[instrument(skip_all, fields(lang = self.lang, today = %self.today))]
    pub(crate) async fn run(&self, memes: &[UploadedMeme]) -> Result<RewardCycleOutcome> {
        let outcome = self.run_imp(memes).await?;

        ::metrics::increment_counter!(
            metrics::REWARD_CYCLES_TOTAL,
            "outcome" => outcome.metric_label()
        );

        info!(?outcome, "Weekly reward cycle finished");

        Ok(outcome)
    }

    async fn run_imp(&self, memes: &[UploadedMeme]) -> Result<RewardCycleOutcome> {
        info!(count = memes.len(), "Received weekly uploaded memes");

        let top = match WeeklyTop::compute(memes) {
            Ok(top) => top,
            Err(err) => {
                warn!(err = tracing_err(&err), "Skipping the weekly reward");
                self.admin_log.log(err.to_string()).await;
                return Ok(RewardCycleOutcome::NotEnoughMemes { total: err.total });
            }
        };

        let stats = EngagementStats::weekly(memes);

        info!(
            ?stats,
            like_ratio = stats.like_ratio(),
            "Weekly uploaded memes stats"
        );

        let mut paid = 0;
        for (rank, meme) in &top.winners {
            let new_payment = self
                .treasury
                .pay_if_not_paid(meme.author_id, rank.trx_type, &self.today)
                .await?;

            debug!(
                place = rank.place,
                author_id = %meme.author_id,
                new_payment,
                "Rewarded the top meme author"
            );

            paid += usize::from(new_payment);
        }

        let file_ids = top
            .winners
            .iter()
            .map(|(_, meme)| meme.telegram_file_id.clone())
            .collect();

        let message_ids = self
            .messenger
            .send_photo_group(self.channel_chat, file_ids, self.caption(&top, &stats)?)
            .await?;

        let first_message = message_ids
            .first()
            .fatal_ctx(|| "Telegram returned no messages for the media group")?;

        let link = format!(
            "{}/{}",
            self.channel_link.trim_end_matches('/'),
            first_message.0
        );

        let authors = top.authors();

        info!(count = authors.len(), "Notifying the authors of the top memes");

        let mut notified = 0;
        for author_id in authors {
            tokio::time::sleep(self.dm_delay).await;

            match self.notify_author(memes, author_id, &link).await {
                Ok(()) => notified += 1,
                Err(err) => warn!(
                    err = tracing_err(&err),
                    author_id = %author_id,
                    "Failed to send the weekly stats to the author"
                ),
            }
        }

        Ok(RewardCycleOutcome::Rewarded { paid, notified })
    }

    fn caption(&self, top: &WeeklyTop<'_>, stats: &EngagementStats) -> Result<String> {
        let ranking = top
            .winners
            .iter()
            .map(|(rank, meme)| {
                let nickname = meme.nickname.as_deref().unwrap_or("???");
                format!("{} - {}", rank.medal, html::escape(nickname))
            })
            .join("\n");

        // User-provided text goes last so that it isn't treated as a template
        self.localizer.format(
            "weekly_top_caption",
            Some(self.lang),
            &[
                ("nuploaded", stats.nuploaded.to_string()),
                ("nusers", stats.nusers.to_string()),
                ("nviews", stats.nviews.to_string()),
                ("like_percent", stats.like_percent().to_string()),
                ("ranking", ranking),
            ],
        )
    }

    async fn notify_author(&self, memes: &[UploadedMeme], author_id: UserId, link: &str) -> Result {
        let stats = EngagementStats::of_author(memes, author_id);

        let text = self.localizer.format(
            "weekly_top_author_stats",
            Some(self.lang),
            &[
                ("nuploaded", stats.nuploaded.to_string()),
                ("nviews", stats.nviews.to_string()),
                ("like_percent", stats.like_percent().to_string()),
                ("link", link.to_owned()),
            ],
        )?;

        self.messenger
            .send_text(ChatId::from(author_id), text)
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::super::stats::tests::meme;
    use super::*;
    use crate::testing::Fixture;
    use expect_test::expect;

    const CHANNEL: ChatId = ChatId(-100500);

    fn reward(fx: &Fixture) -> UploadedMemesReward<'_> {
        UploadedMemesReward {
            treasury: &fx.treasury,
            messenger: &*fx.messenger,
            localizer: &fx.localizer,
            admin_log: &fx.admin_log,
            channel_chat: CHANNEL,
            channel_link: "https://t.me/memes_ru/",
            lang: "ru",
            dm_delay: Duration::ZERO,
            today: "2023-10-09".to_owned(),
        }
    }

    /// Author 1 holds the 1st and the 3rd places
    fn week() -> Vec<UploadedMeme> {
        vec![
            meme(1, 9, 1),
            meme(2, 8, 2),
            meme(5, 1, 9),
            meme(1, 7, 3),
            meme(3, 6, 4),
            meme(4, 5, 5),
        ]
    }

    #[test_log::test(tokio::test)]
    async fn not_enough_memes() {
        let fx = Fixture::new();
        let memes = &week()[..4];

        let outcome = reward(&fx).run(memes).await.unwrap();

        assert_eq!(outcome, RewardCycleOutcome::NotEnoughMemes { total: 4 });
        assert!(fx.treasury.payments().is_empty());
        assert!(fx.messenger.photo_groups().is_empty());
        assert!(fx.messenger.text_recipients().is_empty());

        expect![[r#"
            [
                "Not enough memes to reward users: only 4, but at least 5 required",
            ]
        "#]]
        .assert_debug_eq(&fx.admin_logs());
    }

    #[test_log::test(tokio::test)]
    async fn rewards_and_announces_the_top() {
        let fx = Fixture::new();

        let outcome = reward(&fx).run(&week()).await.unwrap();

        assert_eq!(
            outcome,
            RewardCycleOutcome::Rewarded {
                paid: 5,
                notified: 4
            }
        );

        let payments: Vec<_> = fx
            .treasury
            .payments()
            .into_iter()
            .map(|(user_id, trx_type, external_id)| {
                format!("{user_id} {trx_type} {external_id}")
            })
            .collect();

        expect![[r#"
            [
                "1 uploader_top_weekly_1 2023-10-09",
                "2 uploader_top_weekly_2 2023-10-09",
                "1 uploader_top_weekly_3 2023-10-09",
                "3 uploader_top_weekly_4 2023-10-09",
                "4 uploader_top_weekly_5 2023-10-09",
            ]
        "#]]
        .assert_debug_eq(&payments);

        let [(chat, file_ids, caption)] = <[_; 1]>::try_from(fx.messenger.photo_groups()).unwrap();

        assert_eq!(chat, CHANNEL);
        assert_eq!(
            file_ids,
            ["file-1-9-1", "file-2-8-2", "file-1-7-3", "file-3-6-4", "file-4-5-5"]
        );
        assert_eq!(
            caption,
            [
                "🏆 ТОП-5 загруженных мемов недели",
                "",
                "🥇 - author1",
                "🥈 - author2",
                "🥉 - author1",
                "🏅 - author3",
                "🏅 - author4",
                "",
                "📥 Загружено мемов: 6",
                "👤 Пользователями: 5",
                "👁️ Просмотры: 120",
                "👍 Доля лайков: 60%",
            ]
            .join("\n")
        );

        // Each author is notified once in the order of their best rank
        assert_eq!(
            fx.messenger.text_recipients(),
            [ChatId(1), ChatId(2), ChatId(3), ChatId(4)]
        );

        assert_eq!(
            fx.messenger.texts_to(ChatId(1)),
            [[
                "Стата по загруженным тобой мемам:",
                "📥 Загружено мемов: 2",
                "👁️ Просмотры: 22",
                "👍 Доля лайков: 80%",
                "",
                "Смотри топ-5 мемов недели в нашем канале: https://t.me/memes_ru/1",
            ]
            .join("\n")]
        );
    }

    #[test_log::test(tokio::test)]
    async fn rerun_on_the_same_day_doesnt_pay_twice() {
        let fx = Fixture::new();

        reward(&fx).run(&week()).await.unwrap();
        let outcome = reward(&fx).run(&week()).await.unwrap();

        assert_eq!(
            outcome,
            RewardCycleOutcome::Rewarded {
                paid: 0,
                notified: 4
            }
        );
        assert_eq!(fx.treasury.payments().len(), 5);
    }

    #[test_log::test(tokio::test)]
    async fn failed_message_doesnt_stop_the_batch() {
        let fx = Fixture::new();
        fx.messenger.fail_for(ChatId(2));

        let outcome = reward(&fx).run(&week()).await.unwrap();

        assert_eq!(
            outcome,
            RewardCycleOutcome::Rewarded {
                paid: 5,
                notified: 3
            }
        );
        assert_eq!(
            fx.messenger.text_recipients(),
            [ChatId(1), ChatId(3), ChatId(4)]
        );
    }

    #[test_log::test(tokio::test)]
    async fn missing_nickname_and_html_are_handled() {
        let fx = Fixture::new();
        let mut memes = week();
        memes[0].nickname = None;
        memes[1].nickname = Some("<b>{nusers}</b>".to_owned());

        reward(&fx).run(&memes).await.unwrap();

        let (_, _, caption) = fx.messenger.photo_groups().remove(0);

        assert!(caption.contains("🥇 - ???\n"), "{caption}");
        assert!(caption.contains("🥈 - &lt;b&gt;{nusers}&lt;/b&gt;\n"), "{caption}");
    }
}
