//! Pure computations over the weekly uploaded memes

use crate::treasury::TrxType;
use itertools::Itertools;
use teloxide::types::UserId;

/// Number of memes that get rewarded every week
pub(crate) const TOP_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadedMeme {
    pub(crate) author_id: UserId,
    pub(crate) nickname: Option<String>,
    pub(crate) telegram_file_id: String,
    pub(crate) nlikes: u64,
    pub(crate) ndislikes: u64,
    /// Number of users who actually looked at the meme
    pub(crate) nviews: u64,
    /// Number of times the meme was delivered to users
    pub(crate) nmemes_sent: u64,
}

impl UploadedMeme {
    pub(crate) fn like_ratio(&self) -> f64 {
        like_ratio(self.nlikes, self.ndislikes)
    }
}

/// Share of likes among all votes, `0` when there are no votes
pub(crate) fn like_ratio(nlikes: u64, ndislikes: u64) -> f64 {
    let total = nlikes + ndislikes;
    if total == 0 {
        return 0.0;
    }
    nlikes as f64 / total as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RewardRank {
    /// 1-based place in the top
    pub(crate) place: u8,
    pub(crate) trx_type: TrxType,
    pub(crate) medal: &'static str,
}

impl RewardRank {
    pub(crate) const ALL: [RewardRank; TOP_SIZE] = [
        RewardRank::new(1, TrxType::UploaderTopWeekly1, "🥇"),
        RewardRank::new(2, TrxType::UploaderTopWeekly2, "🥈"),
        RewardRank::new(3, TrxType::UploaderTopWeekly3, "🥉"),
        RewardRank::new(4, TrxType::UploaderTopWeekly4, "🏅"),
        RewardRank::new(5, TrxType::UploaderTopWeekly5, "🏅"),
    ];

    const fn new(place: u8, trx_type: TrxType, medal: &'static str) -> Self {
        Self {
            place,
            trx_type,
            medal,
        }
    }
}

/// Aggregated engagement of a set of memes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EngagementStats {
    pub(crate) nuploaded: usize,
    pub(crate) nusers: usize,
    pub(crate) nviews: u64,
    pub(crate) nlikes: u64,
    pub(crate) ndislikes: u64,
}

impl EngagementStats {
    /// Channel-level stats. The views here are the deliveries of the memes.
    pub(crate) fn weekly(memes: &[UploadedMeme]) -> Self {
        Self {
            nuploaded: memes.len(),
            nusers: memes.iter().map(|meme| meme.author_id).unique().count(),
            nviews: memes.iter().map(|meme| meme.nmemes_sent).sum(),
            nlikes: memes.iter().map(|meme| meme.nlikes).sum(),
            ndislikes: memes.iter().map(|meme| meme.ndislikes).sum(),
        }
    }

    /// Stats of a single author. The views here are the actual views.
    pub(crate) fn of_author(memes: &[UploadedMeme], author_id: UserId) -> Self {
        let own = || memes.iter().filter(move |meme| meme.author_id == author_id);

        Self {
            nuploaded: own().count(),
            nusers: 1,
            nviews: own().map(|meme| meme.nviews).sum(),
            nlikes: own().map(|meme| meme.nlikes).sum(),
            ndislikes: own().map(|meme| meme.ndislikes).sum(),
        }
    }

    /// Pooled share of likes, not the mean of the per-meme shares
    pub(crate) fn like_ratio(&self) -> f64 {
        like_ratio(self.nlikes, self.ndislikes)
    }

    /// Rounded half to even, so `62.5%` is shown as `62%`
    pub(crate) fn like_percent(&self) -> u64 {
        (self.like_ratio() * 100.0).round_ties_even() as u64
    }
}

#[derive(Debug, thiserror::Error)]
#[error(
    "Not enough memes to reward users: only {total}, but at least {min} required",
    min = TOP_SIZE
)]
pub(crate) struct NotEnoughMemes {
    pub(crate) total: usize,
}

/// The best memes of the week, each assigned to its reward rank
#[derive(Debug)]
pub(crate) struct WeeklyTop<'a> {
    pub(crate) winners: Vec<(RewardRank, &'a UploadedMeme)>,
}

impl<'a> WeeklyTop<'a> {
    /// Picks the memes with the highest like ratio. Memes with equal ratio
    /// keep their relative order from the input.
    pub(crate) fn compute(memes: &'a [UploadedMeme]) -> Result<Self, NotEnoughMemes> {
        if memes.len() < TOP_SIZE {
            return Err(NotEnoughMemes { total: memes.len() });
        }

        let mut sorted: Vec<_> = memes.iter().collect();

        // `sort_by` is stable
        sorted.sort_by(|a, b| b.like_ratio().total_cmp(&a.like_ratio()));

        let winners = RewardRank::ALL.into_iter().zip(sorted).collect();

        Ok(Self { winners })
    }

    /// Distinct authors of the top memes in the order of their best rank
    pub(crate) fn authors(&self) -> Vec<UserId> {
        self.winners
            .iter()
            .map(|(_, meme)| meme.author_id)
            .unique()
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use expect_test::expect;

    pub(crate) fn meme(author_id: u64, nlikes: u64, ndislikes: u64) -> UploadedMeme {
        UploadedMeme {
            author_id: UserId(author_id),
            nickname: Some(format!("author{author_id}")),
            telegram_file_id: format!("file-{author_id}-{nlikes}-{ndislikes}"),
            nlikes,
            ndislikes,
            nviews: nlikes + ndislikes + 1,
            nmemes_sent: (nlikes + ndislikes) * 2,
        }
    }

    fn top_summary(top: &WeeklyTop<'_>) -> Vec<String> {
        top.winners
            .iter()
            .map(|(rank, meme)| {
                format!("{} {} {}", rank.place, rank.trx_type, meme.telegram_file_id)
            })
            .collect()
    }

    #[test]
    fn zero_votes_ratio_is_zero() {
        assert_eq!(like_ratio(0, 0), 0.0);
        assert_eq!(meme(1, 0, 0).like_ratio(), 0.0);
        assert_eq!(EngagementStats::weekly(&[meme(1, 0, 0)]).like_percent(), 0);
    }

    #[test]
    fn not_enough_memes() {
        let memes: Vec<_> = (1..=4).map(|i| meme(i, 1, 0)).collect();
        let err = WeeklyTop::compute(&memes).unwrap_err();
        assert_eq!(err.total, 4);

        assert_eq!(WeeklyTop::compute(&[]).unwrap_err().total, 0);
    }

    #[test]
    fn ties_keep_input_order() {
        let memes = vec![
            meme(1, 1, 1),
            meme(2, 3, 0),
            meme(3, 2, 2),
            meme(4, 0, 0),
            meme(5, 5, 5),
            meme(6, 6, 0),
            meme(7, 4, 4),
        ];

        let top = WeeklyTop::compute(&memes).unwrap();

        expect![[r#"
            [
                "1 uploader_top_weekly_1 file-2-3-0",
                "2 uploader_top_weekly_2 file-6-6-0",
                "3 uploader_top_weekly_3 file-1-1-1",
                "4 uploader_top_weekly_4 file-3-2-2",
                "5 uploader_top_weekly_5 file-5-5-5",
            ]
        "#]]
        .assert_debug_eq(&top_summary(&top));
    }

    #[test]
    fn pooled_like_ratio_differs_from_mean() {
        // Per-meme ratios are 1.0 and 0.25, their mean would be 62.5%
        let memes = [meme(1, 1, 0), meme(2, 1, 3)];
        let stats = EngagementStats::weekly(&memes);

        assert_eq!(stats.like_ratio(), 0.4);
        assert_eq!(stats.like_percent(), 40);
    }

    #[test]
    fn like_percent_rounds_half_to_even() {
        assert_eq!(EngagementStats::weekly(&[meme(1, 5, 3)]).like_percent(), 62);
        assert_eq!(EngagementStats::weekly(&[meme(1, 3, 5)]).like_percent(), 38);
        assert_eq!(EngagementStats::weekly(&[meme(1, 1, 1)]).like_percent(), 50);
    }

    #[test]
    fn weekly_and_author_stats() {
        let memes = [meme(1, 3, 1), meme(2, 0, 2), meme(1, 1, 1)];

        expect![[r#"
            EngagementStats {
                nuploaded: 3,
                nusers: 2,
                nviews: 16,
                nlikes: 4,
                ndislikes: 4,
            }
        "#]]
        .assert_debug_eq(&EngagementStats::weekly(&memes));

        let author = EngagementStats::of_author(&memes, UserId(1));

        expect![[r#"
            EngagementStats {
                nuploaded: 2,
                nusers: 1,
                nviews: 8,
                nlikes: 4,
                ndislikes: 2,
            }
        "#]]
        .assert_debug_eq(&author);

        assert_eq!(author.like_percent(), 67);
    }

    #[test]
    fn authors_are_deduplicated_in_rank_order() {
        let memes = vec![
            meme(3, 1, 1),
            meme(1, 9, 0),
            meme(2, 5, 1),
            meme(1, 8, 1),
            meme(4, 0, 1),
        ];

        let top = WeeklyTop::compute(&memes).unwrap();

        assert_eq!(
            top.authors(),
            [UserId(1), UserId(2), UserId(3), UserId(4)]
        );
    }
}
