use crate::prelude::*;
use crate::rewards::UploadedMeme;
use crate::Result;
use sqlx_bat::prelude::*;
use sqlx_bat::{DbRepresentable, TryFromDb};

pub(crate) struct MemeRepo {
    db: sqlx::PgPool,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UploadedMemeRecord {
    author_id: i64,
    nickname: Option<String>,
    telegram_file_id: String,
    nlikes: i64,
    ndislikes: i64,
    nviews: i64,
    nmemes_sent: i64,
}

impl DbRepresentable for UploadedMeme {
    type DbRepr = UploadedMemeRecord;
}

impl TryFromDb for UploadedMeme {
    fn try_from_db(record: UploadedMemeRecord) -> sqlx_bat::Result<Self> {
        Ok(Self {
            author_id: record.author_id.try_into_app()?,
            nickname: record.nickname,
            telegram_file_id: record.telegram_file_id,
            nlikes: record.nlikes.try_into_app()?,
            ndislikes: record.ndislikes.try_into_app()?,
            nviews: record.nviews.try_into_app()?,
            nmemes_sent: record.nmemes_sent.try_into_app()?,
        })
    }
}

impl MemeRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    /// Memes in the given language that were uploaded by users during the
    /// last 7 days and passed moderation, in the order of upload.
    #[instrument(skip(self))]
    pub(crate) async fn uploaded_memes_weekly(&self, lang: &str) -> Result<Vec<UploadedMeme>> {
        let records = sqlx::query_as::<_, UploadedMemeRecord>(
            r#"select
                m.author_id,
                u.nickname,
                m.telegram_file_id,
                coalesce(ms.nlikes, 0) as nlikes,
                coalesce(ms.ndislikes, 0) as ndislikes,
                coalesce(ms.nviews, 0) as nviews,
                coalesce(ms.nmemes_sent, 0) as nmemes_sent
            from meme m
            inner join "user" u on u.id = m.author_id
            left join meme_stats ms on ms.meme_id = m.id
            where m.status = 'ok'
                and m.language_code = $1
                and m.created_at > now() - interval '7 days'
            order by m.id"#,
        )
        .bind(lang)
        .fetch_all(&self.db)
        .await?;

        let memes = records
            .into_iter()
            .map(|record| record.try_into_app())
            .collect::<sqlx_bat::Result<Vec<UploadedMeme>>>()?;

        debug!(count = memes.len(), "Fetched weekly uploaded memes");

        Ok(memes)
    }
}
