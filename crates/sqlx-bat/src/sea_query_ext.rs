use easy_ext::ext;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{IntoArguments, Postgres};

pub type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;
pub type PgQueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

/// [`sqlx`] queries borrow their SQL string, so the built statement has to
/// live somewhere while the query is executed. This is that somewhere.
pub struct SqlxQuery {
    sql: String,
    args: Option<PgArguments>,
}

#[ext(SqlxBinderExt)]
pub impl<T: sea_query_binder::SqlxBinder> T {
    fn into_sqlx(&self) -> SqlxQuery {
        let (sql, values) = self.build_sqlx(sea_query::PostgresQueryBuilder);
        SqlxQuery {
            sql,
            args: Some(values.into_arguments()),
        }
    }
}

impl SqlxQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Convert this to [`PgQuery`].
    ///
    /// # Panics
    ///
    /// The arguments are moved into the query, so this must be called at
    /// most once per [`SqlxQuery`].
    pub fn query(&mut self) -> PgQuery<'_> {
        let args = self.take_args();
        sqlx::query_with(&self.sql, args)
    }

    /// Convert this to [`PgQueryAs`].
    ///
    /// # Panics
    ///
    /// Same as [`SqlxQuery::query`].
    pub fn query_as<O>(&mut self) -> PgQueryAs<'_, O>
    where
        O: for<'r> sqlx::FromRow<'r, PgRow>,
    {
        let args = self.take_args();
        sqlx::query_as_with(&self.sql, args)
    }

    fn take_args(&mut self) -> PgArguments {
        self.args
            .take()
            .expect("BUG: it is allowed to build sqlx query only once")
    }
}
