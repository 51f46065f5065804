use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum DbError {
    #[error("Failed to connect to the database")]
    Connect { source: sqlx::Error },

    #[error("Failed to apply database migrations")]
    Migrate { source: sqlx::migrate::MigrateError },

    #[error(transparent)]
    Query {
        #[from]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Conversion {
        #[from]
        source: sqlx_bat::Error,
    },
}
