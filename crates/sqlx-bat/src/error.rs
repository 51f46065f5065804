use std::fmt;

pub(crate) type DynError = dyn std::error::Error + Send + Sync + 'static;
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which way the value was travelling when the conversion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AppToDb,
    DbToApp,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AppToDb => "app value into db repr",
            Self::DbToApp => "db value into app repr",
        })
    }
}

/// A value didn't fit into the representation on the other side of the
/// database boundary. This is almost always a bug or a corrupted row.
#[derive(Debug, thiserror::Error)]
#[error(
    "Failed to convert {direction}.\n\
    App type: {app_ty}\n\
    Db type: {db_ty}\n\
    Value: {value}"
)]
pub struct Error {
    pub direction: Direction,
    pub app_ty: &'static str,
    pub db_ty: &'static str,
    pub value: String,
    pub source: Box<DynError>,
}
