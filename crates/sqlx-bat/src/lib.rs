//! Conversions between application values and their database representation
//! plus a thin bridge from [`sea_query`] statements to [`sqlx`] queries.

mod conv;
mod error;
mod sea_query_ext;

pub use conv::*;
pub use error::*;
pub use sea_query_ext::*;

pub mod prelude {
    pub use crate::{
        DbRepresentable as _, SqlxBinderExt as _, TryFromDb as _, TryIntoApp as _,
        TryIntoDb as _,
    };
}
