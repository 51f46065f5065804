use crate::{Direction, Error, Result};
use std::any::type_name;
use std::fmt;
use std::num::TryFromIntError;
use teloxide::types::UserId;

/// A type that has a database representation specified in [`DbRepresentable::DbRepr`]
pub trait DbRepresentable: fmt::Debug + Sized + Send + Sync + 'static {
    type DbRepr: fmt::Debug + Sized + Send + Sync + 'static;
}

/// A type that can't be losslessly converted to its database repr.
pub trait TryIntoDb: DbRepresentable {
    fn try_into_db(self) -> Result<Self::DbRepr>;
}

/// A type that can't be losslessly converted from its database repr.
pub trait TryFromDb: DbRepresentable {
    fn try_from_db(val: Self::DbRepr) -> Result<Self>;
}

/// Mirror side of [`TryFromDb`], so that the conversion can be chained
/// right after fetching a row. Implemented automatically.
pub trait TryIntoApp<A> {
    fn try_into_app(self) -> Result<A>;
}

/// Implement this to get [`TryIntoDb`] with the error wrapped into [`Error`].
pub trait TryIntoDbImp: DbRepresentable {
    type Err: std::error::Error + Send + Sync + 'static;

    fn try_into_db_imp(self) -> std::result::Result<Self::DbRepr, Self::Err>;
}

/// Implement this to get [`TryFromDb`] with the error wrapped into [`Error`].
pub trait TryFromDbImp: DbRepresentable {
    type Err: std::error::Error + Send + Sync + 'static;

    fn try_from_db_imp(db_val: Self::DbRepr) -> std::result::Result<Self, Self::Err>;
}

impl<A: TryFromDb> TryIntoApp<A> for A::DbRepr {
    fn try_into_app(self) -> Result<A> {
        A::try_from_db(self)
    }
}

impl<A: TryIntoDbImp> TryIntoDb for A {
    fn try_into_db(self) -> Result<Self::DbRepr> {
        let value = format!("{self:?}");
        self.try_into_db_imp().map_err(|source| Error {
            direction: Direction::AppToDb,
            app_ty: type_name::<Self>(),
            db_ty: type_name::<Self::DbRepr>(),
            value,
            source: Box::new(source),
        })
    }
}

impl<A: TryFromDbImp> TryFromDb for A {
    fn try_from_db(db_val: Self::DbRepr) -> Result<Self> {
        let value = format!("{db_val:?}");
        Self::try_from_db_imp(db_val).map_err(|source| Error {
            direction: Direction::DbToApp,
            app_ty: type_name::<Self>(),
            db_ty: type_name::<Self::DbRepr>(),
            value,
            source: Box::new(source),
        })
    }
}

impl<T: DbRepresentable> DbRepresentable for Option<T> {
    type DbRepr = Option<T::DbRepr>;
}

impl<T: TryFromDb> TryFromDb for Option<T> {
    fn try_from_db(val: Self::DbRepr) -> Result<Self> {
        val.map(T::try_from_db).transpose()
    }
}

/// Implements the conversion traits for a type that already has std
/// [`TryFrom`] and [`TryInto`] impls for its database repr.
#[macro_export]
macro_rules! impl_try_into_from_db_via_std {
    ($app_ty:ty, $db_ty:ty) => {
        impl $crate::DbRepresentable for $app_ty {
            type DbRepr = $db_ty;
        }

        impl $crate::TryIntoDbImp for $app_ty {
            type Err = <Self as ::std::convert::TryInto<$db_ty>>::Error;

            fn try_into_db_imp(self) -> ::std::result::Result<$db_ty, Self::Err> {
                ::std::convert::TryInto::try_into(self)
            }
        }

        impl $crate::TryFromDbImp for $app_ty {
            type Err = <Self as ::std::convert::TryFrom<$db_ty>>::Error;

            fn try_from_db_imp(db_val: $db_ty) -> ::std::result::Result<Self, Self::Err> {
                <Self as ::std::convert::TryFrom<$db_ty>>::try_from(db_val)
            }
        }
    };
}

// Postgres has no unsigned integers, counters are stored as `bigint`
impl_try_into_from_db_via_std!(u64, i64);

impl DbRepresentable for UserId {
    type DbRepr = i64;
}

impl TryIntoDbImp for UserId {
    type Err = TryFromIntError;

    fn try_into_db_imp(self) -> std::result::Result<i64, TryFromIntError> {
        i64::try_from(self.0)
    }
}

impl TryFromDbImp for UserId {
    type Err = TryFromIntError;

    fn try_from_db_imp(db_val: i64) -> std::result::Result<Self, TryFromIntError> {
        u64::try_from(db_val).map(UserId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_round_trips_through_bigint() {
        let db = UserId(42).try_into_db().unwrap();
        assert_eq!(db, 42_i64);
        assert_eq!(db.try_into_app().ok(), Some(UserId(42)));
    }

    #[test]
    fn negative_bigint_is_not_a_user_id() {
        let err = TryIntoApp::<UserId>::try_into_app(-1_i64).unwrap_err();
        assert_eq!(err.direction, Direction::DbToApp);
        assert_eq!(err.value, "-1");
    }

    #[test]
    fn nullable_columns_map_to_options() {
        let none: Option<u64> = None::<i64>.try_into_app().unwrap();
        assert_eq!(none, None);

        let some: Option<u64> = Some(7_i64).try_into_app().unwrap();
        assert_eq!(some, Some(7));
    }
}
