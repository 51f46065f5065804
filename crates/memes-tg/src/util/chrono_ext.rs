use chrono::prelude::*;
use easy_ext::ext;

#[ext(DateTimeExt)]
pub(crate) impl<Tz: chrono::TimeZone> DateTime<Tz> {
    /// Calendar day in `YYYY-MM-DD` format. Used as an idempotency key for
    /// the things that must happen at most once a day.
    fn to_day_key(&self) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        self.format("%Y-%m-%d").to_string()
    }
}
