use chrono::{DateTime, Datelike, Local, NaiveDate, Weekday};

/// A trait representing the weekend concept.
pub trait Weekend {
    /// Returns `true` if the date falls on a Saturday or Sunday.
    fn is_weekend(&self) -> bool;
}

impl Weekend for DateTime<Local> {
    fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

impl Weekend for NaiveDate {
    fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

/// 西元年轉民國年
pub fn gregorian_year_to_roc_year(year: i32) -> i32 {
    year - 1911
}

/// 民國年轉西元年
pub fn roc_year_to_gregorian_year(year: i32) -> i32 {
    year + 1911
}

/// 將日期轉為民國日期字串（yyy/mm/dd），櫃買中心多數端點使用此格式
pub fn to_roc_date(date: NaiveDate) -> String {
    format!(
        "{}/{:02}/{:02}",
        gregorian_year_to_roc_year(date.year()),
        date.month(),
        date.day()
    )
}
