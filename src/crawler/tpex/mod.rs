use chrono::NaiveDate;

use crate::util::datetime::to_roc_date;

/// 信用交易餘額
pub mod credit;
/// 三大法人買賣超
pub mod institutional;
/// 每日收盤行情
pub mod quote;
/// 融券借券賣出餘額
pub mod ticket;
/// 個股殖利率、本益比、股價淨值比
pub mod valuation;

pub const HOST: &str = "www.tpex.org.tw";

/// 櫃買中心的查詢參數使用民國日期，部分端點要再經過 URL encode
pub(super) fn roc_date_url_encoded(date: NaiveDate) -> String {
    urlencoding::encode(&to_roc_date(date)).into_owned()
}
