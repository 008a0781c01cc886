use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};

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

pub const HOST: &str = "www.twse.com.tw";

pub(super) fn build_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    if let Ok(referer) = HeaderValue::from_str(&format!("https://{}/zh/", HOST)) {
        headers.insert(REFERER, referer);
    }
    headers
}
