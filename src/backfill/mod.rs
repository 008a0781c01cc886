//! 回補：把各來源抓回來的資料整理後寫入資料庫

/// 信用交易餘額
pub mod credit;
/// 綜合損益表
pub mod financial_statement;
/// 三大法人買賣超
pub mod institutional;
/// 新聞
pub mod news;
/// 每日收盤行情
pub mod quote;
/// 股票主檔
pub mod stock_list;
/// 融券借券賣出餘額
pub mod ticket;
/// 估值（殖利率、本益比、股價淨值比）
pub mod valuation;
