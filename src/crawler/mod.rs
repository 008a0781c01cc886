/// 公開資訊觀測站
pub mod mops;
/// 新聞 RSS
pub mod rss;
/// 共用的表格解析
pub(crate) mod share;
/// 台灣證券櫃檯買賣中心
pub mod tpex;
/// 台灣證券交易所
pub mod twse;
