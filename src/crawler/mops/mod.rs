/// 綜合損益彙總表
pub mod financial_statement;

pub const HOST: &str = "mops.twse.com.tw";
