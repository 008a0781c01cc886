pub mod config;
pub mod credit;
pub mod daily_quote;
pub mod financial_statement;
pub mod indicator;
pub mod institutional;
pub mod news;
pub mod stock;
pub mod ticket;
pub mod valuation;
