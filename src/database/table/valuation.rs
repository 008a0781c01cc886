use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use sqlx::postgres::PgQueryResult;

use crate::{
    database::{self, CopyIn},
    util::map::Keyable,
};

/// 個股估值：殖利率、本益比、股價淨值比
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct Valuation {
    pub date: NaiveDate,
    pub stock_symbol: String,
    pub name: String,
    /// 殖利率(%)
    pub dividend_yield: Decimal,
    /// 本益比
    pub price_earning_ratio: Decimal,
    /// 股價淨值比
    pub price_book_ratio: Decimal,
    /// 交易所代碼 1:上市 2:上櫃
    pub exchange_id: i32,
    pub create_time: DateTime<Local>,
}

impl Keyable for Valuation {
    fn key(&self) -> String {
        format!("{}-{}", self.stock_symbol, self.date.format("%Y%m%d"))
    }

    fn key_with_prefix(&self) -> String {
        format!("Valuation:{}", self.key())
    }
}

impl CopyIn for Valuation {
    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}\n",
            self.date.format("%Y-%m-%d"),
            self.stock_symbol,
            self.name.replace(',', ""),
            self.dividend_yield,
            self.price_earning_ratio,
            self.price_book_ratio,
            self.exchange_id
        )
    }
}

impl Valuation {
    pub fn new(stock_symbol: String) -> Self {
        Valuation {
            stock_symbol,
            create_time: Local::now(),
            ..Default::default()
        }
    }

    /// 以 `COPY FROM STDIN` 批次寫入估值資料
    pub async fn copy_in_raw(items: &[Valuation]) -> Result<u64> {
        let sql = r#"
COPY valuation(
    date, stock_symbol, name, dividend_yield, price_earning_ratio,
    price_book_ratio, exchange_id
) FROM STDIN WITH (FORMAT CSV)
"#;
        database::copy_in_raw(sql, items).await
    }

    /// 刪除指定日期的估值資料
    pub async fn delete_by_date(date: NaiveDate) -> Result<PgQueryResult> {
        sqlx::query(r#"DELETE FROM valuation WHERE date = $1;"#)
            .bind(date)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to Valuation::delete_by_date({}) from database",
                date
            ))
    }
}
