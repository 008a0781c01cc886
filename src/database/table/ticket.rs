use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use sqlx::postgres::PgQueryResult;

use crate::{
    database::{self, CopyIn},
    util::map::Keyable,
};

/// 融券與借券賣出餘額（股）
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct Ticket {
    pub date: NaiveDate,
    pub stock_symbol: String,
    pub name: String,
    /// 融券今日餘額
    pub short_sale_balance: i64,
    /// 借券賣出當日餘額
    pub borrow_balance: i64,
    /// 交易所代碼 1:上市 2:上櫃
    pub exchange_id: i32,
    pub create_time: DateTime<Local>,
}

impl Keyable for Ticket {
    fn key(&self) -> String {
        format!("{}-{}", self.stock_symbol, self.date.format("%Y%m%d"))
    }

    fn key_with_prefix(&self) -> String {
        format!("Ticket:{}", self.key())
    }
}

impl CopyIn for Ticket {
    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{}\n",
            self.date.format("%Y-%m-%d"),
            self.stock_symbol,
            self.name.replace(',', ""),
            self.short_sale_balance,
            self.borrow_balance,
            self.exchange_id
        )
    }
}

impl Ticket {
    pub fn new(stock_symbol: String) -> Self {
        Ticket {
            stock_symbol,
            create_time: Local::now(),
            ..Default::default()
        }
    }

    /// 以 `COPY FROM STDIN` 批次寫入融券借券餘額
    pub async fn copy_in_raw(items: &[Ticket]) -> Result<u64> {
        let sql = r#"
COPY ticket(
    date, stock_symbol, name, short_sale_balance, borrow_balance, exchange_id
) FROM STDIN WITH (FORMAT CSV)
"#;
        database::copy_in_raw(sql, items).await
    }

    /// 刪除指定日期的融券借券資料
    pub async fn delete_by_date(date: NaiveDate) -> Result<PgQueryResult> {
        sqlx::query(r#"DELETE FROM ticket WHERE date = $1;"#)
            .bind(date)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to Ticket::delete_by_date({}) from database",
                date
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_csv() {
        let mut item = Ticket::new("2330".to_string());
        item.date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        item.name = "台積電".to_string();
        item.short_sale_balance = 542_000;
        item.borrow_balance = 12_731_000;
        item.exchange_id = 1;

        assert_eq!(item.to_csv(), "2025-05-08,2330,台積電,542000,12731000,1\n");
    }
}
