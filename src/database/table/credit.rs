use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use sqlx::postgres::PgQueryResult;

use crate::{
    database::{self, CopyIn},
    util::map::Keyable,
};

/// 融資融券餘額（張）
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct Credit {
    pub date: NaiveDate,
    pub stock_symbol: String,
    pub name: String,
    /// 融資今日餘額
    pub margin_purchase_balance: i64,
    /// 融資前日餘額
    pub margin_purchase_balance_prev: i64,
    /// 融券今日餘額
    pub short_sale_balance: i64,
    /// 融券前日餘額
    pub short_sale_balance_prev: i64,
    /// 交易所代碼 1:上市 2:上櫃
    pub exchange_id: i32,
    pub create_time: DateTime<Local>,
}

impl Keyable for Credit {
    fn key(&self) -> String {
        format!("{}-{}", self.stock_symbol, self.date.format("%Y%m%d"))
    }

    fn key_with_prefix(&self) -> String {
        format!("Credit:{}", self.key())
    }
}

impl CopyIn for Credit {
    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}\n",
            self.date.format("%Y-%m-%d"),
            self.stock_symbol,
            self.name.replace(',', ""),
            self.margin_purchase_balance,
            self.margin_purchase_balance_prev,
            self.short_sale_balance,
            self.short_sale_balance_prev,
            self.exchange_id
        )
    }
}

impl Credit {
    pub fn new(stock_symbol: String) -> Self {
        Credit {
            stock_symbol,
            create_time: Local::now(),
            ..Default::default()
        }
    }

    /// 以 `COPY FROM STDIN` 批次寫入融資融券餘額
    pub async fn copy_in_raw(items: &[Credit]) -> Result<u64> {
        let sql = r#"
COPY credit(
    date, stock_symbol, name, margin_purchase_balance, margin_purchase_balance_prev,
    short_sale_balance, short_sale_balance_prev, exchange_id
) FROM STDIN WITH (FORMAT CSV)
"#;
        database::copy_in_raw(sql, items).await
    }

    /// 刪除指定日期的融資融券資料
    pub async fn delete_by_date(date: NaiveDate) -> Result<PgQueryResult> {
        sqlx::query(r#"DELETE FROM credit WHERE date = $1;"#)
            .bind(date)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to Credit::delete_by_date({}) from database",
                date
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_csv() {
        let mut item = Credit::new("2330".to_string());
        item.date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        item.name = "台積電".to_string();
        item.margin_purchase_balance = 12000;
        item.margin_purchase_balance_prev = 11800;
        item.short_sale_balance = 300;
        item.short_sale_balance_prev = 280;
        item.exchange_id = 1;

        assert_eq!(
            item.to_csv(),
            "2025-05-08,2330,台積電,12000,11800,300,280,1\n"
        );
    }
}
