use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use sqlx::postgres::PgQueryResult;

use crate::{database, util::map::Keyable};

/// 股票主檔
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct Stock {
    pub stock_symbol: String,
    pub name: String,
    /// 交易所代碼 1:上市 2:上櫃
    pub exchange_id: i32,
    pub create_time: DateTime<Local>,
}

impl Keyable for Stock {
    fn key(&self) -> String {
        self.stock_symbol.clone()
    }

    fn key_with_prefix(&self) -> String {
        format!("Stock:{}", self.key())
    }
}

impl Stock {
    pub fn new(stock_symbol: String) -> Self {
        Stock {
            stock_symbol,
            create_time: Local::now(),
            ..Default::default()
        }
    }

    /// 取出全部股票主檔
    pub async fn fetch() -> Result<Vec<Stock>> {
        let sql = r#"
SELECT stock_symbol, name, exchange_id, create_time
FROM stock
ORDER BY stock_symbol;
"#;
        sqlx::query_as::<_, Stock>(sql)
            .fetch_all(database::get_connection())
            .await
            .context("Failed to Stock::fetch from database")
    }

    /// 新增或更新股票主檔
    ///
    /// # Errors
    /// 當 SQL 執行失敗時回傳錯誤。
    pub async fn upsert(&self) -> Result<PgQueryResult> {
        let sql = r#"
INSERT INTO stock (stock_symbol, name, exchange_id, create_time)
VALUES ($1, $2, $3, $4)
ON CONFLICT (stock_symbol)
DO UPDATE SET
    name = CASE WHEN excluded.name <> '' THEN excluded.name ELSE stock.name END,
    exchange_id = CASE WHEN excluded.exchange_id <> 0 THEN excluded.exchange_id ELSE stock.exchange_id END;
"#;
        sqlx::query(sql)
            .bind(&self.stock_symbol)
            .bind(&self.name)
            .bind(self.exchange_id)
            .bind(self.create_time)
            .execute(database::get_connection())
            .await
            .context(format!("Failed to Stock::upsert({:#?}) from database", self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyable() {
        let stock = Stock::new("2330".to_string());
        assert_eq!(stock.key(), "2330");
        assert_eq!(stock.key_with_prefix(), "Stock:2330");
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch() {
        dotenv::dotenv().ok();
        match Stock::fetch().await {
            Ok(stocks) => {
                dbg!(stocks.len());
            }
            Err(why) => {
                crate::logging::debug_file_async(format!("Failed to fetch because {:?}", why));
            }
        }
    }
}
