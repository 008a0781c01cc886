use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use sqlx::postgres::PgQueryResult;

use crate::{database, util::map::Keyable};

/// 技術指標值：一檔股票在一個交易日的單一指標
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct Indicator {
    pub date: NaiveDate,
    pub stock_symbol: String,
    /// 指標名稱，如 rsi、macd_dif、kd_k
    pub name: String,
    pub value: Decimal,
    pub create_time: DateTime<Local>,
}

impl Keyable for Indicator {
    fn key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.stock_symbol,
            self.date.format("%Y%m%d"),
            self.name
        )
    }

    fn key_with_prefix(&self) -> String {
        format!("Indicator:{}", self.key())
    }
}

impl Indicator {
    pub fn new(stock_symbol: String, date: NaiveDate, name: String, value: Decimal) -> Self {
        Indicator {
            date,
            stock_symbol,
            name,
            value,
            create_time: Local::now(),
        }
    }

    /// 新增或更新指標值
    ///
    /// # Errors
    /// 當 SQL 執行失敗時回傳錯誤。
    pub async fn upsert(&self) -> Result<PgQueryResult> {
        let sql = r#"
INSERT INTO indicator (date, stock_symbol, name, value, create_time)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (stock_symbol, date, name)
DO UPDATE SET value = EXCLUDED.value;
"#;
        sqlx::query(sql)
            .bind(self.date)
            .bind(&self.stock_symbol)
            .bind(&self.name)
            .bind(self.value)
            .bind(self.create_time)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to Indicator::upsert({:#?}) from database",
                self
            ))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_keyable() {
        let indicator = Indicator::new(
            "2330".to_string(),
            NaiveDate::from_ymd_opt(2025, 5, 8).unwrap(),
            "rsi".to_string(),
            dec!(65.2),
        );
        assert_eq!(indicator.key(), "2330-20250508-rsi");
        assert_eq!(indicator.key_with_prefix(), "Indicator:2330-20250508-rsi");
    }
}
