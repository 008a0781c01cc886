use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use sqlx::postgres::PgQueryResult;

use crate::{database, util::map::Keyable};

/// 季度財務報表
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct FinancialStatement {
    /// 年度
    pub year: i32,
    /// 季度 Q1 Q2 Q3 Q4
    pub quarter: String,
    pub stock_symbol: String,
    /// 營業收入（仟元）
    pub revenue: Decimal,
    /// 營業利益（仟元）
    pub operating_income: Decimal,
    /// 稅後淨利（仟元）
    pub net_income: Decimal,
    /// 每股盈餘（元）
    pub earnings_per_share: Decimal,
    pub created_time: DateTime<Local>,
    pub updated_time: DateTime<Local>,
}

impl Keyable for FinancialStatement {
    fn key(&self) -> String {
        format!("{}-{}-{}", self.stock_symbol, self.year, self.quarter)
    }

    fn key_with_prefix(&self) -> String {
        format!("FinancialStatement:{}", self.key())
    }
}

impl FinancialStatement {
    pub fn new(stock_symbol: String, year: i32, quarter: String) -> Self {
        FinancialStatement {
            year,
            quarter,
            stock_symbol,
            created_time: Local::now(),
            updated_time: Local::now(),
            ..Default::default()
        }
    }

    /// 新增或更新季度財報
    ///
    /// # Errors
    /// 當 SQL 執行失敗時回傳錯誤。
    pub async fn upsert(&self) -> Result<PgQueryResult> {
        let sql = r#"
INSERT INTO financial_statement (
    year, quarter, stock_symbol, revenue, operating_income, net_income,
    earnings_per_share, created_time, updated_time)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT (stock_symbol, year, quarter) DO UPDATE SET
    revenue = EXCLUDED.revenue,
    operating_income = EXCLUDED.operating_income,
    net_income = EXCLUDED.net_income,
    earnings_per_share = EXCLUDED.earnings_per_share,
    updated_time = EXCLUDED.updated_time;
"#;
        sqlx::query(sql)
            .bind(self.year)
            .bind(&self.quarter)
            .bind(&self.stock_symbol)
            .bind(self.revenue)
            .bind(self.operating_income)
            .bind(self.net_income)
            .bind(self.earnings_per_share)
            .bind(self.created_time)
            .bind(self.updated_time)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to FinancialStatement::upsert({:#?}) from database",
                self
            ))
    }

    /// 檢查指定年度與季度是否已有財報資料
    pub async fn exists(year: i32, quarter: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"SELECT EXISTS(SELECT 1 FROM financial_statement WHERE year = $1 AND quarter = $2);"#,
        )
        .bind(year)
        .bind(quarter)
        .fetch_one(database::get_connection())
        .await
        .context(format!(
            "Failed to FinancialStatement::exists({}, {}) from database",
            year, quarter
        ))?;

        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyable() {
        let fs = FinancialStatement::new("2330".to_string(), 2025, "Q1".to_string());
        assert_eq!(fs.key(), "2330-2025-Q1");
        assert_eq!(fs.key_with_prefix(), "FinancialStatement:2330-2025-Q1");
    }
}
