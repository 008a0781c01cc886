use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::postgres::PgQueryResult;

use crate::database;

/// 系統設定表 `config` 的資料列，記錄最後收盤日等鍵值。
#[derive(sqlx::FromRow, Default, Debug)]
pub struct Config {
    pub key: String,
    pub val: String,
}

impl Config {
    pub fn new(key: String, val: String) -> Self {
        Config { key, val }
    }

    /// 取得一筆指定 key 的 Entity
    pub async fn first(key: &str) -> Result<Config> {
        let sql = r#"
SELECT key, val
FROM config
WHERE key = $1;
"#;
        sqlx::query_as::<_, Config>(sql)
            .bind(key)
            .fetch_one(database::get_connection())
            .await
            .context(format!("Failed to Config::first({:?}) from database", key))
    }

    /// 新增或更新 `config` 的鍵值。
    ///
    /// # Errors
    /// 當 SQL 執行失敗時回傳錯誤。
    pub async fn upsert(&self) -> Result<PgQueryResult> {
        let sql = r#"
INSERT INTO config
    (key, val)
VALUES
    ($1, $2)
ON CONFLICT (key)
DO UPDATE SET val = excluded.val;"#;
        sqlx::query(sql)
            .bind(&self.key)
            .bind(&self.val)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to Config::upsert({:#?}) from database",
                self
            ))
    }

    /// 將 `val` 視為日期（`%Y-%m-%d`）並僅在新值較大時更新。
    ///
    /// 若資料庫已有同 `key` 設定且日期較新或相同，會回傳空的 `PgQueryResult` 表示略過更新。
    ///
    /// # Errors
    /// 當日期解析或 SQL 執行失敗時回傳錯誤。
    pub async fn set_val_as_naive_date(&self) -> Result<PgQueryResult> {
        let new_date = NaiveDate::parse_from_str(&self.val, "%Y-%m-%d")?;
        if let Ok(c) = Config::first(&self.key).await {
            let current_date = NaiveDate::parse_from_str(&c.val, "%Y-%m-%d")?;
            if new_date <= current_date {
                return Ok(PgQueryResult::default());
            }
        }

        self.upsert().await
    }
}
