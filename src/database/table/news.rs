use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use sqlx::postgres::PgQueryResult;

use crate::database;

/// 新聞（RSS 來源）
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct News {
    /// RSS 來源網址
    pub source: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: Option<DateTime<Local>>,
    pub create_time: DateTime<Local>,
}

impl News {
    /// 新增一筆新聞，同一連結只收錄一次
    ///
    /// # Errors
    /// 當 SQL 執行失敗時回傳錯誤。
    pub async fn upsert(&self) -> Result<PgQueryResult> {
        let sql = r#"
INSERT INTO news (source, title, description, link, pub_date, create_time)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (link) DO NOTHING;
"#;
        sqlx::query(sql)
            .bind(&self.source)
            .bind(&self.title)
            .bind(&self.description)
            .bind(&self.link)
            .bind(self.pub_date)
            .bind(self.create_time)
            .execute(database::get_connection())
            .await
            .context(format!("Failed to News::upsert({:#?}) from database", self))
    }
}
