use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use sqlx::postgres::PgQueryResult;

use crate::{
    database::{self, CopyIn},
    util::map::Keyable,
};

/// 每日收盤行情
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct DailyQuote {
    pub date: NaiveDate,
    pub stock_symbol: String,
    pub name: String,
    /// 開盤價
    pub opening_price: Decimal,
    /// 最高價
    pub highest_price: Decimal,
    /// 最低價
    pub lowest_price: Decimal,
    /// 收盤價
    pub closing_price: Decimal,
    /// 漲跌價差
    pub change: Decimal,
    /// 漲幅 = (現價-上一個交易日收盤價) / 上一個交易日收盤價 * 100%
    pub change_range: Decimal,
    /// 成交股數
    pub trading_volume: Decimal,
    /// 成交金額
    pub trade_value: Decimal,
    /// 成交筆數
    pub transaction: Decimal,
    /// 交易所代碼 1:上市 2:上櫃
    pub exchange_id: i32,
    pub create_time: DateTime<Local>,
}

/// 計算技術指標所需的價格序列
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub closing_price: Decimal,
    pub highest_price: Decimal,
    pub lowest_price: Decimal,
}

impl Keyable for DailyQuote {
    fn key(&self) -> String {
        format!("{}-{}", self.stock_symbol, self.date.format("%Y%m%d"))
    }

    fn key_with_prefix(&self) -> String {
        format!("DailyQuote:{}", self.key())
    }
}

impl CopyIn for DailyQuote {
    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            self.date.format("%Y-%m-%d"),
            self.stock_symbol,
            self.name.replace(',', ""),
            self.opening_price,
            self.highest_price,
            self.lowest_price,
            self.closing_price,
            self.change,
            self.change_range,
            self.trading_volume,
            self.trade_value,
            self.transaction,
            self.exchange_id
        )
    }
}

impl DailyQuote {
    pub fn new(stock_symbol: String) -> Self {
        DailyQuote {
            stock_symbol,
            create_time: Local::now(),
            ..Default::default()
        }
    }

    /// 以 `COPY FROM STDIN` 批次寫入每日收盤行情
    ///
    /// # Errors
    /// 當 copy 流程失敗時回傳錯誤。
    pub async fn copy_in_raw(quotes: &[DailyQuote]) -> Result<u64> {
        let sql = r#"
COPY daily_quote(
    date, stock_symbol, name, opening_price, highest_price, lowest_price,
    closing_price, change, change_range, trading_volume, trade_value,
    "transaction", exchange_id
) FROM STDIN WITH (FORMAT CSV)
"#;
        database::copy_in_raw(sql, quotes).await
    }

    /// 刪除指定日期中特定股票的收盤行情，重寫入前先清掉舊列。
    /// 只清即將重寫的股票，同一天已入庫的其他股票不受影響。
    pub async fn delete_by_date_and_symbols(
        date: NaiveDate,
        stock_symbols: &[String],
    ) -> Result<PgQueryResult> {
        sqlx::query(r#"DELETE FROM daily_quote WHERE date = $1 AND stock_symbol = ANY($2);"#)
            .bind(date)
            .bind(stock_symbols)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to DailyQuote::delete_by_date_and_symbols({}) from database",
                date
            ))
    }

    /// 檢查指定日期是否已有收盤行情
    pub async fn exists(date: NaiveDate) -> Result<bool> {
        let row: (bool,) =
            sqlx::query_as(r#"SELECT EXISTS(SELECT 1 FROM daily_quote WHERE date = $1);"#)
                .bind(date)
                .fetch_one(database::get_connection())
                .await
                .context(format!(
                    "Failed to DailyQuote::exists({}) from database",
                    date
                ))?;

        Ok(row.0)
    }

    /// 取出指定股票由舊到新的價格序列，最多 `limit` 筆（取距今最近者）
    pub async fn fetch_price_series(stock_symbol: &str, limit: i64) -> Result<Vec<PriceRow>> {
        let sql = r#"
SELECT date, closing_price, highest_price, lowest_price
FROM (
    SELECT date, closing_price, highest_price, lowest_price
    FROM daily_quote
    WHERE stock_symbol = $1
    ORDER BY date DESC
    LIMIT $2
) AS recent
ORDER BY date ASC;
"#;
        sqlx::query_as::<_, PriceRow>(sql)
            .bind(stock_symbol)
            .bind(limit)
            .fetch_all(database::get_connection())
            .await
            .context(format!(
                "Failed to DailyQuote::fetch_price_series({}) from database",
                stock_symbol
            ))
    }

    /// 取出指定日期有收盤行情的股票代號
    pub async fn fetch_symbols(date: NaiveDate) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as(r#"SELECT stock_symbol FROM daily_quote WHERE date = $1;"#)
                .bind(date)
                .fetch_all(database::get_connection())
                .await
                .context(format!(
                    "Failed to DailyQuote::fetch_symbols({}) from database",
                    date
                ))?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// 取出每檔股票最後一個交易日的收盤行情
    pub async fn fetch_last_trading_day_quotes() -> Result<Vec<DailyQuote>> {
        let sql = r#"
SELECT DISTINCT ON (stock_symbol)
    date, stock_symbol, name, opening_price, highest_price, lowest_price,
    closing_price, change, change_range, trading_volume, trade_value,
    "transaction", exchange_id, create_time
FROM daily_quote
ORDER BY stock_symbol, date DESC;
"#;
        sqlx::query_as::<_, DailyQuote>(sql)
            .fetch_all(database::get_connection())
            .await
            .context("Failed to DailyQuote::fetch_last_trading_day_quotes from database")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_keyable() {
        let mut dq = DailyQuote::new("2330".to_string());
        dq.date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        assert_eq!(dq.key(), "2330-20250508");
        assert_eq!(dq.key_with_prefix(), "DailyQuote:2330-20250508");
    }

    #[tokio::test]
    #[ignore]
    async fn delete_by_date_and_symbols_should_keep_other_rows() {
        dotenv::dotenv().ok();
        let date = NaiveDate::from_ymd_opt(2099, 1, 4).unwrap();

        let mut twse = DailyQuote::new("2330".to_string());
        twse.date = date;
        twse.closing_price = dec!(940);
        twse.exchange_id = 1;

        let mut tpex = DailyQuote::new("5483".to_string());
        tpex.date = date;
        tpex.closing_price = dec!(150);
        tpex.exchange_id = 2;

        DailyQuote::copy_in_raw(&[twse, tpex]).await.unwrap();

        // 重寫上櫃時，先前已入庫的上市列必須保留
        DailyQuote::delete_by_date_and_symbols(date, &["5483".to_string()])
            .await
            .unwrap();

        let symbols = DailyQuote::fetch_symbols(date).await.unwrap();
        assert!(symbols.contains(&"2330".to_string()));
        assert!(!symbols.contains(&"5483".to_string()));

        // 還原測試資料
        DailyQuote::delete_by_date_and_symbols(date, &["2330".to_string()])
            .await
            .unwrap();
    }

    #[test]
    fn test_to_csv() {
        let mut dq = DailyQuote::new("2330".to_string());
        dq.date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        dq.name = "台積電".to_string();
        dq.opening_price = dec!(930);
        dq.highest_price = dec!(945);
        dq.lowest_price = dec!(925);
        dq.closing_price = dec!(940);
        dq.change = dec!(10);
        dq.trading_volume = dec!(33565668);
        dq.exchange_id = 1;

        let csv = dq.to_csv();
        assert!(csv.starts_with("2025-05-08,2330,台積電,930,945,925,940,10,0,33565668,"));
        assert!(csv.ends_with(",1\n"));
    }
}
