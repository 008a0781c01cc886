use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use sqlx::postgres::PgQueryResult;

use crate::{
    database::{self, CopyIn},
    util::map::Keyable,
};

/// 三大法人買賣超（股數）
#[derive(sqlx::FromRow, Default, Debug, Clone)]
pub struct Institutional {
    pub date: NaiveDate,
    pub stock_symbol: String,
    pub name: String,
    /// 外資及陸資買進股數
    pub foreign_buy: i64,
    /// 外資及陸資賣出股數
    pub foreign_sell: i64,
    /// 外資及陸資買賣超股數
    pub foreign_net: i64,
    /// 投信買進股數
    pub trust_buy: i64,
    /// 投信賣出股數
    pub trust_sell: i64,
    /// 投信買賣超股數
    pub trust_net: i64,
    /// 自營商買賣超股數
    pub dealer_net: i64,
    /// 三大法人買賣超股數
    pub total_net: i64,
    /// 交易所代碼 1:上市 2:上櫃
    pub exchange_id: i32,
    pub create_time: DateTime<Local>,
}

impl Keyable for Institutional {
    fn key(&self) -> String {
        format!("{}-{}", self.stock_symbol, self.date.format("%Y%m%d"))
    }

    fn key_with_prefix(&self) -> String {
        format!("Institutional:{}", self.key())
    }
}

impl CopyIn for Institutional {
    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}\n",
            self.date.format("%Y-%m-%d"),
            self.stock_symbol,
            self.name.replace(',', ""),
            self.foreign_buy,
            self.foreign_sell,
            self.foreign_net,
            self.trust_buy,
            self.trust_sell,
            self.trust_net,
            self.dealer_net,
            self.total_net,
            self.exchange_id
        )
    }
}

impl Institutional {
    pub fn new(stock_symbol: String) -> Self {
        Institutional {
            stock_symbol,
            create_time: Local::now(),
            ..Default::default()
        }
    }

    /// 以 `COPY FROM STDIN` 批次寫入三大法人買賣超
    pub async fn copy_in_raw(items: &[Institutional]) -> Result<u64> {
        let sql = r#"
COPY institutional(
    date, stock_symbol, name, foreign_buy, foreign_sell, foreign_net,
    trust_buy, trust_sell, trust_net, dealer_net, total_net, exchange_id
) FROM STDIN WITH (FORMAT CSV)
"#;
        database::copy_in_raw(sql, items).await
    }

    /// 刪除指定日期的法人資料，重跑同一天時先清掉舊資料
    pub async fn delete_by_date(date: NaiveDate) -> Result<PgQueryResult> {
        sqlx::query(r#"DELETE FROM institutional WHERE date = $1;"#)
            .bind(date)
            .execute(database::get_connection())
            .await
            .context(format!(
                "Failed to Institutional::delete_by_date({}) from database",
                date
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_csv() {
        let mut item = Institutional::new("2330".to_string());
        item.date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        item.name = "台積電".to_string();
        item.foreign_buy = 1000;
        item.foreign_sell = 400;
        item.foreign_net = 600;
        item.total_net = 600;
        item.exchange_id = 1;

        assert_eq!(
            item.to_csv(),
            "2025-05-08,2330,台積電,1000,400,600,0,0,0,0,600,1\n"
        );
    }
}
