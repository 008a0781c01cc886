use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::{cache::SHARE, util::datetime::Weekend};

pub mod backfill;
pub mod cache;
pub mod calculation;
pub mod config;
pub mod crawler;
pub mod database;
pub mod declare;
pub mod logging;
pub mod scheduler;
pub mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    SHARE.load().await;

    if let Err(why) = backfill::stock_list::execute().await {
        logging::error_file_async(format!("股票主檔匯入失敗 ({:?})", why));
    }

    match parse_args()? {
        Some((start, end)) => backfill_range(start, end).await?,
        None => {
            let mut sched = scheduler::start().await?;
            logging::info_console("排程執行中，按 Ctrl-C 結束".to_string());
            tokio::signal::ctrl_c().await?;
            sched.shutdown().await?;
            logging::info_file_async("收到中斷訊號，排程已停止".to_string());
        }
    }

    Ok(())
}

/// 解析 `--start YYYY-MM-DD [--end YYYY-MM-DD]`，
/// 沒有指定日期區間時以排程模式執行
fn parse_args() -> Result<Option<(NaiveDate, NaiveDate)>> {
    let args: Vec<String> = std::env::args().collect();
    let mut start = None;
    let mut end = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--start" | "--end" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("{} 需要日期參數（YYYYMMDD 或 YYYY-MM-DD）", args[i]))?;
                let date = parse_date_arg(value)?;
                if args[i] == "--start" {
                    start = Some(date);
                } else {
                    end = Some(date);
                }
                i += 2;
            }
            other => return Err(anyhow!("未知的參數 {}", other)),
        }
    }

    match (start, end) {
        (Some(s), e) => {
            let e = e.unwrap_or(s);
            if e < s {
                return Err(anyhow!("--end 不可早於 --start"));
            }
            Ok(Some((s, e)))
        }
        (None, Some(_)) => Err(anyhow!("--end 需搭配 --start 使用")),
        (None, None) => Ok(None),
    }
}

fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|why| anyhow!("無法解析日期 {}：{:?}", value, why))
}

/// 依日期區間逐日回補，已入庫的交易日不重抓
async fn backfill_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    let mut date = start;
    while date <= end {
        if date.is_weekend() {
            date = next_day(date)?;
            continue;
        }
        if database::table::daily_quote::DailyQuote::exists(date).await? {
            logging::info_file_async(format!("{} 已回補過，略過", date));
            date = next_day(date)?;
            continue;
        }

        logging::info_file_async(format!("開始回補 {}", date));
        let (quote, institutional, credit, ticket, valuation) = tokio::join!(
            backfill::quote::execute(date),
            backfill::institutional::execute(date),
            backfill::credit::execute(date),
            backfill::ticket::execute(date),
            backfill::valuation::execute(date)
        );
        for (name, result) in [
            ("收盤行情", quote),
            ("三大法人", institutional),
            ("融資融券", credit),
            ("融券借券", ticket),
            ("估值指標", valuation),
        ] {
            match result {
                Ok(count) => {
                    logging::info_file_async(format!("{} {} 回補完成 count:{}", date, name, count));
                }
                Err(why) => {
                    logging::error_file_async(format!("{} {} 回補失敗 ({:?})", date, name, why));
                }
            }
        }

        match calculation::execute(date).await {
            Ok(count) => {
                logging::info_file_async(format!("{} 技術指標計算完成 count:{}", date, count));
            }
            Err(why) => {
                logging::error_file_async(format!("{} 技術指標計算失敗 ({:?})", date, why));
            }
        }

        date = next_day(date)?;
    }

    Ok(())
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| anyhow!("日期超出範圍 {}", date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_day_should_work() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        assert_eq!(next_day(date).unwrap(), NaiveDate::from_ymd_opt(2025, 5, 9).unwrap());
    }

    #[test]
    fn parse_date_arg_accepts_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        assert_eq!(parse_date_arg("20250508").unwrap(), expected);
        assert_eq!(parse_date_arg("2025-05-08").unwrap(), expected);
        assert!(parse_date_arg("2025/05/08").is_err());
    }
}
