use anyhow::Result;
use chrono::NaiveDate;

use crate::{crawler, database::table::institutional::Institutional, logging};

/// 回補指定日期上市與上櫃的三大法人買賣超
pub async fn execute(date: NaiveDate) -> Result<usize> {
    let (twse, tpex) = tokio::join!(
        crawler::twse::institutional::visit(date),
        crawler::tpex::institutional::visit(date)
    );

    let mut rows = Vec::with_capacity(4096);
    for result in [twse, tpex] {
        match result {
            Ok(mut r) => rows.append(&mut r),
            Err(why) => {
                logging::error_file_async(format!("三大法人買賣超抓取失敗 ({:?})", why));
            }
        }
    }

    if rows.is_empty() {
        logging::info_file_async(format!("{} 沒有三大法人買賣超可回補", date));
        return Ok(0);
    }

    Institutional::delete_by_date(date).await?;
    let count = Institutional::copy_in_raw(&rows).await?;

    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn execute_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 backfill::institutional::execute".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match execute(date).await {
            Ok(count) => {
                logging::debug_file_async(format!("count:{}", count));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to execute because {:?}", why));
            }
        }
        logging::debug_file_async("結束 backfill::institutional::execute".to_string());
    }
}
