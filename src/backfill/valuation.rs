use anyhow::Result;
use chrono::NaiveDate;

use crate::{crawler, database::table::valuation::Valuation, logging};

/// 回補指定日期上市與上櫃的估值指標（殖利率、本益比、股價淨值比）
pub async fn execute(date: NaiveDate) -> Result<usize> {
    let (twse, tpex) = tokio::join!(
        crawler::twse::valuation::visit(date),
        crawler::tpex::valuation::visit(date)
    );

    let mut rows = Vec::with_capacity(4096);
    for result in [twse, tpex] {
        match result {
            Ok(mut r) => rows.append(&mut r),
            Err(why) => {
                logging::error_file_async(format!("估值指標抓取失敗 ({:?})", why));
            }
        }
    }

    if rows.is_empty() {
        logging::info_file_async(format!("{} 沒有估值指標可回補", date));
        return Ok(0);
    }

    Valuation::delete_by_date(date).await?;
    let count = Valuation::copy_in_raw(&rows).await?;

    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn execute_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 backfill::valuation::execute".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match execute(date).await {
            Ok(count) => {
                logging::debug_file_async(format!("count:{}", count));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to execute because {:?}", why));
            }
        }
        logging::debug_file_async("結束 backfill::valuation::execute".to_string());
    }
}
