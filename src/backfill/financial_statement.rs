use anyhow::Result;

use crate::{
    crawler,
    database::table::financial_statement::FinancialStatement,
    declare::Quarter,
    logging,
};

/// 回補指定年度與季度的綜合損益表，同一季已入庫就不再重抓
pub async fn execute(year: i32, quarter: Quarter) -> Result<usize> {
    if FinancialStatement::exists(year, quarter.name()).await? {
        logging::info_file_async(format!("{} {} 的財報已入庫，略過", year, quarter.name()));
        return Ok(0);
    }

    let statements = crawler::mops::financial_statement::visit(year, quarter).await?;
    if statements.is_empty() {
        logging::info_file_async(format!("{} {} 尚未公布財報", year, quarter.name()));
        return Ok(0);
    }

    let mut count = 0;
    for statement in statements {
        match statement.upsert().await {
            Ok(_) => count += 1,
            Err(why) => {
                logging::error_file_async(format!(
                    "財報寫入失敗 stock_symbol:{} ({:?})",
                    statement.stock_symbol, why
                ));
            }
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn execute_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 backfill::financial_statement::execute".to_string());
        match execute(2024, Quarter::Q4).await {
            Ok(count) => {
                logging::debug_file_async(format!("count:{}", count));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to execute because {:?}", why));
            }
        }
        logging::debug_file_async("結束 backfill::financial_statement::execute".to_string());
    }
}
