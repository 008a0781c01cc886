use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::Local;

use crate::{
    config::SETTINGS,
    database::table::stock::Stock,
    declare::StockExchange,
    logging,
    util::text::{is_security_code, split_csv_line},
};

/// 從股票清單 CSV（代號,名稱,市場別）匯入股票主檔，
/// 檔案不存在時視為尚未準備清單，不視為錯誤
pub async fn execute() -> Result<usize> {
    let path = Path::new(&SETTINGS.paths.stock_list);
    if !path.exists() {
        logging::info_file_async(format!("找不到股票清單 {:?}，略過匯入", path));
        return Ok(0);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("讀取股票清單失敗 {:?}", path))?;
    let stocks = parse(&content);

    let mut count = 0;
    for stock in stocks {
        match stock.upsert().await {
            Ok(_) => count += 1,
            Err(why) => {
                logging::error_file_async(format!(
                    "股票主檔寫入失敗 stock_symbol:{} ({:?})",
                    stock.stock_symbol, why
                ));
            }
        }
    }

    Ok(count)
}

fn parse(content: &str) -> Vec<Stock> {
    let mut result = Vec::with_capacity(2048);

    for line in content.lines() {
        let fields = split_csv_line(line);
        if fields.len() < 3 || !is_security_code(&fields[0]) {
            continue;
        }

        let exchange = match fields[2].trim() {
            "上櫃" | "tpex" | "TPEx" | "2" => StockExchange::TPEx,
            _ => StockExchange::TWSE,
        };

        result.push(Stock {
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            exchange_id: exchange.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = r#"代號,名稱,市場別
2330,台積電,上市
8069,元太,上櫃
,缺代號,上市
"#;

    #[test]
    fn parse_should_work() {
        let stocks = parse(CSV);
        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].stock_symbol, "2330");
        assert_eq!(stocks[0].exchange_id, StockExchange::TWSE.serial_number());
        assert_eq!(stocks[1].exchange_id, StockExchange::TPEx.serial_number());
    }

    #[tokio::test]
    #[ignore]
    async fn execute_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 backfill::stock_list::execute".to_string());
        match execute().await {
            Ok(count) => {
                logging::debug_file_async(format!("count:{}", count));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to execute because {:?}", why));
            }
        }
        logging::debug_file_async("結束 backfill::stock_list::execute".to_string());
    }
}
