use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    cache::{TtlCacheInner, SHARE, TTL},
    config::SETTINGS,
    crawler,
    database::{
        table::{config, daily_quote::DailyQuote, stock::Stock},
        CopyIn,
    },
    logging, util,
    util::map::Keyable,
};

/// 回補指定日期上市與上櫃的收盤行情，
/// 寫入後同步更新最後交易日快取並輸出個股歷史價格檔
pub async fn execute(date: NaiveDate) -> Result<usize> {
    let (twse, tpex) = tokio::join!(
        crawler::twse::quote::visit(date),
        crawler::tpex::quote::visit(date)
    );

    let mut quotes = Vec::with_capacity(4096);
    for result in [twse, tpex] {
        match result {
            Ok(mut q) => quotes.append(&mut q),
            Err(why) => {
                logging::error_file_async(format!("收盤行情抓取失敗 ({:?})", why));
            }
        }
    }

    // 同一天已處理過的個股不再重複寫入
    quotes.retain(|quote| !TTL.daily_quote_contains_key(&quote.key_with_prefix()));
    if quotes.is_empty() {
        logging::info_file_async(format!("{} 沒有收盤行情可回補（非交易日或已回補）", date));
        return Ok(0);
    }

    fill_change_range(&mut quotes).await;
    register_new_stocks(&quotes).await;

    // 同一天先前可能已寫入部分交易所的行情（另一邊抓取失敗時），
    // 只刪除這次要重寫的股票，避免把已入庫的資料一併清掉
    let symbols: Vec<String> = quotes.iter().map(|q| q.stock_symbol.clone()).collect();
    DailyQuote::delete_by_date_and_symbols(date, &symbols).await?;
    let count = DailyQuote::copy_in_raw(&quotes).await?;

    if let Err(why) = export_processed_csv(date, &quotes) {
        logging::warn_file_async(format!("輸出整理後的收盤行情檔失敗 ({:?})", why));
    }

    for quote in quotes.iter() {
        TTL.daily_quote_set(quote.key_with_prefix(), String::new());
        SHARE.set_stock_last_price(quote).await;
        if let Err(why) = export_price_csv(quote) {
            logging::warn_file_async(format!(
                "輸出個股價格檔失敗 stock_symbol:{} ({:?})",
                quote.stock_symbol, why
            ));
        }
    }

    if let Err(why) = config::Config::new(
        "last-closing-day".to_string(),
        date.format("%Y-%m-%d").to_string(),
    )
    .set_val_as_naive_date()
    .await
    {
        logging::error_file_async(format!("更新最後交易日設定失敗 ({:?})", why));
    }

    Ok(count as usize)
}

/// 以最後交易日的收盤價計算漲幅（%）
async fn fill_change_range(quotes: &mut [DailyQuote]) {
    for quote in quotes.iter_mut() {
        let last = match SHARE.get_last_trading_day_quotes(&quote.stock_symbol).await {
            Some(last) => last,
            None => continue,
        };
        if last.closing_price.is_zero() || last.date >= quote.date {
            continue;
        }

        quote.change_range = ((quote.closing_price - last.closing_price) / last.closing_price
            * Decimal::ONE_HUNDRED)
            .round_dp(2);
    }
}

/// 行情裡出現但主檔沒有的股票（新上市櫃）順手補進主檔
async fn register_new_stocks(quotes: &[DailyQuote]) {
    for quote in quotes {
        if SHARE.stock_contains_key(&quote.stock_symbol) {
            continue;
        }

        let stock = Stock {
            stock_symbol: quote.stock_symbol.clone(),
            name: quote.name.clone(),
            exchange_id: quote.exchange_id,
            create_time: Local::now(),
        };
        match stock.upsert().await {
            Ok(_) => SHARE.insert_stock(&stock),
            Err(why) => {
                logging::error_file_async(format!(
                    "股票主檔寫入失敗 stock_symbol:{} ({:?})",
                    stock.stock_symbol, why
                ));
            }
        }
    }
}

/// 把整理後的全市場收盤行情輸出到 `paths.processed_data`
fn export_processed_csv(date: NaiveDate, quotes: &[DailyQuote]) -> Result<()> {
    let mut content = String::with_capacity(quotes.len() * 64);
    content.push_str(
        "date,stock_symbol,name,open,high,low,close,change,change_range,volume,value,transaction,exchange_id\n",
    );
    for quote in quotes {
        content.push_str(&quote.to_csv());
    }

    util::save_raw(
        Path::new(&SETTINGS.paths.processed_data),
        &format!("quotes_{}.csv", date.format("%Y%m%d")),
        &content,
    )?;

    Ok(())
}

/// 追加一列到 `paths.price_data/{代號}.csv`，供指標計算之外的離線分析使用
fn export_price_csv(quote: &DailyQuote) -> Result<()> {
    util::append_line(
        Path::new(&SETTINGS.paths.price_data),
        &format!("{}.csv", quote.stock_symbol),
        "date,open,high,low,close,volume",
        &format!(
            "{},{},{},{},{},{}",
            quote.date.format("%Y-%m-%d"),
            quote.opening_price,
            quote.highest_price,
            quote.lowest_price,
            quote.closing_price,
            quote.trading_volume
        ),
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn fill_change_range_should_work() {
        let today = Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap();

        let mut last = DailyQuote::new("2330".to_string());
        last.date = yesterday;
        last.closing_price = dec!(900);
        SHARE.set_stock_last_price(&last).await;

        let mut quote = DailyQuote::new("2330".to_string());
        quote.date = today;
        quote.closing_price = dec!(941);

        let mut quotes = vec![quote];
        fill_change_range(&mut quotes).await;
        assert_eq!(quotes[0].change_range, dec!(4.56));
    }

    #[tokio::test]
    #[ignore]
    async fn execute_should_work() {
        dotenv::dotenv().ok();
        SHARE.load().await;
        logging::debug_file_async("開始 backfill::quote::execute".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match execute(date).await {
            Ok(count) => {
                logging::debug_file_async(format!("count:{}", count));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to execute because {:?}", why));
            }
        }
        logging::debug_file_async("結束 backfill::quote::execute".to_string());
    }
}
