use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    config::SETTINGS,
    database::table::daily_quote::DailyQuote,
    declare::StockExchange,
    logging, util,
    util::{
        datetime::to_roc_date,
        text::{is_security_code, parse_decimal, split_csv_line},
    },
};

/// 抓取上櫃「每日收盤行情」，查詢參數為民國日期
pub async fn visit(date: NaiveDate) -> Result<Vec<DailyQuote>> {
    let url = SETTINGS.tpex.url_template.replace("{date}", &to_roc_date(date));
    let text = util::http::get_use_big5(&url).await?;

    // 休市日回應只有標頭沒有個股列
    if text.len() < 200 || text.contains("共0筆") {
        logging::info_file_async(format!("{} 上櫃無收盤行情（休市）", date));
        return Ok(Vec::new());
    }

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("tpex");
    let file_name = format!("quote_{}.csv", date.format("%Y%m%d"));
    if let Err(why) = util::save_raw(&raw_dir, &file_name, &text) {
        logging::warn_file_async(format!("保存上櫃收盤行情原始檔失敗 ({:?})", why));
    }

    Ok(parse(&text, date))
}

/// 上櫃收盤行情 CSV 的欄位：
/// 0:代號 1:名稱 2:收盤 3:漲跌 4:開盤 5:最高 6:最低 7:均價
/// 8:成交股數 9:成交金額(元) 10:成交筆數
fn parse(text: &str, date: NaiveDate) -> Vec<DailyQuote> {
    let mut quotes = Vec::with_capacity(2048);

    for line in text.lines() {
        let fields = split_csv_line(line);
        if fields.len() < 11 || !is_security_code(&fields[0]) {
            continue;
        }

        let opening_price = parse_decimal(&fields[4], None).unwrap_or_default();
        let highest_price = parse_decimal(&fields[5], None).unwrap_or_default();
        let lowest_price = parse_decimal(&fields[6], None).unwrap_or_default();
        let closing_price = parse_decimal(&fields[2], None).unwrap_or_default();
        if opening_price.is_zero()
            && highest_price.is_zero()
            && lowest_price.is_zero()
            && closing_price.is_zero()
        {
            continue;
        }

        quotes.push(DailyQuote {
            date,
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            opening_price,
            highest_price,
            lowest_price,
            closing_price,
            change: parse_decimal(&fields[3], None).unwrap_or_default(),
            change_range: Decimal::ZERO,
            trading_volume: parse_decimal(&fields[8], None).unwrap_or_default(),
            trade_value: parse_decimal(&fields[9], None).unwrap_or_default(),
            transaction: parse_decimal(&fields[10], None).unwrap_or_default(),
            exchange_id: StockExchange::TPEx.serial_number(),
            create_time: Local::now(),
        });
    }

    quotes
}
