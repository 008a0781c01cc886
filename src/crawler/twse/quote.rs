use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    config::SETTINGS,
    database::table::daily_quote::DailyQuote,
    declare::StockExchange,
    logging, util,
    util::text::{is_security_code, parse_decimal, split_csv_line},
};

/// 抓取上市「每日收盤行情」，來源為 Big5 編碼的 CSV
pub async fn visit(date: NaiveDate) -> Result<Vec<DailyQuote>> {
    let date_str = date.format("%Y%m%d").to_string();
    let url = SETTINGS.twse.url_template.replace("{date}", &date_str);
    let text = util::http::get_use_big5(&url).await?;

    // 休市日回應只有一行訊息，內容很短
    if text.len() < 200 || text.contains("很抱歉，沒有符合條件的資料") {
        logging::info_file_async(format!("{} 上市無收盤行情（休市）", date));
        return Ok(Vec::new());
    }

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("twse");
    if let Err(why) = util::save_raw(&raw_dir, &format!("quote_{}.csv", date_str), &text) {
        logging::warn_file_async(format!("保存上市收盤行情原始檔失敗 ({:?})", why));
    }

    Ok(parse(&text, date))
}

/// 收盤行情個股列的欄位：
/// 0:證券代號 1:證券名稱 2:成交股數 3:成交筆數 4:成交金額
/// 5:開盤價 6:最高價 7:最低價 8:收盤價 9:漲跌(+/-) 10:漲跌價差
fn parse(text: &str, date: NaiveDate) -> Vec<DailyQuote> {
    let mut quotes = Vec::with_capacity(2048);

    for line in text.lines() {
        let fields = split_csv_line(line);
        if fields.len() < 11 || !is_security_code(&fields[0]) {
            continue;
        }

        let opening_price = parse_decimal(&fields[5], None).unwrap_or_default();
        let highest_price = parse_decimal(&fields[6], None).unwrap_or_default();
        let lowest_price = parse_decimal(&fields[7], None).unwrap_or_default();
        let closing_price = parse_decimal(&fields[8], None).unwrap_or_default();
        // 全日無成交的個股四個價位都是 "--"，直接略過
        if opening_price.is_zero()
            && highest_price.is_zero()
            && lowest_price.is_zero()
            && closing_price.is_zero()
        {
            continue;
        }

        let mut change = parse_decimal(&fields[10], None).unwrap_or_default();
        if fields[9].contains('-') {
            change = -change;
        }

        quotes.push(DailyQuote {
            date,
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            opening_price,
            highest_price,
            lowest_price,
            closing_price,
            change,
            change_range: Decimal::ZERO,
            trading_volume: parse_decimal(&fields[2], None).unwrap_or_default(),
            trade_value: parse_decimal(&fields[4], None).unwrap_or_default(),
            transaction: parse_decimal(&fields[3], None).unwrap_or_default(),
            exchange_id: StockExchange::TWSE.serial_number(),
            create_time: Local::now(),
        });
    }

    quotes
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const CSV: &str = r#""114年05月08日 每日收盤行情(全部(不含權證、牛熊證))"
"證券代號","證券名稱","成交股數","成交筆數","成交金額","開盤價","最高價","最低價","收盤價","漲跌(+/-)","漲跌價差","最後揭示買價","最後揭示買量","最後揭示賣價","最後揭示賣量","本益比",
"2330","台積電","33,817,924","45,167","31,786,176,069","945.00","948.00","935.00","941.00","+","16.00","941.00","1,262","942.00","207","25.11",
"2331","精英","1,202,542","823","27,811,554","23.10","23.35","22.95","23.10","-","0.05","23.05","10","23.10","38","10.60",
"9999","無成交","0","0","0","--","--","--","--"," ","0.00","--","0","--","0","0.00",
"合計","","","","","","","","","","","","","","","",
"#;

    #[test]
    fn parse_should_work() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        let quotes = parse(CSV, date);
        assert_eq!(quotes.len(), 2);

        let tsmc = &quotes[0];
        assert_eq!(tsmc.stock_symbol, "2330");
        assert_eq!(tsmc.closing_price, dec!(941));
        assert_eq!(tsmc.change, dec!(16));
        assert_eq!(tsmc.trading_volume, dec!(33817924));
        assert_eq!(tsmc.transaction, dec!(45167));

        let elite = &quotes[1];
        assert_eq!(elite.stock_symbol, "2331");
        assert_eq!(elite.change, dec!(-0.05));
    }

    #[tokio::test]
    #[ignore]
    async fn visit_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 twse::quote::visit".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match visit(date).await {
            Ok(quotes) => {
                logging::debug_file_async(format!("quotes:{:#?}", quotes.first()));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }
        logging::debug_file_async("結束 twse::quote::visit".to_string());
    }
}
