use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::{
    config::SETTINGS,
    database::table::valuation::Valuation,
    declare::StockExchange,
    logging, util,
    util::text::{is_security_code, parse_decimal, split_csv_line},
};

/// 抓取上市「個股日本益比、殖利率及股價淨值比」(BWIBBU_d)
pub async fn visit(date: NaiveDate) -> Result<Vec<Valuation>> {
    let date_str = date.format("%Y%m%d").to_string();
    let url = SETTINGS.twse_pe.url_template.replace("{date}", &date_str);
    let text = util::http::get_use_big5(&url).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("twse");
    if let Err(why) = util::save_raw(&raw_dir, &format!("valuation_{}.csv", date_str), &text) {
        logging::warn_file_async(format!("保存上市估值原始檔失敗 ({:?})", why));
    }

    Ok(parse(&text, date))
}

/// BWIBBU_d 的欄位：
/// 0:證券代號 1:證券名稱 2:殖利率(%) 3:股利年度 4:本益比 5:股價淨值比
fn parse(text: &str, date: NaiveDate) -> Vec<Valuation> {
    let mut result = Vec::with_capacity(2048);

    for line in text.lines() {
        // 說明列的逗號數量不足，先以欄位數過濾
        let fields = split_csv_line(line);
        if fields.len() < 6 || !is_security_code(&fields[0]) {
            continue;
        }

        result.push(Valuation {
            date,
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            dividend_yield: parse_decimal(&fields[2], None).unwrap_or_default(),
            price_earning_ratio: parse_decimal(&fields[4], None).unwrap_or_default(),
            price_book_ratio: parse_decimal(&fields[5], None).unwrap_or_default(),
            exchange_id: StockExchange::TWSE.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}
