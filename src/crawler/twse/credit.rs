use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::{
    config::SETTINGS,
    database::table::credit::Credit,
    declare::StockExchange,
    logging, util,
    util::text::{is_security_code, parse_i64, split_csv_line},
};

/// 抓取上市「融資融券餘額」(MI_MARGN)
pub async fn visit(date: NaiveDate) -> Result<Vec<Credit>> {
    let date_str = date.format("%Y%m%d").to_string();
    let url = SETTINGS
        .credit
        .twse
        .url_template
        .replace("{date}", &date_str);
    let text = util::http::get_use_big5(&url).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("twse");
    if let Err(why) = util::save_raw(&raw_dir, &format!("credit_{}.csv", date_str), &text) {
        logging::warn_file_async(format!("保存上市信用交易原始檔失敗 ({:?})", why));
    }

    Ok(parse(&text, date))
}

/// MI_MARGN 個股列的欄位：
/// 0:股票代號 1:股票名稱
/// 融資 2:買進 3:賣出 4:現金償還 5:前日餘額 6:今日餘額 7:限額
/// 融券 8:買進 9:賣出 10:現券償還 11:前日餘額 12:今日餘額 13:限額
fn parse(text: &str, date: NaiveDate) -> Vec<Credit> {
    let mut result = Vec::with_capacity(2048);

    for line in text.lines() {
        let fields = split_csv_line(line);
        if fields.len() < 14 || !is_security_code(&fields[0]) {
            continue;
        }

        result.push(Credit {
            date,
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            margin_purchase_balance: parse_i64(&fields[6], None).unwrap_or_default(),
            margin_purchase_balance_prev: parse_i64(&fields[5], None).unwrap_or_default(),
            short_sale_balance: parse_i64(&fields[12], None).unwrap_or_default(),
            short_sale_balance_prev: parse_i64(&fields[11], None).unwrap_or_default(),
            exchange_id: StockExchange::TWSE.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = r#""114年05月08日 融資融券彙總"
"股票代號","股票名稱","買進","賣出","現金償還","前日餘額","今日餘額","限額","買進","賣出","現券償還","前日餘額","今日餘額","限額","資券互抵","註記",
"2330","台積電","760","1,535","30","17,858","17,053","6,482,927","151","186","24","1,011","1,022","6,482,927","18","",
"信用交易統計","買進","賣出",
"#;

    #[test]
    fn parse_should_work() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        let rows = parse(CSV, date);
        assert_eq!(rows.len(), 1);
        let tsmc = &rows[0];
        assert_eq!(tsmc.margin_purchase_balance, 17_053);
        assert_eq!(tsmc.margin_purchase_balance_prev, 17_858);
        assert_eq!(tsmc.short_sale_balance, 1_022);
        assert_eq!(tsmc.short_sale_balance_prev, 1_011);
    }

    #[tokio::test]
    #[ignore]
    async fn visit_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 twse::credit::visit".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match visit(date).await {
            Ok(rows) => {
                logging::debug_file_async(format!("rows:{:#?}", rows.first()));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }
        logging::debug_file_async("結束 twse::credit::visit".to_string());
    }
}
