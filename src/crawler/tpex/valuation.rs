use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::{
    config::SETTINGS,
    database::table::valuation::Valuation,
    declare::StockExchange,
    logging, util,
    util::{
        datetime::to_roc_date,
        text::{is_security_code, parse_decimal, split_csv_line},
    },
};

/// 抓取上櫃「個股本益比、殖利率、股價淨值比」(peratio_analysis)
pub async fn visit(date: NaiveDate) -> Result<Vec<Valuation>> {
    let url = SETTINGS
        .tpex_pe
        .url_template
        .replace("{date}", &to_roc_date(date));
    let text = util::http::get(&url, None).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("tpex");
    let file_name = format!("valuation_{}.csv", date.format("%Y%m%d"));
    if let Err(why) = util::save_raw(&raw_dir, &file_name, &text) {
        logging::warn_file_async(format!("保存上櫃估值原始檔失敗 ({:?})", why));
    }

    Ok(parse(&text, date))
}

/// peratio_analysis CSV 的欄位：
/// 0:股票代號 1:名稱 2:本益比 3:每股股利 4:股利年度 5:殖利率(%) 6:股價淨值比
fn parse(text: &str, date: NaiveDate) -> Vec<Valuation> {
    let mut result = Vec::with_capacity(1024);

    for line in text.lines() {
        // 標題與說明列的逗號不足七個，先以欄位數過濾
        let fields = split_csv_line(line);
        if fields.len() < 7 || !is_security_code(&fields[0]) {
            continue;
        }

        result.push(Valuation {
            date,
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            dividend_yield: parse_decimal(&fields[5], None).unwrap_or_default(),
            price_earning_ratio: parse_decimal(&fields[2], None).unwrap_or_default(),
            price_book_ratio: parse_decimal(&fields[6], None).unwrap_or_default(),
            exchange_id: StockExchange::TPEx.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const CSV: &str = r#"上櫃股票個股本益比、殖利率、股價淨值比(含一般板)
資料日期:114/05/08
股票代號,名稱,本益比,每股股利,股利年度,殖利率(%),股價淨值比
5483,中美晶,12.47,6.00,113,3.80,2.15
8069,元太,28.10,3.50,113,1.46,4.52
"#;

    #[test]
    fn parse_should_work() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        let rows = parse(CSV, date);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price_earning_ratio, dec!(12.47));
        assert_eq!(rows[0].dividend_yield, dec!(3.80));
        assert_eq!(rows[1].price_book_ratio, dec!(4.52));
    }

    #[tokio::test]
    #[ignore]
    async fn visit_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 tpex::valuation::visit".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match visit(date).await {
            Ok(rows) => {
                logging::debug_file_async(format!("rows:{:#?}", rows.first()));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }
        logging::debug_file_async("結束 tpex::valuation::visit".to_string());
    }
}
