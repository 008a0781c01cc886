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

/// 抓取上櫃「融資融券餘額」(margin_balance)
pub async fn visit(date: NaiveDate) -> Result<Vec<Credit>> {
    let url = SETTINGS
        .credit
        .tpex
        .url_template
        .replace("{date_url}", &super::roc_date_url_encoded(date));
    let text = util::http::get(&url, None).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("tpex");
    let file_name = format!("credit_{}.csv", date.format("%Y%m%d"));
    if let Err(why) = util::save_raw(&raw_dir, &file_name, &text) {
        logging::warn_file_async(format!("保存上櫃信用交易原始檔失敗 ({:?})", why));
    }

    Ok(parse(&text, date))
}

/// 上櫃融資融券餘額 CSV 的欄位：
/// 0:代號 1:名稱
/// 融資 2:前資餘額(張) 3:資買 4:資賣 5:現償 6:資餘額
/// 融券 10:前券餘額(張) 11:券賣 12:券買 13:券償 14:券餘額
fn parse(text: &str, date: NaiveDate) -> Vec<Credit> {
    let mut result = Vec::with_capacity(1024);

    for line in text.lines() {
        let fields = split_csv_line(line);
        if fields.len() < 15 || !is_security_code(&fields[0]) {
            continue;
        }

        result.push(Credit {
            date,
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            margin_purchase_balance: parse_i64(&fields[6], None).unwrap_or_default(),
            margin_purchase_balance_prev: parse_i64(&fields[2], None).unwrap_or_default(),
            short_sale_balance: parse_i64(&fields[14], None).unwrap_or_default(),
            short_sale_balance_prev: parse_i64(&fields[10], None).unwrap_or_default(),
            exchange_id: StockExchange::TPEx.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = r#"上櫃股票融資融券餘額
資料日期:114/05/08
代號,名稱,前資餘額(張),資買,資賣,現償,資餘額,資屬證金,資使用率(%),資限額,前券餘額(張),券賣,券買,券償,券餘額,券屬證金,券使用率(%),券限額,資券相抵(張),備註
5483,中美晶,"9,620",120,260,5,"9,475",0,1.61,"146,621","1,041",15,40,2,"1,014",0,0.17,"146,621",35,
註:本資訊以當日收盤後之資料為準
"#;

    #[test]
    fn parse_should_work() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        let rows = parse(CSV, date);
        assert_eq!(rows.len(), 1);
        let sas = &rows[0];
        assert_eq!(sas.margin_purchase_balance, 9_475);
        assert_eq!(sas.margin_purchase_balance_prev, 9_620);
        assert_eq!(sas.short_sale_balance, 1_014);
        assert_eq!(sas.short_sale_balance_prev, 1_041);
    }

    #[tokio::test]
    #[ignore]
    async fn visit_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 tpex::credit::visit".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match visit(date).await {
            Ok(rows) => {
                logging::debug_file_async(format!("rows:{:#?}", rows.first()));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }
        logging::debug_file_async("結束 tpex::credit::visit".to_string());
    }
}
