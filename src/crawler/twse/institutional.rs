use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::{
    config::SETTINGS,
    database::table::institutional::Institutional,
    declare::StockExchange,
    logging, util,
    util::text::{is_security_code, parse_i64, split_csv_line},
};

/// 抓取上市「三大法人買賣超日報」(T86)
pub async fn visit(date: NaiveDate) -> Result<Vec<Institutional>> {
    let date_str = date.format("%Y%m%d").to_string();
    let url = SETTINGS
        .twse_institutional
        .url_template
        .replace("{date}", &date_str);
    let text = util::http::get_use_big5(&url).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("twse");
    if let Err(why) = util::save_raw(&raw_dir, &format!("institutional_{}.csv", date_str), &text) {
        logging::warn_file_async(format!("保存上市三大法人原始檔失敗 ({:?})", why));
    }

    Ok(parse(&text, date))
}

/// T86 的欄位：
/// 0:證券代號 1:證券名稱
/// 2:外陸資買進股數(不含外資自營商) 3:外陸資賣出股數 4:外陸資買賣超股數
/// 8:投信買進股數 9:投信賣出股數 10:投信買賣超股數
/// 11:自營商買賣超股數 最後一欄:三大法人買賣超股數
fn parse(text: &str, date: NaiveDate) -> Vec<Institutional> {
    let mut result = Vec::with_capacity(2048);

    for line in text.lines() {
        let fields = split_csv_line(line);
        if fields.len() < 12 || !is_security_code(&fields[0]) {
            continue;
        }

        let foreign_buy = parse_i64(&fields[2], None).unwrap_or_default();
        let foreign_sell = parse_i64(&fields[3], None).unwrap_or_default();
        let trust_buy = parse_i64(&fields[8], None).unwrap_or_default();
        let trust_sell = parse_i64(&fields[9], None).unwrap_or_default();
        let dealer_net = parse_i64(&fields[11], None).unwrap_or_default();
        // 行尾有多餘的逗號，最後一個非空欄位才是三大法人買賣超
        let total_net = fields
            .iter()
            .rev()
            .find(|f| !f.is_empty())
            .and_then(|f| parse_i64(f, None).ok())
            .unwrap_or_default();

        result.push(Institutional {
            date,
            stock_symbol: fields[0].to_string(),
            name: fields[1].to_string(),
            foreign_buy,
            foreign_sell,
            foreign_net: parse_i64(&fields[4], None).unwrap_or_default(),
            trust_buy,
            trust_sell,
            trust_net: parse_i64(&fields[10], None).unwrap_or_default(),
            dealer_net,
            total_net,
            exchange_id: StockExchange::TWSE.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = r#""114年05月08日 三大法人買賣超日報"
"證券代號","證券名稱","外陸資買進股數(不含外資自營商)","外陸資賣出股數(不含外資自營商)","外陸資買賣超股數","外資自營商買進股數","外資自營商賣出股數","外資自營商買賣超股數","投信買進股數","投信賣出股數","投信買賣超股數","自營商買賣超股數","自營商買進股數(自行買賣)","自營商賣出股數(自行買賣)","自營商買賣超股數(自行買賣)","自營商買進股數(避險)","自營商賣出股數(避險)","自營商買賣超股數(避險)","三大法人買賣超股數",
"2330","台積電","14,365,962","6,339,310","8,026,652","0","0","0","1,031,000","98,000","933,000","-380,155","28,000","132,000","-104,000","848,845","1,125,000","-276,155","8,579,497",
"合計","","","","","","","","","","","","","","","","","","",
"#;

    #[test]
    fn parse_should_work() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        let rows = parse(CSV, date);
        assert_eq!(rows.len(), 1);

        let tsmc = &rows[0];
        assert_eq!(tsmc.foreign_buy, 14_365_962);
        assert_eq!(tsmc.foreign_sell, 6_339_310);
        assert_eq!(tsmc.foreign_net, 8_026_652);
        assert_eq!(tsmc.trust_net, 933_000);
        assert_eq!(tsmc.dealer_net, -380_155);
        assert_eq!(tsmc.total_net, 8_579_497);
    }

    #[tokio::test]
    #[ignore]
    async fn visit_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 twse::institutional::visit".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match visit(date).await {
            Ok(rows) => {
                logging::debug_file_async(format!("rows:{:#?}", rows.first()));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }
        logging::debug_file_async("結束 twse::institutional::visit".to_string());
    }
}
