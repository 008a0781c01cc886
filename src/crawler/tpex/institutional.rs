use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::{
    config::SETTINGS,
    database::table::institutional::Institutional,
    declare::StockExchange,
    logging, util,
    util::{
        datetime::to_roc_date,
        text::{is_security_code, parse_i64},
    },
};

#[derive(Deserialize, Debug)]
struct InstitutionalResponse {
    #[serde(rename = "aaData", default)]
    aa_data: Vec<Vec<String>>,
}

/// 抓取上櫃「三大法人買賣明細」(3itrade_hedge)，回應為 JSON
pub async fn visit(date: NaiveDate) -> Result<Vec<Institutional>> {
    let url = SETTINGS
        .tpex_institutional
        .url_template
        .replace("{date}", &to_roc_date(date));
    let response = util::http::get_json::<InstitutionalResponse>(&url).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("tpex");
    let file_name = format!("institutional_{}.json", date.format("%Y%m%d"));
    match serde_json::to_string(&serde_json::json!({ "aaData": response.aa_data })) {
        Ok(json) => {
            if let Err(why) = util::save_raw(&raw_dir, &file_name, &json) {
                logging::warn_file_async(format!("保存上櫃三大法人原始檔失敗 ({:?})", why));
            }
        }
        Err(why) => {
            logging::warn_file_async(format!("序列化上櫃三大法人原始資料失敗 ({:?})", why));
        }
    }

    Ok(parse(&response.aa_data, date))
}

/// aaData 每列的欄位：
/// 0:代號 1:名稱
/// 外資及陸資 2:買進股數 3:賣出股數 4:買賣超股數
/// 投信 11:買進股數 12:賣出股數 13:買賣超股數
/// 自營商 20:買進股數 21:賣出股數 22:買賣超股數
fn parse(rows: &[Vec<String>], date: NaiveDate) -> Vec<Institutional> {
    let mut result = Vec::with_capacity(1024);

    for row in rows {
        if row.len() < 23 || !is_security_code(&row[0]) {
            continue;
        }

        let foreign_net = parse_i64(&row[4], None).unwrap_or_default();
        let trust_net = parse_i64(&row[13], None).unwrap_or_default();
        let dealer_net = parse_i64(&row[22], None).unwrap_or_default();

        result.push(Institutional {
            date,
            stock_symbol: row[0].trim().to_string(),
            name: row[1].trim().to_string(),
            foreign_buy: parse_i64(&row[2], None).unwrap_or_default(),
            foreign_sell: parse_i64(&row[3], None).unwrap_or_default(),
            foreign_net,
            trust_buy: parse_i64(&row[11], None).unwrap_or_default(),
            trust_sell: parse_i64(&row[12], None).unwrap_or_default(),
            trust_net,
            dealer_net,
            total_net: foreign_net + trust_net + dealer_net,
            exchange_id: StockExchange::TPEx.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}
