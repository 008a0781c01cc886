use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::{
    config::SETTINGS,
    crawler::share,
    database::table::ticket::Ticket,
    declare::StockExchange,
    logging, util,
};

/// 抓取上櫃「融券借券賣出餘額」(term_tra)
pub async fn visit(date: NaiveDate) -> Result<Vec<Ticket>> {
    let url = SETTINGS
        .ticket
        .tpex_url_template
        .replace("{date_url}", &super::roc_date_url_encoded(date));
    let text = util::http::get(&url, None).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("tpex");
    let file_name = format!("ticket_{}.html", date.format("%Y%m%d"));
    if let Err(why) = util::save_raw(&raw_dir, &file_name, &text) {
        logging::warn_file_async(format!("保存上櫃融券借券原始檔失敗 ({:?})", why));
    }

    Ok(share::parse_ticket_table(&text, date, StockExchange::TPEx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn visit_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 tpex::ticket::visit".to_string());
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        match visit(date).await {
            Ok(rows) => {
                logging::debug_file_async(format!("rows:{:#?}", rows.first()));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }
        logging::debug_file_async("結束 tpex::ticket::visit".to_string());
    }
}
