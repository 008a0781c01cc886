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

/// 抓取上市「融券借券賣出餘額」(TWT93U)
pub async fn visit(date: NaiveDate) -> Result<Vec<Ticket>> {
    let date_str = date.format("%Y%m%d").to_string();
    let url = SETTINGS
        .ticket
        .twse_url_template
        .replace("{date}", &date_str);
    let text = util::http::get(&url, Some(super::build_headers())).await?;

    let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("twse");
    if let Err(why) = util::save_raw(&raw_dir, &format!("ticket_{}.html", date_str), &text) {
        logging::warn_file_async(format!("保存上市融券借券原始檔失敗 ({:?})", why));
    }

    Ok(share::parse_ticket_table(&text, date, StockExchange::TWSE))
}
