use anyhow::Result;
use chrono::NaiveDate;

use crate::{crawler, database::table::ticket::Ticket, logging};

/// 回補指定日期上市與上櫃的融券借券賣出餘額
pub async fn execute(date: NaiveDate) -> Result<usize> {
    let (twse, tpex) = tokio::join!(
        crawler::twse::ticket::visit(date),
        crawler::tpex::ticket::visit(date)
    );

    let mut rows = Vec::with_capacity(4096);
    for result in [twse, tpex] {
        match result {
            Ok(mut r) => rows.append(&mut r),
            Err(why) => {
                logging::error_file_async(format!("融券借券餘額抓取失敗 ({:?})", why));
            }
        }
    }

    if rows.is_empty() {
        logging::info_file_async(format!("{} 沒有融券借券餘額可回補", date));
        return Ok(0);
    }

    Ticket::delete_by_date(date).await?;
    let count = Ticket::copy_in_raw(&rows).await?;

    Ok(count as usize)
}
