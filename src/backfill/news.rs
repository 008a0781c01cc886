use anyhow::Result;

use crate::{config::SETTINGS, crawler, logging};

/// 抓取所有 RSS 來源並寫入新聞，同一連結只收錄一次
pub async fn execute() -> Result<usize> {
    let mut count = 0;

    for source in SETTINGS.rss_sources.iter() {
        let news = match crawler::rss::visit(source).await {
            Ok(news) => news,
            Err(why) => {
                logging::error_file_async(format!(
                    "RSS 抓取失敗 source:{} ({:?})",
                    source, why
                ));
                continue;
            }
        };

        for item in news {
            match item.upsert().await {
                Ok(result) => count += result.rows_affected() as usize,
                Err(why) => {
                    logging::error_file_async(format!(
                        "新聞寫入失敗 link:{} ({:?})",
                        item.link, why
                    ));
                }
            }
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn execute_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 backfill::news::execute".to_string());
        match execute().await {
            Ok(count) => {
                logging::debug_file_async(format!("count:{}", count));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to execute because {:?}", why));
            }
        }
        logging::debug_file_async("結束 backfill::news::execute".to_string());
    }
}
