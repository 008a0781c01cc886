use std::future::Future;

use anyhow::{Error, Result};
use chrono::{Datelike, Local, NaiveDate};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{
    backfill, calculation,
    config::SETTINGS,
    declare::Quarter,
    logging,
    util::datetime::Weekend,
};

/// 啟動排程
pub async fn start() -> Result<JobScheduler> {
    let sched = JobScheduler::new().await?;
    run_cron(&sched).await?;
    logging::info_file_async("排程已啟動".to_string());

    Ok(sched)
}

async fn run_cron(sched: &JobScheduler) -> Result<()> {
    //                 sec  min  hour  day-of-month  month  day-of-week
    // UTC 時間，台北時間再減八小時
    let jobs = vec![
        // 15:00 收盤行情
        create_job("0 0 7 * * *", quote),
        // 16:30 三大法人買賣超
        create_job("0 30 8 * * *", institutional),
        // 17:00 融資融券餘額
        create_job("0 0 9 * * *", credit),
        // 17:30 融券借券賣出餘額
        create_job("0 30 9 * * *", ticket),
        // 18:00 估值指標
        create_job("0 0 10 * * *", valuation),
        // 18:30 技術指標（依賴當日收盤行情已入庫）
        create_job("0 30 10 * * *", indicator),
        // 19:00 季度財報
        create_job("0 0 11 * * *", financial_statement),
        // 每小時新聞
        create_job("0 0 * * * *", news),
    ];

    // cron 表達式寫錯必須在啟動時失敗，不能默默少排一個工作
    for job in jobs {
        sched.add(job?).await?;
    }

    sched.start().await?;

    Ok(())
}

fn create_job<F, Fut>(cron_expr: &'static str, task: F) -> Result<Job>
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    Ok(Job::new_async(cron_expr, move |_uuid, _l| {
        let task = task.clone();
        Box::pin(async move {
            if let Err(why) = task().await {
                logging::error_file_async(format!(
                    "Failed to execute task({}) because {:?}",
                    cron_expr, why
                ));
            }
        })
    })?)
}

/// 非週末才回傳當天日期
fn trading_day() -> Option<NaiveDate> {
    let now = Local::now();
    if now.is_weekend() {
        return None;
    }

    Some(now.date_naive())
}

async fn quote() -> Result<()> {
    if let Some(date) = trading_day() {
        let count = backfill::quote::execute(date).await?;
        logging::info_file_async(format!("{} 收盤行情回補完成 count:{}", date, count));
    }

    Ok(())
}

async fn institutional() -> Result<()> {
    if let Some(date) = trading_day() {
        let count = backfill::institutional::execute(date).await?;
        logging::info_file_async(format!("{} 三大法人回補完成 count:{}", date, count));
    }

    Ok(())
}

async fn credit() -> Result<()> {
    if let Some(date) = trading_day() {
        let count = backfill::credit::execute(date).await?;
        logging::info_file_async(format!("{} 融資融券回補完成 count:{}", date, count));
    }

    Ok(())
}

async fn ticket() -> Result<()> {
    if let Some(date) = trading_day() {
        let count = backfill::ticket::execute(date).await?;
        logging::info_file_async(format!("{} 融券借券回補完成 count:{}", date, count));
    }

    Ok(())
}

async fn valuation() -> Result<()> {
    if let Some(date) = trading_day() {
        let count = backfill::valuation::execute(date).await?;
        logging::info_file_async(format!("{} 估值指標回補完成 count:{}", date, count));
    }

    Ok(())
}

async fn indicator() -> Result<()> {
    if let Some(date) = trading_day() {
        let count = calculation::execute(date).await?;
        logging::info_file_async(format!("{} 技術指標計算完成 count:{}", date, count));
    }

    Ok(())
}

/// 設定檔內列出要收錄的季度（以季底日期表示），
/// 逐一檢查已過季底且尚未入庫的季度
async fn financial_statement() -> Result<()> {
    let today = Local::now().date_naive();

    for report_date in SETTINGS.finance.report_dates.iter() {
        let quarter_end = match NaiveDate::parse_from_str(report_date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(why) => {
                logging::warn_file_async(format!(
                    "無法解析 finance.report_dates:{} ({:?})",
                    report_date, why
                ));
                continue;
            }
        };
        if quarter_end >= today {
            continue;
        }
        let quarter = match Quarter::from_month(quarter_end.month()) {
            Some(q) => q,
            None => continue,
        };

        let count =
            backfill::financial_statement::execute(quarter_end.year(), quarter).await?;
        if count > 0 {
            logging::info_file_async(format!(
                "{} {} 財報回補完成 count:{}",
                quarter_end.year(),
                quarter.name(),
                count
            ));
        }
    }

    Ok(())
}

async fn news() -> Result<()> {
    let count = backfill::news::execute().await?;
    if count > 0 {
        logging::info_file_async(format!("新聞回補完成 count:{}", count));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_job_should_reject_invalid_cron() {
        assert!(create_job("這不是 cron", news).is_err());
    }

    #[test]
    fn create_job_should_accept_valid_cron() {
        assert!(create_job("0 0 7 * * *", news).is_ok());
    }
}
