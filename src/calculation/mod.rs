use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use futures::StreamExt;
use rust_decimal::{prelude::*, Decimal};

use crate::{
    config::SETTINGS,
    database::table::{daily_quote::DailyQuote, indicator::Indicator},
    logging, util,
};

/// 技術指標的純計算
pub mod indicators;

/// 計算指標至少需要的交易日數
const MIN_ROWS: usize = 30;
/// 每檔股票取用的歷史交易日數，足以覆蓋最長的指標週期
const HISTORY_ROWS: i64 = 240;

/// 計算指定日期有收盤行情的所有個股技術指標並寫入資料庫
pub async fn execute(date: NaiveDate) -> Result<usize> {
    let symbols = DailyQuote::fetch_symbols(date).await?;
    if symbols.is_empty() {
        logging::info_file_async(format!("{} 沒有收盤行情，略過指標計算", date));
        return Ok(0);
    }

    let counter = Arc::new(AtomicUsize::new(0));
    futures::stream::iter(symbols)
        .for_each_concurrent(util::concurrent_limit(1), |symbol| {
            let counter = counter.clone();
            async move {
                match calculate_and_store(&symbol, date).await {
                    Ok(count) => {
                        counter.fetch_add(count, Ordering::Relaxed);
                    }
                    Err(why) => {
                        logging::error_file_async(format!(
                            "指標計算失敗 stock_symbol:{} ({:?})",
                            symbol, why
                        ));
                    }
                }
            }
        })
        .await;

    Ok(counter.load(Ordering::Relaxed))
}

/// 計算單一個股所有指標，回傳寫入的指標筆數
async fn calculate_and_store(stock_symbol: &str, date: NaiveDate) -> Result<usize> {
    let rows = DailyQuote::fetch_price_series(stock_symbol, HISTORY_ROWS).await?;
    if rows.len() < MIN_ROWS {
        return Ok(0);
    }
    // 最後一列不是目標日表示該股當天沒有行情
    match rows.last() {
        Some(last) if last.date == date => {}
        _ => return Ok(0),
    }

    let close: Vec<f64> = rows
        .iter()
        .map(|r| r.closing_price.to_f64().unwrap_or_default())
        .collect();
    let high: Vec<f64> = rows
        .iter()
        .map(|r| r.highest_price.to_f64().unwrap_or_default())
        .collect();
    let low: Vec<f64> = rows
        .iter()
        .map(|r| r.lowest_price.to_f64().unwrap_or_default())
        .collect();

    let ti = &SETTINGS.technical_indicator;
    let rsi = indicators::rsi(&close, ti.rsi_period);
    let macd = indicators::macd(&close, ti.macd_fast, ti.macd_slow, ti.macd_signal);
    let (k, d) = indicators::kd(
        &close,
        &high,
        &low,
        ti.kd_period,
        ti.kd_smooth_k,
        ti.kd_smooth_d,
    );
    let bands = indicators::bollinger(&close, ti.bollinger_period, ti.bollinger_std);

    let last = close.len() - 1;
    let mut values: Vec<(&str, Option<f64>)> = vec![
        ("rsi", rsi[last]),
        ("macd_dif", macd.dif.last().copied()),
        ("macd_signal", macd.signal.last().copied()),
        ("macd_osc", macd.osc.last().copied()),
        ("kd_k", k[last]),
        ("kd_d", d[last]),
        ("bb_upper", bands.upper[last]),
        ("bb_middle", bands.middle[last]),
        ("bb_lower", bands.lower[last]),
    ];

    if let (Some(rsi), Some(osc), Some(k), Some(d)) =
        (rsi[last], macd.osc.last().copied(), k[last], d[last])
    {
        values.push(("tech_score", Some(indicators::tech_score(rsi, osc, k, d))));
    }

    let mut count = 0;
    for (name, value) in values {
        let value = match value {
            Some(v) if v.is_finite() => v,
            _ => continue,
        };
        let value = Decimal::from_f64(value)
            .ok_or_else(|| anyhow!("{} 的 {} 無法轉成 Decimal：{}", stock_symbol, name, value))?
            .round_dp(4);

        Indicator::new(stock_symbol.to_string(), date, name.to_string(), value)
            .upsert()
            .await?;
        count += 1;
    }

    Ok(count)
}
