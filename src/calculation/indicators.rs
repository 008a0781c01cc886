//! 技術指標的純計算，輸入輸出皆與原始序列等長，
//! 樣本數不足的前段為 `None`

/// 相對強弱指標。漲跌幅取簡單移動平均，
/// 平均跌幅為零（期間內全漲）時回傳 100，漲跌皆零（整段走平）時無值
pub fn rsi(close: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; close.len()];
    if period == 0 || close.len() <= period {
        return result;
    }

    let mut gains = Vec::with_capacity(close.len());
    let mut losses = Vec::with_capacity(close.len());
    for window in close.windows(2) {
        let diff = window[1] - window[0];
        gains.push(diff.max(0.0));
        losses.push((-diff).max(0.0));
    }

    for i in period..close.len() {
        // gains[i - 1] 對應 close[i] 當天的漲跌
        let start = i - period;
        let avg_gain: f64 = gains[start..i].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[start..i].iter().sum::<f64>() / period as f64;

        result[i] = if avg_gain == 0.0 && avg_loss == 0.0 {
            // 整段窗口走平，0/0 不具意義，視為無值
            None
        } else if avg_loss == 0.0 {
            Some(100.0)
        } else {
            Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
        };
    }

    result
}

/// 指數移動平均，first 值即為序列首值（遞迴式，非修正式）
fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev = match values.first() {
        Some(v) => *v,
        None => return result,
    };

    result.push(prev);
    for v in &values[1..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        result.push(prev);
    }

    result
}

pub struct Macd {
    /// 快慢線差離值
    pub dif: Vec<f64>,
    /// 差離值的訊號線
    pub signal: Vec<f64>,
    /// 柱狀圖（DIF − 訊號線）
    pub osc: Vec<f64>,
}

/// 指數平滑異同移動平均線
pub fn macd(close: &[f64], fast: usize, slow: usize, signal_span: usize) -> Macd {
    let fast_ema = ema(close, fast);
    let slow_ema = ema(close, slow);
    let dif: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&dif, signal_span);
    let osc = dif
        .iter()
        .zip(signal.iter())
        .map(|(d, s)| d - s)
        .collect();

    Macd { dif, signal, osc }
}

/// 隨機指標。先取週期內的未成熟隨機值（RSV），
/// 再分別以簡單移動平均平滑出 %K 與 %D。
/// 週期內最高價等於最低價時 RSV 以 50 計
pub fn kd(
    close: &[f64],
    high: &[f64],
    low: &[f64],
    period: usize,
    smooth_k: usize,
    smooth_d: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let len = close.len();
    let mut rsv = vec![None; len];
    if period == 0 || len < period {
        return (rsv.clone(), rsv);
    }

    for i in (period - 1)..len {
        let start = i + 1 - period;
        let highest = high[start..=i].iter().copied().fold(f64::MIN, f64::max);
        let lowest = low[start..=i].iter().copied().fold(f64::MAX, f64::min);
        let range = highest - lowest;
        rsv[i] = Some(if range == 0.0 {
            50.0
        } else {
            100.0 * (close[i] - lowest) / range
        });
    }

    let k = rolling_mean(&rsv, smooth_k);
    let d = rolling_mean(&k, smooth_d);
    (k, d)
}

/// 對含 `None` 前段的序列取簡單移動平均，
/// 視窗內任一值缺漏則結果為 `None`
fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 {
        return result;
    }

    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_none()) {
            continue;
        }
        let sum: f64 = slice.iter().flatten().sum();
        result[i] = Some(sum / window as f64);
    }

    result
}

pub struct Bollinger {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// 布林通道，中軌為簡單移動平均，上下軌為中軌 ± 倍數 × 樣本標準差
pub fn bollinger(close: &[f64], period: usize, std_multiplier: f64) -> Bollinger {
    let len = close.len();
    let mut bands = Bollinger {
        upper: vec![None; len],
        middle: vec![None; len],
        lower: vec![None; len],
    };
    if period < 2 || len < period {
        return bands;
    }

    for i in (period - 1)..len {
        let slice = &close[i + 1 - period..=i];
        let mean = slice.iter().sum::<f64>() / period as f64;
        let variance =
            slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period as f64 - 1.0);
        let offset = std_multiplier * variance.sqrt();

        bands.middle[i] = Some(mean);
        bands.upper[i] = Some(mean + offset);
        bands.lower[i] = Some(mean - offset);
    }

    bands
}

/// RSI 分量：30 以下視為超賣（100 分），70 以上視為超買（0 分），中間線性
fn rsi_score(rsi: f64) -> f64 {
    if rsi <= 30.0 {
        100.0
    } else if rsi >= 70.0 {
        0.0
    } else {
        (70.0 - rsi) / 40.0 * 100.0
    }
}

/// MACD 分量：柱狀圖夾在 ±2 之間再線性換算
fn macd_score(osc: f64) -> f64 {
    let clipped = osc.clamp(-2.0, 2.0);
    (clipped + 2.0) / 4.0 * 100.0
}

/// KD 分量：20 以下視為超賣（100 分），80 以上視為超買（0 分），中間線性
fn kd_score(value: f64) -> f64 {
    if value <= 20.0 {
        100.0
    } else if value >= 80.0 {
        0.0
    } else {
        (80.0 - value) / 60.0 * 100.0
    }
}

/// 綜合技術評分（0 偏空 ~ 100 偏多），取四個分量的平均
pub fn tech_score(rsi: f64, macd_osc: f64, k: f64, d: f64) -> f64 {
    let score =
        (rsi_score(rsi) + macd_score(macd_osc) + kd_score(k) + kd_score(d)) / 4.0;
    score.clamp(0.0, 100.0)
}
