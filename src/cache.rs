//! 全域快取模組。
//!
//! 提供兩類快取：
//! 1. [`SHARE`]：長生命週期的業務資料快取，包含股票主檔與最後交易日收盤價。
//! 2. [`TTL`]：短生命週期的暫存快取，用於「短時間內避免重複處理」的場景。
//!
//! 以 `RwLock` 保護共享資料，讀多寫少的路徑可並行讀取。
//! 若鎖取得失敗，多數 API 會回傳 `None` 或 `false` 以避免 panic，
//! 並由上層依回傳值決定是否重試或降級處理。

use std::{sync::RwLock, time::Duration};

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::{
    database::table::{daily_quote, stock},
    logging,
    util::map::vec_to_hashmap,
};

/// 全域共享資料快取實例。
///
/// 請在服務啟動時先呼叫 [`Share::load`] 完成初始化，再進行讀取。
pub static SHARE: Lazy<Share> = Lazy::new(Default::default);

/// 各類長生命週期快取的集中管理器。
pub struct Share {
    /// 股票主檔，Key: 股票代號
    pub stocks: RwLock<HashMap<String, stock::Stock>>,
    /// 最後交易日收盤行情，Key: 股票代號
    last_trading_day_quotes: RwLock<HashMap<String, daily_quote::DailyQuote>>,
}

impl Share {
    pub fn new() -> Self {
        Share {
            stocks: RwLock::new(HashMap::new()),
            last_trading_day_quotes: RwLock::new(HashMap::new()),
        }
    }

    /// 從資料庫載入主快取資料。
    ///
    /// 錯誤處理策略：各段落若失敗會記錄 log，其他段落仍會繼續執行，
    /// 屬於「盡力載入」模型。建議在程式啟動階段呼叫一次。
    pub async fn load(&self) {
        match stock::Stock::fetch().await {
            Ok(stocks) => {
                if let Ok(mut s) = self.stocks.write() {
                    *s = vec_to_hashmap(stocks);
                }
            }
            Err(why) => {
                logging::error_file_async(format!("Failed to Stock::fetch because {:?}", why));
            }
        }

        match daily_quote::DailyQuote::fetch_last_trading_day_quotes().await {
            Ok(quotes) => {
                if let Ok(mut cache) = self.last_trading_day_quotes.write() {
                    for quote in quotes {
                        cache.insert(quote.stock_symbol.to_string(), quote);
                    }
                }
            }
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch_last_trading_day_quotes because {:?}",
                    why
                ));
            }
        }

        let stock_count = self.stocks.read().map(|s| s.len()).unwrap_or_default();
        let quote_count = self
            .last_trading_day_quotes
            .read()
            .map(|q| q.len())
            .unwrap_or_default();

        logging::info_file_async(format!(
            "快取載入完成 股票主檔:{} 最後交易日收盤:{}",
            stock_count, quote_count
        ));
    }

    /// 取得指定股票最後交易日的收盤行情
    pub async fn get_last_trading_day_quotes(
        &self,
        stock_symbol: &str,
    ) -> Option<daily_quote::DailyQuote> {
        match self.last_trading_day_quotes.read() {
            Ok(cache) => cache.get(stock_symbol).cloned(),
            Err(_) => None,
        }
    }

    /// 更新指定股票最後交易日的收盤行情
    pub async fn set_stock_last_price(&self, quote: &daily_quote::DailyQuote) {
        if let Ok(mut cache) = self.last_trading_day_quotes.write() {
            cache.insert(quote.stock_symbol.to_string(), quote.clone());
        }
    }

    /// 股票主檔是否已有此代號
    pub fn stock_contains_key(&self, stock_symbol: &str) -> bool {
        match self.stocks.read() {
            Ok(stocks) => stocks.contains_key(stock_symbol),
            Err(_) => false,
        }
    }

    /// 新增一筆股票主檔到快取
    pub fn insert_stock(&self, stock: &stock::Stock) {
        if let Ok(mut stocks) = self.stocks.write() {
            stocks.insert(stock.stock_symbol.to_string(), stock.clone());
        }
    }
}

impl Default for Share {
    fn default() -> Self {
        Self::new()
    }
}

/// 全域短時效快取實例。
pub static TTL: Lazy<Ttl> = Lazy::new(Default::default);

/// 具 TTL（存活時間）能力的快取容器。
///
/// `daily_quote` 用來避免同一輪流程重複處理同一筆日行情。
pub struct Ttl {
    daily_quote: moka::sync::Cache<String, String>,
}

/// 對 `Ttl` 的操作介面抽象。
pub trait TtlCacheInner {
    fn daily_quote_contains_key(&self, key: &str) -> bool;
    fn daily_quote_get(&self, key: &str) -> Option<String>;
    fn daily_quote_set(&self, key: String, val: String);
    fn clear(&self);
}

impl TtlCacheInner for Ttl {
    fn daily_quote_contains_key(&self, key: &str) -> bool {
        self.daily_quote.contains_key(key)
    }

    fn daily_quote_get(&self, key: &str) -> Option<String> {
        self.daily_quote.get(key)
    }

    fn daily_quote_set(&self, key: String, val: String) {
        self.daily_quote.insert(key, val);
    }

    fn clear(&self) {
        self.daily_quote.invalidate_all();
    }
}

impl Ttl {
    pub fn new() -> Self {
        Ttl {
            daily_quote: moka::sync::Cache::builder()
                .max_capacity(4096)
                .time_to_live(Duration::from_secs(60 * 60 * 24))
                .build(),
        }
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Self::new()
    }
}
