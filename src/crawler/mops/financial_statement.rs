use std::{collections::HashMap, path::Path};

use anyhow::Result;
use chrono::Local;
use scraper::{Html, Selector};

use crate::{
    config::SETTINGS,
    database::table::financial_statement::FinancialStatement,
    declare::{Quarter, StockExchange},
    logging, util,
    util::{
        datetime::gregorian_year_to_roc_year,
        text::{is_security_code, parse_decimal},
    },
};

/// 抓取公開資訊觀測站「綜合損益彙總表」(t163sb04)。
/// 上市與上櫃分別查詢，查詢參數使用民國年與季別
pub async fn visit(year: i32, quarter: Quarter) -> Result<Vec<FinancialStatement>> {
    let url = format!("https://{}/mops/web/t163sb04", super::HOST);
    let roc_year = gregorian_year_to_roc_year(year).to_string();
    let season = format!("{:02}", quarter.serial());
    let mut result = Vec::with_capacity(2048);

    for exchange in StockExchange::iterator() {
        let type_k = match exchange {
            StockExchange::TWSE => "sii",
            StockExchange::TPEx => "otc",
        };
        let params = HashMap::from([
            ("encodeURIComponent", "1"),
            ("step", "1"),
            ("firstin", "1"),
            ("off", "1"),
            ("isQuery", "Y"),
            ("TYPEK", type_k),
            ("year", roc_year.as_str()),
            ("season", season.as_str()),
        ]);
        let text = util::http::post_use_big5(&url, None, Some(params)).await?;

        let raw_dir = Path::new(&SETTINGS.paths.raw_data).join("mops");
        let file_name = format!("financial_statement_{}_{}_{}.html", year, season, type_k);
        if let Err(why) = util::save_raw(&raw_dir, &file_name, &text) {
            logging::warn_file_async(format!("保存綜合損益彙總原始檔失敗 ({:?})", why));
        }

        result.extend(parse(&text, year, quarter));
    }

    Ok(result)
}

/// 彙總表依產業別分成多張表格且欄位數不一，
/// 先從標題列找出需要的欄位索引再解析個股列
fn parse(text: &str, year: i32, quarter: Quarter) -> Vec<FinancialStatement> {
    let document = Html::parse_document(text);
    let (table_sel, tr_sel, cell_sel) = match (
        Selector::parse("table"),
        Selector::parse("tr"),
        Selector::parse("th, td"),
    ) {
        (Ok(t), Ok(tr), Ok(c)) => (t, tr, c),
        _ => return Vec::new(),
    };

    let mut result = Vec::with_capacity(2048);
    for table in document.select(&table_sel) {
        let mut columns: Option<Columns> = None;

        for tr in table.select(&tr_sel) {
            let cells: Vec<String> = tr
                .select(&cell_sel)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect();
            if cells.is_empty() {
                continue;
            }

            if cells[0].contains("公司") && cells[0].contains("代號") {
                columns = Columns::locate(&cells);
                continue;
            }

            let cols = match &columns {
                Some(c) => c,
                None => continue,
            };
            if cells.len() <= cols.max_index() || !is_security_code(&cells[0]) {
                continue;
            }

            result.push(FinancialStatement {
                year,
                quarter: quarter.name().to_string(),
                stock_symbol: cells[0].to_string(),
                revenue: parse_decimal(&cells[cols.revenue], None).unwrap_or_default(),
                operating_income: parse_decimal(&cells[cols.operating_income], None)
                    .unwrap_or_default(),
                net_income: parse_decimal(&cells[cols.net_income], None).unwrap_or_default(),
                earnings_per_share: parse_decimal(&cells[cols.eps], None).unwrap_or_default(),
                created_time: Local::now(),
                updated_time: Local::now(),
            });
        }
    }

    result
}

struct Columns {
    revenue: usize,
    operating_income: usize,
    net_income: usize,
    eps: usize,
}

impl Columns {
    fn locate(headers: &[String]) -> Option<Columns> {
        let find = |predicate: &dyn Fn(&str) -> bool| {
            headers.iter().position(|h| predicate(h.as_str()))
        };
        Some(Columns {
            revenue: find(&|h| h.contains("營業收入") || h.contains("收益"))?,
            operating_income: find(&|h| h.contains("營業利益"))?,
            net_income: find(&|h| h.contains("本期淨利") && !h.contains("歸屬"))?,
            eps: find(&|h| h.contains("基本每股盈餘"))?,
        })
    }

    fn max_index(&self) -> usize {
        self.revenue
            .max(self.operating_income)
            .max(self.net_income)
            .max(self.eps)
    }
}
