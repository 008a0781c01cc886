use chrono::{Local, NaiveDate};
use scraper::{Html, Selector};

use crate::{
    database::table::ticket::Ticket,
    declare::StockExchange,
    util::text::{is_security_code, parse_i64},
};

/// 解析融券借券賣出餘額的 HTML 表格，上市與上櫃的欄位配置相同：
/// 0:代號 1:名稱 2~6:融券(前日餘額/賣出/買進/現券償還/當日餘額) 7:限額
/// 8~12:借券(前日餘額/當日賣出/當日還券/當日調整/當日餘額)
pub(crate) fn parse_ticket_table(
    text: &str,
    date: NaiveDate,
    exchange: StockExchange,
) -> Vec<Ticket> {
    let document = Html::parse_document(text);
    let selector = match Selector::parse("table tr") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let td = match Selector::parse("td") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut result = Vec::with_capacity(1024);
    for tr in document.select(&selector) {
        let cells: Vec<String> = tr
            .select(&td)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 13 || !is_security_code(&cells[0]) {
            continue;
        }

        result.push(Ticket {
            date,
            stock_symbol: cells[0].to_string(),
            name: cells[1].to_string(),
            short_sale_balance: parse_i64(&cells[6], None).unwrap_or_default(),
            borrow_balance: parse_i64(&cells[12], None).unwrap_or_default(),
            exchange_id: exchange.serial_number(),
            create_time: Local::now(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKET_HTML: &str = r#"
    <html><body><table>
      <tr><th>股票代號</th><th>股票名稱</th></tr>
      <tr>
        <td>2330</td><td>台積電</td>
        <td>1,000</td><td>200</td><td>100</td><td>0</td><td>1,100</td><td>999,999</td>
        <td>5,000</td><td>300</td><td>100</td><td>0</td><td>5,200</td><td>999,999</td>
      </tr>
      <tr><td>合計</td><td></td><td>1,000</td></tr>
    </table></body></html>"#;

    #[test]
    fn parse_ticket_table_should_work() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        let tickets = parse_ticket_table(TICKET_HTML, date, StockExchange::TWSE);
        assert_eq!(tickets.len(), 1);
        let t = &tickets[0];
        assert_eq!(t.stock_symbol, "2330");
        assert_eq!(t.name, "台積電");
        assert_eq!(t.short_sale_balance, 1100);
        assert_eq!(t.borrow_balance, 5200);
        assert_eq!(t.exchange_id, StockExchange::TWSE.serial_number());
    }
}
