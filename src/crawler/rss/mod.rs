use anyhow::Result;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{database::table::news::News, logging, util};

static ITEM_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)<item>(.*?)</item>").ok());
static TITLE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)<title>(.*?)</title>").ok());
static DESCRIPTION_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)<description>(.*?)</description>").ok());
static LINK_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)<link>(.*?)</link>").ok());
static PUB_DATE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)<pubDate>(.*?)</pubDate>").ok());

/// 抓取單一 RSS 來源的新聞列表
pub async fn visit(source: &str) -> Result<Vec<News>> {
    let xml = util::http::get(source, None).await?;
    let news = parse(&xml, source);
    if news.is_empty() {
        logging::warn_file_async(format!("RSS 來源沒有任何新聞項目 source:{}", source));
    }

    Ok(news)
}

fn parse(xml: &str, source: &str) -> Vec<News> {
    let item_re = match ITEM_RE.as_ref() {
        Some(re) => re,
        None => return Vec::new(),
    };

    let mut result = Vec::with_capacity(64);
    for captures in item_re.captures_iter(xml) {
        let item = match captures.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };

        let link = extract(&LINK_RE, item);
        if link.is_empty() {
            continue;
        }

        result.push(News {
            source: source.to_string(),
            title: extract(&TITLE_RE, item),
            description: extract(&DESCRIPTION_RE, item),
            link,
            pub_date: parse_pub_date(&extract(&PUB_DATE_RE, item)),
            create_time: Local::now(),
        });
    }

    result
}

fn extract(re: &Lazy<Option<Regex>>, item: &str) -> String {
    let captured = re
        .as_ref()
        .and_then(|re| re.captures(item))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();

    decode_text(captured)
}

/// 去掉 CDATA 包裝並還原常見的 XML 實體
fn decode_text(s: &str) -> String {
    let s = s.trim();
    let s = s
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
        .unwrap_or(s);

    s.trim()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn parse_pub_date(s: &str) -> Option<DateTime<Local>> {
    if s.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(s)
        .map(|dt| dt.with_timezone(&Local))
        .ok()
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>財經新聞</title>
  <item>
    <title><![CDATA[台積電法說會釋出樂觀展望]]></title>
    <description><![CDATA[先進製程需求強勁 &amp; 產能滿載]]></description>
    <link>https://news.example.com/a/123</link>
    <pubDate>Thu, 08 May 2025 16:30:00 +0800</pubDate>
  </item>
  <item>
    <title>櫃買市場盤後統計</title>
    <description>成交量縮</description>
    <link>https://news.example.com/a/124</link>
    <pubDate>not a date</pubDate>
  </item>
  <item>
    <title>沒有連結的項目</title>
  </item>
</channel></rss>"#;

    #[test]
    fn parse_should_work() {
        let news = parse(XML, "https://news.example.com/rss");
        assert_eq!(news.len(), 2);

        let first = &news[0];
        assert_eq!(first.title, "台積電法說會釋出樂觀展望");
        assert_eq!(first.description, "先進製程需求強勁 & 產能滿載");
        assert_eq!(first.link, "https://news.example.com/a/123");
        let pub_date = first.pub_date.unwrap();
        assert_eq!(pub_date.year(), 2025);

        assert!(news[1].pub_date.is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn visit_should_work() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 rss::visit".to_string());
        match visit("https://tw.stock.yahoo.com/rss?category=news").await {
            Ok(news) => {
                logging::debug_file_async(format!("news:{:#?}", news.first()));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }
        logging::debug_file_async("結束 rss::visit".to_string());
    }
}
