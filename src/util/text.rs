use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

const NUMBER_ESCAPE_CHAR: &[char] = &['元', '%', ',', ' ', '"', '\n', '\r'];

/// Converts a Big5 encoded byte slice to a UTF-8 `String`.
///
/// 交易所的 CSV 端點多以 Big5 回應，解碼時忽略無法對應的字元。
pub fn big5_2_utf8(data: &[u8]) -> Result<String> {
    let (cow, _encoding_used, had_errors) = encoding_rs::BIG5.decode(data);
    if had_errors && cow.is_empty() {
        return Err(anyhow!("Failed to decode the payload as BIG5"));
    }

    Ok(cow.into_owned())
}

/// Parses a decimal value from a given string.
///
/// 數值欄位常含千分位逗號或「元」「%」等符號，先清除再轉型。
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Parses an `i64` value from a given string that may contain thousands separators.
pub fn parse_i64(s: &str, escape_chars: Option<Vec<char>>) -> Result<i64> {
    let cleaned = clean_escape_chars(s, escape_chars);
    i64::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as i64 because: {:?}", cleaned, why))
}

/// Removes a set of escape characters from a given string.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}

/// 將單行 CSV 依逗號切割，雙引號內的逗號視為內容
///
/// 例：`"2330","台積電","33,565,668"` => ["2330", "台積電", "33,565,668"]
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::with_capacity(24);
    let mut field = String::with_capacity(32);
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            _ => field.push(c),
        }
    }

    fields.push(field.trim().to_string());
    fields
}

/// 判斷字串是否像台股證券代號（4~6 碼英數字，且開頭為數字）
pub fn is_security_code(s: &str) -> bool {
    let len = s.chars().count();
    if !(4..=6).contains(&len) {
        return false;
    }

    s.chars().all(|c| c.is_ascii_alphanumeric()) && s.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1,234.56", None).unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("12.5%", None).unwrap(), dec!(12.5));
        assert_eq!(
            parse_decimal("1+234", Some(vec!['+'])).unwrap(),
            dec!(1234)
        );
        assert!(parse_decimal("--", None).is_err());
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64("33,565,668", None).unwrap(), 33_565_668);
        assert!(parse_i64("N/A", None).is_err());
    }

    #[test]
    fn test_split_csv_line() {
        let line = r#""2330","台積電","33,565,668","31,285","1,023.00""#;
        let fields = split_csv_line(line);
        assert_eq!(
            fields,
            vec!["2330", "台積電", "33,565,668", "31,285", "1,023.00"]
        );
    }

    #[test]
    fn test_is_security_code() {
        assert!(is_security_code("2330"));
        assert!(is_security_code("00878"));
        assert!(is_security_code("2330B"));
        assert!(!is_security_code("台積電"));
        assert!(!is_security_code("233"));
        assert!(!is_security_code("證券代號"));
    }

    #[test]
    fn test_big5_2_utf8() {
        // "台" 的 Big5 編碼
        let big5_bytes: [u8; 2] = [0xA5, 0x78];
        let utf8 = big5_2_utf8(&big5_bytes).unwrap();
        assert_eq!(utf8, "台");
    }
}
