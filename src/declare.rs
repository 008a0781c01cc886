/// 交易所
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockExchange {
    /// 臺灣證券交易所 1
    TWSE,
    /// 證券櫃檯買賣中心 2
    TPEx,
}

impl StockExchange {
    pub fn serial_number(&self) -> i32 {
        match self {
            StockExchange::TWSE => 1,
            StockExchange::TPEx => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StockExchange::TWSE => "上市",
            StockExchange::TPEx => "上櫃",
        }
    }

    pub fn iterator() -> impl Iterator<Item = Self> {
        [Self::TWSE, Self::TPEx].iter().copied()
    }
}

/// 季度
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum Quarter {
    Q1 = 1,
    Q2 = 2,
    Q3 = 3,
    Q4 = 4,
}

impl Quarter {
    pub fn serial(&self) -> i32 {
        *self as i32
    }

    pub fn name(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }

    /// 季報基準日的月份（3、6、9、12）對應的季度
    pub fn from_month(month: u32) -> Option<Quarter> {
        match month {
            1..=3 => Some(Quarter::Q1),
            4..=6 => Some(Quarter::Q2),
            7..=9 => Some(Quarter::Q3),
            10..=12 => Some(Quarter::Q4),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_exchange() {
        assert_eq!(StockExchange::TWSE.serial_number(), 1);
        assert_eq!(StockExchange::TPEx.name(), "上櫃");
        assert_eq!(StockExchange::iterator().count(), 2);
    }

    #[test]
    fn test_quarter_from_month() {
        assert_eq!(Quarter::from_month(3), Some(Quarter::Q1));
        assert_eq!(Quarter::from_month(12), Some(Quarter::Q4));
        assert_eq!(Quarter::from_month(13), None);
        assert_eq!(Quarter::Q3.name(), "Q3");
    }
}
