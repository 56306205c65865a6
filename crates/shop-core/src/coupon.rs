//! 할인 쿠폰 코덱.
//!
//! 쿠폰 평문은 `<MON><YY>-<할인율>` 형식(예: `MAR24-20`)이며, Z85 문자 집합으로
//! 인코딩해 구조가 드러나지 않는 짧은 문자열로 만듭니다.
//!
//! 쿠폰은 생성한 달에만 유효합니다. 유효성은 생성 시점이 아니라 사용 시점의
//! 달/연도와 비교해 판단합니다.
//!
//! Z85 문자 집합에는 `/`, `?`, `#` 등이 포함되므로 URL 경로에 넣을 때는
//! 퍼센트 인코딩이 필요합니다.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// 쿠폰 평문 문법: 3글자 월 + 2자리 연도 + `-` + 1~2자리 할인율.
static COUPON_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)([0-9]{2})-([0-9]{1,2})$")
        .expect("coupon grammar regex")
});

/// 최대 할인율 (문법상 두 자리).
pub const MAX_DISCOUNT_PERCENT: u8 = 99;

/// 쿠폰 생성 에러.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    #[error("할인율은 0~{max} 사이여야 합니다: {0}", max = MAX_DISCOUNT_PERCENT)]
    DiscountOutOfRange(u8),
}

/// 디코딩된 쿠폰.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    /// 유효 월 (예: "MAR24")
    pub valid_month: String,
    /// 할인율 (%)
    pub discount_percent: u8,
}

impl Coupon {
    /// 쿠폰 코드를 디코딩하고 문법을 검사합니다. 유효 월은 확인하지 않습니다.
    pub fn parse(code: &str) -> Option<Self> {
        let plain = codec::decode(code)?;
        let plain = String::from_utf8(plain).ok()?;
        let caps = COUPON_GRAMMAR.captures(&plain)?;

        Some(Self {
            valid_month: format!("{}{}", &caps[1], &caps[2]),
            discount_percent: caps[3].parse().ok()?,
        })
    }

    /// 주어진 날짜가 쿠폰의 유효 월에 속하는지 확인.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_month == month_tag(date)
    }

    /// 할인 적용 금액 (소수점 둘째 자리 반올림).
    pub fn apply_to(&self, total: Decimal) -> Decimal {
        let remaining = Decimal::from(100 - u32::from(self.discount_percent)) / Decimal::from(100);
        (total * remaining).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// `MMMYY` 형식의 월 태그 (예: 2024-03-15 → "MAR24").
pub fn month_tag(date: NaiveDate) -> String {
    date.format("%b%y").to_string().to_uppercase()
}

/// 주어진 날짜의 달에만 유효한 쿠폰 코드를 생성합니다.
pub fn generate(discount_percent: u8, date: NaiveDate) -> Result<String, CouponError> {
    if discount_percent > MAX_DISCOUNT_PERCENT {
        return Err(CouponError::DiscountOutOfRange(discount_percent));
    }

    let plain = format!("{}-{}", month_tag(date), discount_percent);
    Ok(codec::encode(plain.as_bytes()))
}

/// 쿠폰을 `today` 기준으로 사용합니다.
///
/// 디코딩 실패, 문법 불일치, 다른 달의 쿠폰은 모두 `None`입니다.
pub fn redeem(code: &str, today: NaiveDate) -> Option<u8> {
    let coupon = Coupon::parse(code)?;
    if coupon.is_valid_on(today) {
        Some(coupon.discount_percent)
    } else {
        tracing::debug!(valid_month = %coupon.valid_month, "Coupon outside its validity month");
        None
    }
}

/// 현재 날짜(UTC) 기준으로 쿠폰을 사용합니다.
pub fn redeem_now(code: &str) -> Option<u8> {
    redeem(code, Utc::now().date_naive())
}

/// Z85 코덱 래퍼.
///
/// 4의 배수가 아닌 입력은 NUL로 채워 인코딩하고, 디코딩 시 끝의 NUL을 제거합니다.
/// 쿠폰 평문에는 NUL이 없으므로 왕복이 보존됩니다. 길이가 5의 배수가 아닌 코드는 거부합니다.
mod codec {
    pub fn encode(plain: &[u8]) -> String {
        let mut block = plain.to_vec();
        block.resize(plain.len().div_ceil(4) * 4, 0);
        z85::encode(block)
    }

    pub fn decode(text: &str) -> Option<Vec<u8>> {
        if text.len() % 5 != 0 {
            return None;
        }
        let mut out = z85::decode(text).ok()?;
        while out.last() == Some(&0) {
            out.pop();
        }
        Some(out)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_reference_vector() {
            let bytes = [0x86, 0x4F, 0xD2, 0x6F, 0xB5, 0x59, 0xF7, 0x5B];
            assert_eq!(encode(&bytes), "HelloWorld");
            assert_eq!(decode("HelloWorld").unwrap(), bytes.to_vec());
        }

        #[test]
        fn test_pads_partial_block() {
            let code = encode(b"MAR24-5");
            assert_eq!(code.len(), 10);
            assert_eq!(decode(&code).unwrap(), b"MAR24-5".to_vec());
        }

        #[test]
        fn test_rejects_bad_input() {
            assert!(decode("abcd").is_none()); // 길이
            assert!(decode("abc\"d").is_none()); // 문자 집합 밖
        }
    }
}
