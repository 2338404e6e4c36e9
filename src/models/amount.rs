//! 金额字段的序列化: 内存中为 BigDecimal，JSON/CSV 中为数字

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;
use std::str::FromStr;

/// 将 f64 按其最短十进制表示转换 (8.25 -> 8.25，而非二进制展开)
pub fn from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

/// 有效数字上限: 不超过 15 位的十进制数经 f64 (JSON / CSV) 往返后不变
pub const MAX_SIGNIFICANT_DIGITS: i64 = 15;
/// 整数部分位数上限
pub const MAX_INTEGER_DIGITS: i64 = 13;
/// 小数位数上限
pub const MAX_SCALE: i64 = 10;
/// 可解析文本的最大长度
const MAX_TEXT_LEN: usize = 64;

/// 解析十进制字符串，允许首尾空白
pub fn parse(text: &str) -> Option<BigDecimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_TEXT_LEN {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}

/// 检查金额能否无损存储
///
/// 只做字符串与 i64 运算，指数极大 (如 1e-2000000) 时也不会展开数字。
pub fn check_bounds(value: &BigDecimal) -> Result<(), String> {
    let (digits, exponent) = value.as_bigint_and_exponent();
    let text = digits.to_string();
    let magnitude = text.trim_start_matches('-');
    let significant = magnitude.trim_end_matches('0');
    if significant.is_empty() {
        return Ok(());
    }

    let trailing_zeros = (magnitude.len() - significant.len()) as i64;
    let scale = exponent.saturating_sub(trailing_zeros);
    let precision = significant.len() as i64;
    let integer_digits = precision.saturating_sub(scale);

    if scale > MAX_SCALE {
        return Err(format!("more than {MAX_SCALE} decimal places"));
    }
    if precision > MAX_SIGNIFICANT_DIGITS {
        return Err(format!("more than {MAX_SIGNIFICANT_DIGITS} significant digits"));
    }
    if integer_digits > MAX_INTEGER_DIGITS {
        return Err(format!("more than {MAX_INTEGER_DIGITS} integer digits"));
    }
    Ok(())
}

pub fn serialize<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let number = value
        .to_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| <S::Error as serde::ser::Error>::custom(format!("amount out of range: {value}")))?;
    serializer.serialize_f64(number)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = BigDecimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        from_f64(v).ok_or_else(|| E::custom(format!("not a finite number: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse(v).ok_or_else(|| E::custom(format!("not a decimal number: {v:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "crate::models::amount")]
        value: BigDecimal,
    }

    #[test]
    fn from_f64_keeps_short_representation() {
        assert_eq!(from_f64(8.25).unwrap().to_string(), "8.25");
        assert_eq!(from_f64(8.875).unwrap().to_string(), "8.875");
        assert!(from_f64(f64::NAN).is_none());
        assert!(from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let w: Wrapper = serde_json::from_str(r#"{"value": 41.25}"#).unwrap();
        assert_eq!(w.value, BigDecimal::from_str("41.25").unwrap());

        let w: Wrapper = serde_json::from_str(r#"{"value": " 500 "}"#).unwrap();
        assert_eq!(w.value, BigDecimal::from(500i64));

        assert!(serde_json::from_str::<Wrapper>(r#"{"value": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"value": true}"#).is_err());
    }

    #[test]
    fn bounds_accept_money_values() {
        for text in ["0", "0.00", "516.25", "8.875", "1234567890123.45", "0.0000000001", "-50.00"] {
            let value = BigDecimal::from_str(text).unwrap();
            assert!(check_bounds(&value).is_ok(), "{text} should be accepted");
        }
        // 末尾的 0 不计入精度
        assert!(check_bounds(&BigDecimal::from_str("25.000000000000").unwrap()).is_ok());
    }

    #[test]
    fn bounds_reject_unrepresentable_values() {
        for text in [
            "1e400",
            "1e20",
            "12345678901234567.89",
            "0.00000000001",
            "1e-2000000",
            "1e2000000",
        ] {
            let value = BigDecimal::from_str(text).unwrap();
            assert!(check_bounds(&value).is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn parse_rejects_oversized_text() {
        assert!(parse(&"9".repeat(65)).is_none());
        assert_eq!(parse(" 41.25 "), Some(BigDecimal::from_str("41.25").unwrap()));
    }

    #[test]
    fn serializes_as_json_number() {
        let w = Wrapper {
            value: BigDecimal::from_str("516.25").unwrap(),
        };
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"value":516.25}"#);
    }
}
