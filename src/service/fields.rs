//! 请求字段的校验与转换

use crate::error::BillingError;
use crate::models::amount;
use bigdecimal::BigDecimal;
use serde_json::Value;

/// 非空文本 (去首尾空白)，空串视为缺失
pub fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// JSON 值是否视为缺失: 不存在 / null / 空白字符串
pub fn is_blank(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// 收集缺失字段名
pub fn missing<'a>(checks: impl IntoIterator<Item = (&'a str, bool)>) -> Vec<String> {
    checks
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// 解析整数 ID (数字或数字字符串)
pub fn integer(field: &str, value: &Value) -> Result<i64, BillingError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| BillingError::invalid(field, format!("expected an integer, got {value}")))
}

/// 解析十进制数 (数字或数字字符串)，超出可存储范围的值视为非法
pub fn decimal(field: &str, value: &Value) -> Result<BigDecimal, BillingError> {
    let parsed = match value {
        Value::Number(n) => amount::parse(&n.to_string()),
        Value::String(s) => amount::parse(s),
        _ => None,
    };
    let number =
        parsed.ok_or_else(|| BillingError::invalid(field, format!("expected a number, got {value}")))?;
    amount::check_bounds(&number).map_err(|reason| BillingError::invalid(field, reason))?;
    Ok(number)
}

/// 可选十进制数: 缺失返回 None，存在则必须可解析
pub fn optional_decimal(
    field: &str,
    value: &Option<Value>,
) -> Result<Option<BigDecimal>, BillingError> {
    match value {
        v if is_blank(v) => Ok(None),
        Some(v) => decimal(field, v).map(Some),
        None => Ok(None),
    }
}
