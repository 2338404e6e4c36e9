use crate::error::BillingError;
use crate::models::amount;
use bigdecimal::{BigDecimal, One, Zero};

const CENTS_PER_DOLLAR: i64 = 100;

/// 派生金额 (税额 / 折扣额 / 应付总额)
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceTotals {
    pub tax_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub final_total: BigDecimal,
}

/// 四舍五入到分 (half-up，远离零方向)
pub fn round_half_up(value: &BigDecimal) -> BigDecimal {
    let cents = BigDecimal::from(CENTS_PER_DOLLAR);
    let scaled = value.abs() * &cents;
    let mut whole = scaled.with_scale(0); // with_scale 截断小数位
    if (&scaled - &whole) * BigDecimal::from(2i64) >= BigDecimal::one() {
        whole = whole + BigDecimal::one();
    }
    let rounded = (whole / cents).with_scale(2);
    if value < &BigDecimal::zero() {
        -rounded
    } else {
        rounded
    }
}

/// 按百分比计算并取整: round(amount * percent / 100, 2)
fn percent_of(amount: &BigDecimal, percent: &BigDecimal) -> BigDecimal {
    round_half_up(&(amount * percent / BigDecimal::from(CENTS_PER_DOLLAR)))
}

fn ensure_storable(field: &str, value: &BigDecimal) -> Result<(), BillingError> {
    amount::check_bounds(value).map_err(|reason| BillingError::invalid(field, reason))
}

fn ensure_non_negative(field: &str, value: &BigDecimal) -> Result<(), BillingError> {
    ensure_storable(field, value)?;
    if value < &BigDecimal::zero() {
        return Err(BillingError::invalid(field, format!("must not be negative, got {value}")));
    }
    Ok(())
}

/// 计算发票派生金额，每个字段独立取整
///
/// finalTotal 基于已取整的税额与折扣额计算。
pub fn calculate(
    amount_usd: &BigDecimal,
    tax_rate: &BigDecimal,
    discount_percent: &BigDecimal,
) -> Result<InvoiceTotals, BillingError> {
    ensure_non_negative("amountUSD", amount_usd)?;
    ensure_non_negative("taxRate", tax_rate)?;
    ensure_non_negative("discountPercent", discount_percent)?;

    let tax_amount = percent_of(amount_usd, tax_rate);
    let discount_amount = percent_of(amount_usd, discount_percent);
    let final_total = round_half_up(&(amount_usd + &tax_amount - &discount_amount));
    ensure_storable("taxAmount", &tax_amount)?;
    ensure_storable("discountAmount", &discount_amount)?;
    ensure_storable("finalTotal", &final_total)?;

    Ok(InvoiceTotals {
        tax_amount,
        discount_amount,
        final_total,
    })
}
