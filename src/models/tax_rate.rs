use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 州税率 (tax_rates 表 / tax_rates.csv)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TaxRate {
    pub state: String,
    #[serde(with = "crate::models::amount")]
    pub rate: BigDecimal, // 百分比，8.25 表示 8.25%
}
