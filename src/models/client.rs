use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 客户 (clients 表 / clients.csv)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "clientID")]
    pub client_id: i64,
    pub business_name: String,
    pub contact_name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub state: String,     // 两位州代码，用于查税率
    pub zipcode: String,
    pub notes: String,
    pub industry: String,
    pub created_date: NaiveDate,
}

impl Client {
    /// 邮箱唯一性比较: 去空白、忽略大小写
    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}
