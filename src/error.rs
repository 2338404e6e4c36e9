use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 业务错误分类，每个操作只返回其中一种
#[derive(Debug, Error)]
pub enum BillingError {
    /// 缺少必填字段 (列出全部缺失字段)
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingField(Vec<String>),

    /// 字段类型或取值非法
    #[error("Invalid value for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// 实体不存在
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// 唯一键冲突
    #[error("Duplicate {field}: '{value}' already exists")]
    DuplicateKey { field: &'static str, value: String },

    /// 存储层或其他意外错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn client_not_found(client_id: i64) -> Self {
        Self::NotFound {
            entity: "Client",
            key: client_id.to_string(),
        }
    }

    pub fn invoice_not_found(invoice_id: i64) -> Self {
        Self::NotFound {
            entity: "Invoice",
            key: invoice_id.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BillingError::MissingField(_) => "MissingField",
            BillingError::InvalidInput { .. } => "InvalidInput",
            BillingError::NotFound { .. } => "NotFound",
            BillingError::DuplicateKey { .. } => "DuplicateKey",
            BillingError::Internal(_) => "Internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::MissingField(_)
            | BillingError::InvalidInput { .. }
            | BillingError::DuplicateKey { .. } => StatusCode::BAD_REQUEST,
            BillingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::Internal(format!("database: {err}"))
    }
}

impl From<csv::Error> for BillingError {
    fn from(err: csv::Error) -> Self {
        BillingError::Internal(format!("csv: {err}"))
    }
}

impl From<std::io::Error> for BillingError {
    fn from(err: std::io::Error) -> Self {
        BillingError::Internal(format!("io: {err}"))
    }
}

impl From<JsonRejection> for BillingError {
    fn from(rejection: JsonRejection) -> Self {
        BillingError::invalid("body", rejection.body_text())
    }
}

impl From<PathRejection> for BillingError {
    fn from(rejection: PathRejection) -> Self {
        BillingError::invalid("path", rejection.body_text())
    }
}

impl From<QueryRejection> for BillingError {
    fn from(rejection: QueryRejection) -> Self {
        BillingError::invalid("query", rejection.body_text())
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            BillingError::Internal(_) => tracing::error!("Request failed: {}", self),
            _ => tracing::warn!("Request rejected: {}", self),
        }

        let body = match &self {
            BillingError::MissingField(fields) => json!({
                "error": self.to_string(),
                "kind": self.kind(),
                "fields": fields,
            }),
            _ => json!({
                "error": self.to_string(),
                "kind": self.kind(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
