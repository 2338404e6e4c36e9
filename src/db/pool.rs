use crate::config::StorageConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// 按存储配置创建数据库连接池
pub async fn create_pool(storage: &StorageConfig) -> Result<PgPool, sqlx::Error> {
    let connect_options = PgConnectOptions::from_str(&storage.database_url)?
        .log_slow_statements(
            tracing::log::LevelFilter::Warn,
            storage.slow_statement_threshold(),
        );

    tracing::debug!(
        "Connecting to PostgreSQL (max {} connections, slow statement threshold {:?})",
        storage.max_connections,
        storage.slow_statement_threshold()
    );

    PgPoolOptions::new()
        .max_connections(storage.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}
