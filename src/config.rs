use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件 (可用 BILLING_CONFIG 指定其他路径)
pub const DEFAULT_CONFIG_FILE: &str = "billing.toml";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Csv,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,      // csv 后端的数据目录
    pub database_url: String,   // postgres 后端
    pub max_connections: u32,
    pub slow_statement_ms: u64, // 超过该耗时的 SQL 以 WARN 记录
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// 未配置税率的州使用的默认税率 (%)
    pub default_tax_rate: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5001,
            },
            storage: StorageConfig {
                backend: StorageBackend::Csv,
                data_dir: PathBuf::from("./data"),
                database_url: "postgres://localhost/billing".to_string(),
                max_connections: 20,
                slow_statement_ms: 2000,
            },
            billing: BillingConfig {
                default_tax_rate: 8.0,
            },
        }
    }
}

impl StorageConfig {
    pub fn slow_statement_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_statement_ms)
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> billing.toml -> BILLING__* 环境变量 -> 旧环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("BILLING_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Some(Path::new(&path)))
    }

    /// 从指定文件加载 (文件不存在时忽略)
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder
            .add_source(
                Environment::with_prefix("BILLING")
                    .separator("__")
                    .try_parsing(true),
            )
            // 兼容 SERVER_HOST / SERVER_PORT / DATABASE_URL
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("storage.database_url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
