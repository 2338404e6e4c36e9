pub mod csv_store;
pub mod export;
pub mod pool;
pub mod postgres;
pub mod store;

pub use csv_store::CsvStore;
pub use export::export_to_csv;
pub use pool::create_pool;
pub use postgres::PgStore;
pub use store::RecordStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::BillingError;
use std::sync::Arc;

/// 按配置打开存储 (进程启动时调用一次)
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>, BillingError> {
    match config.backend {
        StorageBackend::Csv => {
            let store = CsvStore::open(&config.data_dir)?;
            Ok(Arc::new(store))
        }
        StorageBackend::Postgres => {
            let pool = create_pool(config).await?;
            tracing::info!("Database pool created");
            let store = PgStore::new(pool);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
