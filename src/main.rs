use billing_ledger::{api, models::amount, open_store, AppConfig, BillingService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let default_tax_rate = amount::from_f64(config.billing.default_tax_rate)
        .ok_or("billing.default_tax_rate must be a finite number")?;

    // 打开存储 (进程内唯一的持久化句柄)
    let store = open_store(&config.storage).await?;
    info!("Record store opened ({:?} backend)", config.storage.backend);

    let service = Arc::new(BillingService::new(store.clone(), default_tax_rate));
    let app = api::router(service).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = config.listen_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/clients                      - list clients");
    info!("  GET  /api/clients/:id[/invoices]       - client profile / invoices");
    info!("  POST /api/create-client                - create client");
    info!("  GET  /api/data                         - list invoices");
    info!("  POST /api/create-invoice               - create invoice");
    info!("  PUT  /api/update-invoice               - update invoice");
    info!("  GET  /api/tax-rates[?state=XX]         - tax rates");
    info!("  GET  /api/summary                      - totals by status");
    info!("  GET  /api/export/billing-records.csv   - CSV export");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
