use crate::error::BillingError;
use crate::models::{BillingRecord, Client, InvoiceChanges, NewBillingRecord, TaxRate};
use async_trait::async_trait;
use bigdecimal::BigDecimal;

/// 新发票号起始值 (九位数，与历史数据一致)
pub const FIRST_INVOICE_ID: i64 = 100_000_001;

/// 持久化接口: CSV 文件与 PostgreSQL 两种实现
///
/// 每个写操作都是原子的: 要么完整落盘，要么不产生任何变化。
/// 同一记录的并发写入串行化，后写者整体覆盖。
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 全部客户，按 clientID 排序
    async fn list_clients(&self) -> Result<Vec<Client>, BillingError>;

    async fn get_client(&self, client_id: i64) -> Result<Option<Client>, BillingError>;

    /// 插入客户；clientID 或 email 重复时返回 DuplicateKey
    async fn insert_client(&self, client: &Client) -> Result<(), BillingError>;

    /// 全部账单，按 invoiceID 排序
    async fn list_invoices(&self) -> Result<Vec<BillingRecord>, BillingError>;

    async fn list_invoices_for_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<BillingRecord>, BillingError>;

    /// 分配 invoiceID 并插入；客户不存在时返回 NotFound 且不写入
    async fn insert_invoice(&self, record: &NewBillingRecord)
        -> Result<BillingRecord, BillingError>;

    /// 整体覆盖账单字段；记录不存在时返回 NotFound
    async fn update_invoice(
        &self,
        invoice_id: i64,
        changes: &InvoiceChanges,
    ) -> Result<BillingRecord, BillingError>;

    /// 州税率 (state 已规范化为大写)
    async fn get_tax_rate(&self, state: &str) -> Result<Option<BigDecimal>, BillingError>;

    /// 全部税率，按州排序
    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, BillingError>;

    /// 关闭存储 (进程退出前调用)
    async fn close(&self);
}
