use crate::db::store::{RecordStore, FIRST_INVOICE_ID};
use crate::error::BillingError;
use crate::models::{BillingRecord, Client, InvoiceChanges, NewBillingRecord, TaxRate};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub const CLIENTS_FILE: &str = "clients.csv";
pub const BILLING_FILE: &str = "billing_records.csv";
pub const TAX_RATES_FILE: &str = "tax_rates.csv";

/// 内存中的三张表 (启动时从 CSV 载入)
#[derive(Debug, Default)]
struct Tables {
    clients: Vec<Client>,
    invoices: Vec<BillingRecord>,
    tax_rates: Vec<TaxRate>,
}

/// CSV 文件存储
///
/// 读操作持读锁并返回快照；写操作持写锁，在阻塞线程池中先写临时文件再
/// rename 覆盖，落盘成功后才更新内存，因此失败的写入不会留下部分状态。
pub struct CsvStore {
    dir: PathBuf,
    tables: RwLock<Tables>,
}

impl CsvStore {
    /// 打开数据目录 (不存在则创建)，缺失的文件视为空表
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, BillingError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let mut clients: Vec<Client> = read_table(&dir.join(CLIENTS_FILE))?;
        let mut invoices: Vec<BillingRecord> = read_table(&dir.join(BILLING_FILE))?;
        let mut tax_rates: Vec<TaxRate> = read_table(&dir.join(TAX_RATES_FILE))?;
        clients.sort_by_key(|c| c.client_id);
        invoices.sort_by_key(|r| r.invoice_id);
        for rate in tax_rates.iter_mut() {
            rate.state = rate.state.trim().to_ascii_uppercase();
        }
        tax_rates.sort_by(|a, b| a.state.cmp(&b.state));

        tracing::info!(
            "CSV store opened at {}: {} clients, {} invoices, {} tax rates",
            dir.display(),
            clients.len(),
            invoices.len(),
            tax_rates.len()
        );

        Ok(Self {
            dir,
            tables: RwLock::new(Tables {
                clients,
                invoices,
                tax_rates,
            }),
        })
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, BillingError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// 在阻塞线程池中整表重写，成功后交回行数据
async fn persist<T>(path: PathBuf, rows: Vec<T>) -> Result<Vec<T>, BillingError>
where
    T: Serialize + Send + 'static,
{
    tokio::task::spawn_blocking(move || write_table(&path, &rows).map(|()| rows))
        .await
        .map_err(|e| BillingError::Internal(format!("csv write task failed: {e}")))?
}

/// 整表重写: 临时文件 + rename
fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), BillingError> {
    let tmp = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    drop(writer);
    std::fs::rename(&tmp, path)?;
    tracing::debug!("Rewrote {} ({} rows)", path.display(), rows.len());
    Ok(())
}

#[async_trait]
impl RecordStore for CsvStore {
    async fn list_clients(&self) -> Result<Vec<Client>, BillingError> {
        Ok(self.tables.read().await.clients.clone())
    }

    async fn get_client(&self, client_id: i64) -> Result<Option<Client>, BillingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned())
    }

    async fn insert_client(&self, client: &Client) -> Result<(), BillingError> {
        let mut tables = self.tables.write().await;
        if tables.clients.iter().any(|c| c.client_id == client.client_id) {
            return Err(BillingError::DuplicateKey {
                field: "clientID",
                value: client.client_id.to_string(),
            });
        }
        if tables.clients.iter().any(|c| c.has_email(&client.email)) {
            return Err(BillingError::DuplicateKey {
                field: "email",
                value: client.email.clone(),
            });
        }

        let mut clients = tables.clients.clone();
        let pos = clients.partition_point(|c| c.client_id < client.client_id);
        clients.insert(pos, client.clone());
        tables.clients = persist(self.dir.join(CLIENTS_FILE), clients).await?;
        Ok(())
    }

    async fn list_invoices(&self) -> Result<Vec<BillingRecord>, BillingError> {
        Ok(self.tables.read().await.invoices.clone())
    }

    async fn list_invoices_for_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<BillingRecord>, BillingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .invoices
            .iter()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn insert_invoice(
        &self,
        record: &NewBillingRecord,
    ) -> Result<BillingRecord, BillingError> {
        let mut tables = self.tables.write().await;
        if !tables.clients.iter().any(|c| c.client_id == record.client_id) {
            return Err(BillingError::client_not_found(record.client_id));
        }

        let invoice_id = tables
            .invoices
            .iter()
            .map(|r| r.invoice_id)
            .max()
            .map_or(FIRST_INVOICE_ID, |max| (max + 1).max(FIRST_INVOICE_ID));
        let created = record.clone().into_record(invoice_id);

        let mut invoices = tables.invoices.clone();
        invoices.push(created.clone());
        tables.invoices = persist(self.dir.join(BILLING_FILE), invoices).await?;
        Ok(created)
    }

    async fn update_invoice(
        &self,
        invoice_id: i64,
        changes: &InvoiceChanges,
    ) -> Result<BillingRecord, BillingError> {
        let mut tables = self.tables.write().await;
        let idx = tables
            .invoices
            .iter()
            .position(|r| r.invoice_id == invoice_id)
            .ok_or_else(|| BillingError::invoice_not_found(invoice_id))?;

        let mut invoices = tables.invoices.clone();
        changes.apply_to(&mut invoices[idx]);
        let updated = invoices[idx].clone();
        tables.invoices = persist(self.dir.join(BILLING_FILE), invoices).await?;
        Ok(updated)
    }

    async fn get_tax_rate(&self, state: &str) -> Result<Option<BigDecimal>, BillingError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tax_rates
            .iter()
            .find(|r| r.state == state)
            .map(|r| r.rate.clone()))
    }

    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, BillingError> {
        Ok(self.tables.read().await.tax_rates.clone())
    }

    async fn close(&self) {
        tracing::info!("CSV store at {} closed", self.dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::str::FromStr;
    use tempfile::TempDir;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn client(id: i64, email: &str) -> Client {
        Client {
            client_id: id,
            business_name: format!("Business {id}"),
            contact_name: "Jane Roe".into(),
            phone_number: "555-0100".into(),
            email: email.into(),
            address: "1 Main St".into(),
            state: "TX".into(),
            zipcode: "02134".into(),
            notes: String::new(),
            industry: "Retail".into(),
            created_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    fn draft(client_id: i64) -> NewBillingRecord {
        NewBillingRecord {
            client_id,
            business_name: format!("Business {client_id}"),
            service: "Consulting".into(),
            amount_usd: dec("500"),
            tax_rate: dec("8.25"),
            discount_percent: dec("5"),
            status: "Pending".into(),
            date_updated: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            time_updated: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            tax_amount: dec("41.25"),
            discount_amount: dec("25.00"),
            final_total: dec("516.25"),
            notes: None,
        }
    }

    #[tokio::test]
    async fn opens_empty_directory() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::open(dir.path().join("data")).unwrap();
        assert!(store.list_clients().await.unwrap().is_empty());
        assert!(store.list_invoices().await.unwrap().is_empty());
        assert!(store.get_tax_rate("TX").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_id_and_email() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        store.insert_client(&client(1, "info@acme.com")).await.unwrap();

        let err = store.insert_client(&client(1, "other@acme.com")).await.unwrap_err();
        assert!(matches!(err, BillingError::DuplicateKey { field: "clientID", .. }));

        let err = store.insert_client(&client(2, " INFO@acme.com")).await.unwrap_err();
        assert!(matches!(err, BillingError::DuplicateKey { field: "email", .. }));

        let clients = store.list_clients().await.unwrap();
        assert_eq!(clients, vec![client(1, "info@acme.com")]);
    }

    #[tokio::test]
    async fn assigns_sequential_invoice_ids() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        store.insert_client(&client(1, "a@a.com")).await.unwrap();

        let first = store.insert_invoice(&draft(1)).await.unwrap();
        let second = store.insert_invoice(&draft(1)).await.unwrap();
        assert_eq!(first.invoice_id, FIRST_INVOICE_ID);
        assert_eq!(second.invoice_id, FIRST_INVOICE_ID + 1);
    }

    #[tokio::test]
    async fn invoice_for_unknown_client_is_not_written() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();

        let err = store.insert_invoice(&draft(99)).await.unwrap_err();
        assert!(matches!(err, BillingError::NotFound { entity: "Client", .. }));
        assert!(store.list_invoices().await.unwrap().is_empty());
        assert!(!dir.path().join(BILLING_FILE).exists());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = CsvStore::open(dir.path()).unwrap();
            store.insert_client(&client(7, "seven@x.com")).await.unwrap();
            store.insert_invoice(&draft(7)).await.unwrap();
        }

        let store = CsvStore::open(dir.path()).unwrap();
        assert_eq!(store.get_client(7).await.unwrap(), Some(client(7, "seven@x.com")));
        let invoices = store.list_invoices().await.unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].final_total, dec("516.25"));
        assert_eq!(invoices[0].notes, None);
        assert_eq!(store.list_invoices_for_client(7).await.unwrap().len(), 1);
        assert!(store.list_invoices_for_client(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_keeps_notes_when_absent() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        store.insert_client(&client(1, "a@a.com")).await.unwrap();
        let mut seeded = draft(1);
        seeded.notes = Some("net 30".into());
        let created = store.insert_invoice(&seeded).await.unwrap();

        let changes = InvoiceChanges {
            service: "Design".into(),
            amount_usd: dec("100"),
            tax_rate: dec("0"),
            discount_percent: dec("0"),
            status: "Paid".into(),
            tax_amount: dec("1.11"),
            discount_amount: dec("2.22"),
            final_total: dec("3.33"),
            notes: None,
            date_updated: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time_updated: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        };
        let updated = store.update_invoice(created.invoice_id, &changes).await.unwrap();
        assert_eq!(updated.final_total, dec("3.33"));
        assert_eq!(updated.status, "Paid");
        assert_eq!(updated.notes.as_deref(), Some("net 30"));
        assert_eq!(updated.business_name, created.business_name);

        let err = store.update_invoice(1, &changes).await.unwrap_err();
        assert!(matches!(err, BillingError::NotFound { entity: "Invoice", .. }));
    }

    #[tokio::test]
    async fn persist_writes_off_runtime_and_returns_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CLIENTS_FILE);
        let rows = vec![client(1, "a@a.com"), client(2, "b@b.com")];

        let returned = persist(path.clone(), rows.clone()).await.unwrap();
        assert_eq!(returned, rows);
        assert!(!path.with_extension("csv.tmp").exists());
        let reread: Vec<Client> = read_table(&path).unwrap();
        assert_eq!(reread, rows);
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let store = CsvStore::open(&data).unwrap();
        store.insert_client(&client(1, "a@a.com")).await.unwrap();

        std::fs::remove_dir_all(&data).unwrap();
        let err = store.insert_client(&client(2, "b@b.com")).await.unwrap_err();
        assert!(matches!(err, BillingError::Internal(_)));
        assert_eq!(store.list_clients().await.unwrap(), vec![client(1, "a@a.com")]);
    }

    #[tokio::test]
    async fn reads_tax_rate_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(TAX_RATES_FILE),
            "state,rate\nTX,8.0\nny,8.875\nCA,7.5\n",
        )
        .unwrap();
        let store = CsvStore::open(dir.path()).unwrap();

        assert_eq!(store.get_tax_rate("NY").await.unwrap(), Some(dec("8.875")));
        let states: Vec<String> = store
            .list_tax_rates()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.state)
            .collect();
        assert_eq!(states, vec!["CA", "NY", "TX"]);
    }
}
