//! PostgreSQL 存储集成测试，仅在设置 TEST_DATABASE_URL 时运行

use bigdecimal::BigDecimal;
use billing_ledger::config::{AppConfig, StorageBackend, StorageConfig};
use billing_ledger::db::create_pool;
use billing_ledger::models::{Client, InvoiceChanges, NewBillingRecord};
use billing_ledger::{BillingError, PgStore, RecordStore};
use chrono::{Local, NaiveTime};
use std::str::FromStr;

async fn store() -> Option<PgStore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let storage = StorageConfig {
        backend: StorageBackend::Postgres,
        database_url: url,
        max_connections: 2,
        ..AppConfig::default().storage
    };
    let pool = create_pool(&storage).await.expect("connect to test database");
    let store = PgStore::new(pool);
    store.ensure_schema().await.expect("create schema");
    Some(store)
}

/// 每次运行使用不同的 clientID，避免与旧数据冲突
fn unique_id() -> i64 {
    Local::now().timestamp_micros()
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn client(id: i64) -> Client {
    Client {
        client_id: id,
        business_name: "Pg Test Co".into(),
        contact_name: "Jane Roe".into(),
        phone_number: "555-0100".into(),
        email: format!("pg-{id}@example.com"),
        address: String::new(),
        state: "TX".into(),
        zipcode: String::new(),
        notes: String::new(),
        industry: String::new(),
        created_date: Local::now().date_naive(),
    }
}

fn draft(client_id: i64) -> NewBillingRecord {
    NewBillingRecord {
        client_id,
        business_name: "Pg Test Co".into(),
        service: "Consulting".into(),
        amount_usd: dec("500"),
        tax_rate: dec("8.25"),
        discount_percent: dec("5"),
        status: "Pending".into(),
        date_updated: Local::now().date_naive(),
        time_updated: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        tax_amount: dec("41.25"),
        discount_amount: dec("25.00"),
        final_total: dec("516.25"),
        notes: Some("pg".into()),
    }
}

#[tokio::test]
async fn client_round_trip_and_duplicates() {
    let Some(store) = store().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let id = unique_id();
    let original = client(id);
    store.insert_client(&original).await.unwrap();
    assert_eq!(store.get_client(id).await.unwrap(), Some(original.clone()));

    let err = store.insert_client(&client(id)).await.unwrap_err();
    assert!(matches!(err, BillingError::DuplicateKey { field: "clientID", .. }));

    let mut same_email = client(id + 1);
    same_email.email = original.email.to_uppercase();
    let err = store.insert_client(&same_email).await.unwrap_err();
    assert!(matches!(err, BillingError::DuplicateKey { field: "email", .. }));
    store.close().await;
}

#[tokio::test]
async fn invoice_insert_and_update() {
    let Some(store) = store().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let id = unique_id() + 7;
    store.insert_client(&client(id)).await.unwrap();

    let created = store.insert_invoice(&draft(id)).await.unwrap();
    assert_eq!(created.final_total, dec("516.25"));

    let err = store.insert_invoice(&draft(-id)).await.unwrap_err();
    assert!(matches!(err, BillingError::NotFound { entity: "Client", .. }));

    let changes = InvoiceChanges {
        service: "Design".into(),
        amount_usd: dec("10"),
        tax_rate: dec("0"),
        discount_percent: dec("0"),
        status: "Paid".into(),
        tax_amount: dec("1"),
        discount_amount: dec("2"),
        final_total: dec("3"),
        notes: None,
        date_updated: Local::now().date_naive(),
        time_updated: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
    };
    let updated = store.update_invoice(created.invoice_id, &changes).await.unwrap();
    assert_eq!(updated.final_total, dec("3"));
    assert_eq!(updated.notes.as_deref(), Some("pg"));

    let mine = store.list_invoices_for_client(id).await.unwrap();
    assert_eq!(mine, vec![updated]);

    let err = store.update_invoice(-1, &changes).await.unwrap_err();
    assert!(matches!(err, BillingError::NotFound { entity: "Invoice", .. }));
    store.close().await;
}
