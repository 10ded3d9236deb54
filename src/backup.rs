//! Full-state JSON backups and the accounts CSV.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::balance::customer_balance;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::models::{Area, Branding, Customer, DeliveryLog, PaymentRecord};

pub const CSV_HEADERS: [&str; 6] = [
    "Customer Name",
    "Area",
    "Total Billed (₹)",
    "Total Paid (₹)",
    "Net Dues (₹)",
    "Status",
];

#[derive(Serialize)]
struct BackupRef<'a> {
    areas: &'a [Area],
    customers: &'a [Customer],
    logs: &'a [DeliveryLog],
    payments: &'a [PaymentRecord],
    config: &'a Branding,
}

#[derive(Deserialize)]
struct BackupPayload {
    areas: Vec<Area>,
    customers: Vec<Customer>,
    logs: Vec<DeliveryLog>,
    payments: Vec<PaymentRecord>,
    #[serde(default)]
    config: Option<BackupConfig>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BackupConfig {
    #[serde(default)]
    store_name: Option<String>,
    #[serde(default)]
    store_icon: Option<String>,
}

pub fn export_backup(ledger: &Ledger) -> Result<String> {
    let backup = BackupRef {
        areas: &ledger.areas,
        customers: &ledger.customers,
        logs: &ledger.logs,
        payments: &ledger.payments,
        config: &ledger.branding,
    };
    Ok(serde_json::to_string_pretty(&backup)?)
}

/// Parses a backup into a complete ledger. Nothing is applied here; callers
/// swap the result in only after the user confirms.
pub fn parse_backup(payload: &str) -> Result<Ledger> {
    let backup: BackupPayload = serde_json::from_str(payload).map_err(|err| {
        warn!("Rejected backup payload: {}", err);
        LedgerError::CorruptedBackup(err.to_string())
    })?;

    let defaults = Branding::default();
    let config = backup.config.unwrap_or_default();
    let branding = Branding {
        store_name: config
            .store_name
            .filter(|name| !name.is_empty())
            .unwrap_or(defaults.store_name),
        store_icon: config.store_icon.unwrap_or(defaults.store_icon),
    };

    Ok(Ledger {
        areas: backup.areas,
        customers: backup.customers,
        logs: backup.logs,
        payments: backup.payments,
        branding,
    })
}

pub fn accounts_csv(ledger: &Ledger) -> String {
    let mut lines = vec![CSV_HEADERS.join(",")];
    for customer in &ledger.customers {
        let stats = customer_balance(customer, &ledger.logs, &ledger.payments);
        lines.push(
            [
                quote(&customer.name),
                quote(&customer.area),
                format!("{:.2}", stats.total_billed),
                format!("{:.2}", stats.total_paid),
                format!("{:.2}", stats.net_balance),
                if stats.is_settled() { "Settled" } else { "Pending" }.to_string(),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

pub fn backup_file_name(branding: &Branding, date: NaiveDate) -> String {
    format!("{}_Backup_{}.json", branding.store_name, date.format("%Y-%m-%d"))
}

pub fn accounts_file_name(branding: &Branding, date: NaiveDate) -> String {
    format!("{}_Accounts_{}.csv", branding.store_name, date.format("%Y-%m-%d"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::store::Store;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn export_then_import_restores_everything() {
        let mut ledger = Ledger::seeded(today());
        ledger.record_payment("1", 210.0, "UPI", Utc::now()).unwrap();
        ledger.set_branding("Gokul Dairy", "data:image/png;base64,AAAA");

        let payload = export_backup(&ledger).expect("export");
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        for key in ["areas", "customers", "logs", "payments", "config"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["config"]["storeName"], "Gokul Dairy");

        assert_eq!(parse_backup(&payload).expect("import"), ledger);
    }

    #[test]
    fn import_accepts_browser_app_backups() {
        let payload = r#"{
          "areas": ["North Sector"],
          "customers": [{"id": "abc123xyz", "name": "John Doe", "phone": "9876543210",
            "area": "North Sector", "pricePerLiter": 60, "joinedDate": "2023-01-15",
            "status": "active"}],
          "logs": [{"id": "L1", "customerId": "abc123xyz", "date": "2023-10-02",
            "liters": 3.5, "isPaid": true}],
          "payments": [{"id": "p1", "customerId": "abc123xyz", "amount": 210,
            "date": "2023-10-03T08:15:00.000Z", "method": "Cash",
            "period": "Paid for 1 deliveries"}]
        }"#;
        let ledger = parse_backup(payload).expect("import");
        assert_eq!(ledger.customers[0].id, "abc123xyz");
        assert!(ledger.logs[0].is_paid);
        assert_eq!(ledger.branding, Branding::default());
    }

    #[test]
    fn import_treats_cleared_price_as_default() {
        let payload = r#"{
          "areas": ["North Sector"],
          "customers": [{"id": "c1", "name": "Meena", "phone": "9000000001",
            "area": "North Sector", "pricePerLiter": null, "joinedDate": "2023-04-01",
            "status": "active"}],
          "logs": [{"id": "L1", "customerId": "c1", "date": "2023-10-02",
            "liters": 2, "isPaid": false}],
          "payments": []
        }"#;
        let ledger = parse_backup(payload).expect("import");
        assert_eq!(ledger.customers[0].price_per_liter, 60.0);

        let csv = accounts_csv(&ledger);
        assert!(csv.ends_with("\"Meena\",\"North Sector\",120.00,0.00,120.00,Pending"));
    }

    #[test]
    fn import_with_empty_config_uses_defaults() {
        let payload = r#"{"areas": [], "customers": [], "logs": [], "payments": [],
            "config": {"storeName": ""}}"#;
        let ledger = parse_backup(payload).expect("import");
        assert_eq!(ledger.branding.store_name, "DairyPro Manager");
        assert_eq!(ledger.branding.store_icon, "");
    }

    #[test]
    fn import_missing_logs_is_rejected_and_state_is_unchanged() {
        let mut store = Store::load(MemoryStore::default(), today()).expect("load");
        let before = store.ledger().clone();

        let payload = r#"{"areas": [], "customers": [], "payments": []}"#;
        let result = parse_backup(payload).and_then(|ledger| store.replace(ledger));
        assert!(matches!(result, Err(LedgerError::CorruptedBackup(_))));
        assert_eq!(store.ledger(), &before);
    }

    #[test]
    fn import_rejects_garbage() {
        assert!(matches!(
            parse_backup("{ not json"),
            Err(LedgerError::CorruptedBackup(_))
        ));
        assert!(parse_backup("[]").is_err());
    }

    #[test]
    fn csv_has_header_and_status_per_customer() {
        let mut ledger = Ledger::seeded(today());
        // John owes 3.5 L * 60 = 210 and pays it off; Alice owes 124.
        ledger.record_payment("1", 210.0, "Cash", Utc::now()).unwrap();

        let csv = accounts_csv(&ledger);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Customer Name,Area,Total Billed (₹),Total Paid (₹),Net Dues (₹),Status"
        );
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[1],
            "\"John Doe\",\"North Sector\",210.00,210.00,0.00,Settled"
        );
        assert_eq!(
            lines[2],
            "\"Alice Smith\",\"South Park\",124.00,0.00,124.00,Pending"
        );
        assert!(lines[3].ends_with(",0.00,0.00,0.00,Settled"));
    }

    #[test]
    fn file_names_carry_store_name_and_date() {
        let branding = Branding::default();
        assert_eq!(
            backup_file_name(&branding, today()),
            "DairyPro Manager_Backup_2024-03-10.json"
        );
        assert_eq!(
            accounts_file_name(&branding, today()),
            "DairyPro Manager_Accounts_2024-03-10.csv"
        );
    }
}
