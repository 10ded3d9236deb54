//! Ledger state mirrored into a [`KeyValueStore`] after every change.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::db::KeyValueStore;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{Area, Branding, Customer, CustomerDraft, DeliveryLog, PaymentRecord};

pub const AREAS_KEY: &str = "dairy_areas";
pub const CUSTOMERS_KEY: &str = "dairy_customers";
pub const LOGS_KEY: &str = "dairy_logs";
pub const PAYMENTS_KEY: &str = "dairy_payments";
pub const STORE_NAME_KEY: &str = "dairy_store_name";
pub const STORE_ICON_KEY: &str = "dairy_store_icon";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Collection {
    Areas,
    Customers,
    Logs,
    Payments,
    Branding,
}

const ALL_COLLECTIONS: [Collection; 5] = [
    Collection::Areas,
    Collection::Customers,
    Collection::Logs,
    Collection::Payments,
    Collection::Branding,
];

pub struct Store<S: KeyValueStore> {
    kv: S,
    ledger: Ledger,
}

impl<S: KeyValueStore> Store<S> {
    /// Reads every key, seeding the ones that are missing or unreadable.
    pub fn load(kv: S, today: NaiveDate) -> Result<Self> {
        let seed = Ledger::seeded(today);
        let defaults = Branding::default();
        let ledger = Ledger {
            areas: read_json(&kv, AREAS_KEY)?.unwrap_or(seed.areas),
            customers: read_json(&kv, CUSTOMERS_KEY)?.unwrap_or(seed.customers),
            logs: read_json(&kv, LOGS_KEY)?.unwrap_or(seed.logs),
            payments: read_json(&kv, PAYMENTS_KEY)?.unwrap_or(seed.payments),
            branding: Branding {
                store_name: kv
                    .get(STORE_NAME_KEY)?
                    .filter(|name| !name.is_empty())
                    .unwrap_or(defaults.store_name),
                store_icon: kv.get(STORE_ICON_KEY)?.unwrap_or(defaults.store_icon),
            },
        };
        info!(
            "Loaded ledger: {} areas, {} customers, {} logs, {} payments",
            ledger.areas.len(),
            ledger.customers.len(),
            ledger.logs.len(),
            ledger.payments.len()
        );

        let mut store = Self { kv, ledger };
        store.persist(&ALL_COLLECTIONS)?;
        Ok(store)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn add_customer(&mut self, draft: CustomerDraft, today: NaiveDate) -> Result<Customer> {
        let customer = self.ledger.add_customer(draft, today)?;
        self.persist(&[Collection::Customers])?;
        Ok(customer)
    }

    pub fn update_customer(&mut self, customer_id: &str, draft: CustomerDraft) -> Result<Customer> {
        let customer = self.ledger.update_customer(customer_id, draft)?;
        self.persist(&[Collection::Customers])?;
        Ok(customer)
    }

    pub fn delete_customer(&mut self, customer_id: &str) -> Result<Customer> {
        let customer = self.ledger.delete_customer(customer_id)?;
        self.persist(&[Collection::Customers])?;
        Ok(customer)
    }

    pub fn add_area(&mut self, name: &str) -> Result<Area> {
        let area = self.ledger.add_area(name)?;
        self.persist(&[Collection::Areas])?;
        Ok(area)
    }

    pub fn delete_area(&mut self, name: &str) -> Result<()> {
        self.ledger.delete_area(name)?;
        self.persist(&[Collection::Areas])
    }

    pub fn upsert_delivery(
        &mut self,
        customer_id: &str,
        date: NaiveDate,
        liters: f64,
    ) -> Result<DeliveryLog> {
        let log = self.ledger.upsert_delivery(customer_id, date, liters)?;
        self.persist(&[Collection::Logs])?;
        Ok(log)
    }

    pub fn record_payment(
        &mut self,
        customer_id: &str,
        amount: f64,
        method: &str,
        now: DateTime<Utc>,
    ) -> Result<PaymentRecord> {
        let record = self
            .ledger
            .record_payment(customer_id, amount, method, now)?;
        self.persist(&[Collection::Payments, Collection::Logs])?;
        Ok(record)
    }

    pub fn set_branding(&mut self, store_name: &str, store_icon: &str) -> Result<Branding> {
        let branding = self.ledger.set_branding(store_name, store_icon);
        self.persist(&[Collection::Branding])?;
        Ok(branding)
    }

    /// Swaps in a fully validated ledger, e.g. one restored from a backup.
    pub fn replace(&mut self, ledger: Ledger) -> Result<()> {
        self.ledger = ledger;
        info!("Replaced ledger state");
        self.persist(&ALL_COLLECTIONS)
    }

    /// Wipes storage and starts again from the sample round.
    pub fn reset(&mut self, today: NaiveDate) -> Result<()> {
        self.kv.clear()?;
        self.ledger = Ledger::seeded(today);
        warn!("Ledger reset to defaults");
        self.persist(&ALL_COLLECTIONS)
    }

    fn persist(&mut self, collections: &[Collection]) -> Result<()> {
        for collection in collections {
            match collection {
                Collection::Areas => {
                    self.kv
                        .set(AREAS_KEY, &serde_json::to_string(&self.ledger.areas)?)?
                }
                Collection::Customers => self.kv.set(
                    CUSTOMERS_KEY,
                    &serde_json::to_string(&self.ledger.customers)?,
                )?,
                Collection::Logs => self
                    .kv
                    .set(LOGS_KEY, &serde_json::to_string(&self.ledger.logs)?)?,
                Collection::Payments => self.kv.set(
                    PAYMENTS_KEY,
                    &serde_json::to_string(&self.ledger.payments)?,
                )?,
                Collection::Branding => {
                    self.kv
                        .set(STORE_NAME_KEY, &self.ledger.branding.store_name)?;
                    self.kv
                        .set(STORE_ICON_KEY, &self.ledger.branding.store_icon)?;
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn kv(&self) -> &S {
        &self.kv
    }
}

fn read_json<T: DeserializeOwned>(kv: &impl KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = kv.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!("Discarding unreadable {}: {}", key, err);
            Ok(None)
        }
    }
}
