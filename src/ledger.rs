//! In-memory ledger state and the commands that mutate it.
//!
//! Commands validate before touching state; a rejected command changes nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::models::{
    new_id, Area, Branding, Customer, CustomerDraft, CustomerStatus, DeliveryLog, PaymentRecord,
    DEFAULT_PAYMENT_METHOD, DEFAULT_PRICE_PER_LITER,
};
use crate::seed;

pub const PARTIAL_PAYMENT_LABEL: &str = "Partial Payment";

/// Slack for float costs such as 1.1 L at 60/L when matching a payment to logs.
const COST_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Ledger {
    pub areas: Vec<Area>,
    pub customers: Vec<Customer>,
    pub logs: Vec<DeliveryLog>,
    pub payments: Vec<PaymentRecord>,
    pub branding: Branding,
}

impl Ledger {
    /// The sample round a fresh install starts with.
    pub fn seeded(today: NaiveDate) -> Self {
        Self {
            areas: seed::default_areas(),
            customers: seed::initial_customers(),
            logs: seed::initial_logs(today),
            payments: Vec::new(),
            branding: Branding::default(),
        }
    }

    pub fn customer(&self, customer_id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == customer_id)
    }

    fn require_customer(&self, customer_id: &str) -> Result<&Customer> {
        self.customer(customer_id)
            .ok_or_else(|| LedgerError::CustomerNotFound(customer_id.to_string()))
    }

    pub fn add_customer(&mut self, draft: CustomerDraft, today: NaiveDate) -> Result<Customer> {
        let (name, phone, area) = validate_draft(&draft)?;
        let customer = Customer {
            id: new_id(),
            name,
            phone,
            area,
            price_per_liter: resolve_price(draft.price_per_liter),
            joined_date: today,
            status: CustomerStatus::Active,
        };
        info!("Added customer {} ({})", customer.name, customer.id);
        self.customers.push(customer.clone());
        Ok(customer)
    }

    /// Overwrites the editable fields; id and join date are kept.
    pub fn update_customer(&mut self, customer_id: &str, draft: CustomerDraft) -> Result<Customer> {
        let (name, phone, area) = validate_draft(&draft)?;
        if let Some(price) = draft.price_per_liter {
            if !price.is_finite() || price <= 0.0 {
                return Err(LedgerError::InvalidInput(format!(
                    "price per liter must be positive, got {}",
                    price
                )));
            }
        }
        let customer = self
            .customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| LedgerError::CustomerNotFound(customer_id.to_string()))?;

        customer.name = name;
        customer.phone = phone;
        customer.area = area;
        if let Some(price) = draft.price_per_liter {
            customer.price_per_liter = price;
        }
        if let Some(status) = draft.status {
            customer.status = status;
        }
        info!("Updated customer {}", customer.id);
        Ok(customer.clone())
    }

    /// Logs and payments of the removed customer are left in place.
    pub fn delete_customer(&mut self, customer_id: &str) -> Result<Customer> {
        let index = self
            .customers
            .iter()
            .position(|c| c.id == customer_id)
            .ok_or_else(|| LedgerError::CustomerNotFound(customer_id.to_string()))?;
        let removed = self.customers.remove(index);
        info!("Deleted customer {} ({})", removed.name, removed.id);
        Ok(removed)
    }

    pub fn add_area(&mut self, name: &str) -> Result<Area> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput("area name is empty".to_string()));
        }
        if self.areas.iter().any(|a| a == name) {
            return Err(LedgerError::DuplicateArea(name.to_string()));
        }
        self.areas.push(name.to_string());
        info!("Added area {}", name);
        Ok(name.to_string())
    }

    pub fn delete_area(&mut self, name: &str) -> Result<()> {
        if self.customers.iter().any(|c| c.area == name) {
            warn!("Refusing to delete area {} while customers use it", name);
            return Err(LedgerError::AreaInUse(name.to_string()));
        }
        let before = self.areas.len();
        self.areas.retain(|a| a != name);
        if self.areas.len() == before {
            return Err(LedgerError::AreaNotFound(name.to_string()));
        }
        info!("Deleted area {}", name);
        Ok(())
    }

    /// Records liters for a customer on a date, replacing that day's entry if present.
    pub fn upsert_delivery(
        &mut self,
        customer_id: &str,
        date: NaiveDate,
        liters: f64,
    ) -> Result<DeliveryLog> {
        if !liters.is_finite() || liters < 0.0 {
            return Err(LedgerError::InvalidInput(format!(
                "liters must be a non-negative number, got {}",
                liters
            )));
        }
        self.require_customer(customer_id)?;

        if let Some(existing) = self
            .logs
            .iter_mut()
            .find(|l| l.customer_id == customer_id && l.date == date)
        {
            existing.liters = liters;
            debug!("Updated delivery {} to {} L", existing.id, liters);
            return Ok(existing.clone());
        }

        let log = DeliveryLog {
            id: new_id(),
            customer_id: customer_id.to_string(),
            date,
            liters,
            is_paid: false,
        };
        debug!("Logged {} L for customer {} on {}", liters, customer_id, date);
        self.logs.push(log.clone());
        Ok(log)
    }

    /// Records a payment in full and marks the oldest unpaid deliveries it covers.
    pub fn record_payment(
        &mut self,
        customer_id: &str,
        amount: f64,
        method: &str,
        now: DateTime<Utc>,
    ) -> Result<PaymentRecord> {
        if !amount.is_finite() || amount <= 0.0 {
            warn!("Rejected payment of {} for customer {}", amount, customer_id);
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        let price = self.require_customer(customer_id)?.price_per_liter;

        let mut unpaid: Vec<&DeliveryLog> = self
            .logs
            .iter()
            .filter(|l| l.customer_id == customer_id && !l.is_paid)
            .collect();
        unpaid.sort_by_key(|l| l.date);
        let covered = allocate_payment(&unpaid, price, amount);

        for log in self.logs.iter_mut().filter(|l| covered.contains(&l.id)) {
            log.is_paid = true;
        }

        let method = method.trim();
        let record = PaymentRecord {
            id: new_id(),
            customer_id: customer_id.to_string(),
            amount,
            date: now,
            method: if method.is_empty() {
                DEFAULT_PAYMENT_METHOD.to_string()
            } else {
                method.to_string()
            },
            period: period_label(covered.len()),
        };
        info!(
            "Recorded payment {} of {} for customer {} ({})",
            record.id, amount, customer_id, record.period
        );
        self.payments.insert(0, record.clone());
        Ok(record)
    }

    pub fn set_branding(&mut self, store_name: &str, store_icon: &str) -> Branding {
        let store_name = store_name.trim();
        self.branding = Branding {
            store_name: if store_name.is_empty() {
                Branding::default().store_name
            } else {
                store_name.to_string()
            },
            store_icon: store_icon.to_string(),
        };
        self.branding.clone()
    }

    /// Case-insensitive name match or phone substring, optionally limited to one area.
    pub fn search_customers(&self, term: &str, area: Option<&str>) -> Vec<Customer> {
        let needle = term.to_lowercase();
        self.customers
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle) || c.phone.contains(term))
            .filter(|c| area.map_or(true, |a| c.area == a))
            .cloned()
            .collect()
    }

    pub fn search_payments(&self, customer_name: &str) -> Vec<PaymentRecord> {
        if customer_name.is_empty() {
            return self.payments.clone();
        }
        let needle = customer_name.to_lowercase();
        self.payments
            .iter()
            .filter(|record| {
                self.customer(&record.customer_id)
                    .is_some_and(|c| c.name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

/// Walks unpaid logs oldest first, covering each whole log while the remainder
/// allows. Stops at the first log it cannot pay in full.
pub fn allocate_payment(unpaid: &[&DeliveryLog], price_per_liter: f64, amount: f64) -> Vec<String> {
    let mut remaining = amount;
    let mut covered = Vec::new();
    for log in unpaid {
        let cost = log.cost(price_per_liter);
        if remaining + COST_EPSILON < cost {
            break;
        }
        remaining -= cost;
        covered.push(log.id.clone());
    }
    covered
}

pub fn period_label(covered: usize) -> String {
    if covered > 0 {
        format!("Paid for {} deliveries", covered)
    } else {
        PARTIAL_PAYMENT_LABEL.to_string()
    }
}

/// Parses a payment amount typed into a form.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| LedgerError::InvalidAmount(raw.to_string()))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidAmount(raw.to_string()));
    }
    Ok(amount)
}

fn validate_draft(draft: &CustomerDraft) -> Result<(String, String, Area)> {
    let field = |value: &Option<String>, name: &str| -> Result<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| LedgerError::InvalidInput(format!("{} is required", name)))
    };
    Ok((
        field(&draft.name, "name")?,
        field(&draft.phone, "phone")?,
        field(&draft.area, "area")?,
    ))
}

fn resolve_price(price: Option<f64>) -> f64 {
    match price {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => DEFAULT_PRICE_PER_LITER,
    }
}
