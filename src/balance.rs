//! Derived totals. Nothing here is cached; every figure is recomputed from the
//! raw collections so it can never drift from the logs and payments.

use serde::Serialize;

use crate::models::{Customer, DeliveryLog, PaymentRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBalance {
    pub total_billed: f64,
    pub total_paid: f64,
    pub net_balance: f64,
}

impl CustomerBalance {
    pub fn is_settled(&self) -> bool {
        self.net_balance <= 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingTotals {
    pub total_billed: f64,
    pub total_collected: f64,
    pub total_pending: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHistory {
    pub deliveries: Vec<DeliveryLog>,
    pub payments: Vec<PaymentRecord>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDelivery {
    pub log: DeliveryLog,
    pub customer: Option<Customer>,
}

pub fn total_billed(customer: &Customer, logs: &[DeliveryLog]) -> f64 {
    logs.iter()
        .filter(|log| log.customer_id == customer.id)
        .map(|log| log.cost(customer.price_per_liter))
        .fold(0.0, |acc, cost| acc + cost)
}

pub fn total_paid(customer: &Customer, payments: &[PaymentRecord]) -> f64 {
    payments
        .iter()
        .filter(|record| record.customer_id == customer.id)
        .map(|record| record.amount)
        .fold(0.0, |acc, amount| acc + amount)
}

pub fn customer_balance(
    customer: &Customer,
    logs: &[DeliveryLog],
    payments: &[PaymentRecord],
) -> CustomerBalance {
    let total_billed = total_billed(customer, logs);
    let total_paid = total_paid(customer, payments);
    CustomerBalance {
        total_billed,
        total_paid,
        net_balance: total_billed - total_paid,
    }
}

/// Sums over current customers only; records of deleted customers drop out.
pub fn billing_totals(
    customers: &[Customer],
    logs: &[DeliveryLog],
    payments: &[PaymentRecord],
) -> BillingTotals {
    let (total_billed, total_collected) =
        customers
            .iter()
            .fold((0.0, 0.0), |(billed, collected), customer| {
                let stats = customer_balance(customer, logs, payments);
                (billed + stats.total_billed, collected + stats.total_paid)
            });

    BillingTotals {
        total_billed,
        total_collected,
        total_pending: total_billed - total_collected,
    }
}

/// Percentage of billed value collected, 0 when nothing has been billed.
pub fn collection_rate(totals: &BillingTotals) -> f64 {
    if totals.total_billed > 0.0 {
        totals.total_collected / totals.total_billed * 100.0
    } else {
        0.0
    }
}

pub fn customer_history(
    customer_id: &str,
    logs: &[DeliveryLog],
    payments: &[PaymentRecord],
) -> CustomerHistory {
    let mut deliveries: Vec<DeliveryLog> = logs
        .iter()
        .filter(|log| log.customer_id == customer_id)
        .cloned()
        .collect();
    deliveries.sort_by(|a, b| b.date.cmp(&a.date));

    let mut payments: Vec<PaymentRecord> = payments
        .iter()
        .filter(|record| record.customer_id == customer_id)
        .cloned()
        .collect();
    payments.sort_by(|a, b| b.date.cmp(&a.date));

    CustomerHistory {
        deliveries,
        payments,
    }
}

/// The last `limit` logs in entry order, most recent entry first.
pub fn recent_deliveries(
    customers: &[Customer],
    logs: &[DeliveryLog],
    limit: usize,
) -> Vec<RecentDelivery> {
    logs.iter()
        .rev()
        .take(limit)
        .map(|log| RecentDelivery {
            log: log.clone(),
            customer: customers
                .iter()
                .find(|customer| customer.id == log.customer_id)
                .cloned(),
        })
        .collect()
}

pub fn total_liters(logs: &[DeliveryLog]) -> f64 {
    logs.iter().fold(0.0, |acc, log| acc + log.liters)
}
