use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Delivery areas are plain names; customers reference them by value.
pub type Area = String;

pub const DEFAULT_STORE_NAME: &str = "DairyPro Manager";
pub const DEFAULT_PRICE_PER_LITER: f64 = 60.0;
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub area: Area,
    /// Browser-era backups store a cleared price field as `null`.
    #[serde(
        default = "default_price_per_liter",
        deserialize_with = "price_or_default"
    )]
    pub price_per_liter: f64,
    pub joined_date: NaiveDate,
    pub status: CustomerStatus,
}

impl Customer {
    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }
}

/// One day's delivered quantity for one customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLog {
    pub id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub liters: f64,
    /// Advisory only. Balances are always recomputed from raw totals.
    pub is_paid: bool,
}

impl DeliveryLog {
    pub fn cost(&self, price_per_liter: f64) -> f64 {
        self.liters * price_per_liter
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub customer_id: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub method: String,
    pub period: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub store_name: String,
    pub store_icon: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            store_icon: String::new(),
        }
    }
}

/// Form payload for creating or editing a customer. Missing fields block the save.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub area: Option<Area>,
    pub price_per_liter: Option<f64>,
    pub status: Option<CustomerStatus>,
}

fn default_price_per_liter() -> f64 {
    DEFAULT_PRICE_PER_LITER
}

fn price_or_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|price| price.is_finite() && *price > 0.0)
        .unwrap_or(DEFAULT_PRICE_PER_LITER))
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
