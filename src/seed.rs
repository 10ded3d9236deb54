use chrono::NaiveDate;

use crate::models::{Area, Customer, CustomerStatus, DeliveryLog};

pub const DEFAULT_AREAS: [&str; 5] = [
    "North Sector",
    "South Park",
    "East Gate",
    "West Hills",
    "City Center",
];

pub fn default_areas() -> Vec<Area> {
    DEFAULT_AREAS.iter().map(|area| area.to_string()).collect()
}

pub fn initial_customers() -> Vec<Customer> {
    [
        ("1", "John Doe", "9876543210", "North Sector", 60.0, (2023, 1, 15)),
        ("2", "Alice Smith", "9876543211", "South Park", 62.0, (2023, 2, 20)),
        ("3", "Bob Johnson", "9876543212", "North Sector", 60.0, (2023, 3, 10)),
        ("4", "Charlie Brown", "9876543213", "East Gate", 58.0, (2023, 5, 5)),
    ]
    .into_iter()
    .filter_map(|(id, name, phone, area, price, (y, m, d))| {
        Some(Customer {
            id: id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            area: area.to_string(),
            price_per_liter: price,
            joined_date: NaiveDate::from_ymd_opt(y, m, d)?,
            status: CustomerStatus::Active,
        })
    })
    .collect()
}

pub fn initial_logs(today: NaiveDate) -> Vec<DeliveryLog> {
    vec![
        DeliveryLog {
            id: "L1".to_string(),
            customer_id: "1".to_string(),
            date: today,
            liters: 3.5,
            is_paid: false,
        },
        DeliveryLog {
            id: "L2".to_string(),
            customer_id: "2".to_string(),
            date: today,
            liters: 2.0,
            is_paid: false,
        },
    ]
}
