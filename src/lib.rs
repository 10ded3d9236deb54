pub mod backup;
pub mod balance;
pub mod db;
pub mod error;
pub mod insight;
pub mod ledger;
pub mod logger;
pub mod models;
pub mod seed;
pub mod settings;
pub mod store;
pub mod view;

#[cfg(feature = "desktop")]
mod app;

#[cfg(feature = "desktop")]
pub use app::run;

pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use store::Store;
