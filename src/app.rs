use std::{fs, path::PathBuf, sync::Mutex, sync::MutexGuard};

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use tauri::{Manager, State};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::backup;
use crate::balance::{self, BillingTotals, CustomerBalance, CustomerHistory, RecentDelivery};
use crate::db::SqliteStore;
use crate::insight::{self, InsightClient};
use crate::ledger::{self, Ledger};
use crate::logger;
use crate::models::{Area, Branding, Customer, CustomerDraft, DeliveryLog, PaymentRecord};
use crate::settings::Settings;
use crate::store::Store;
use crate::view::{HistoryTab, Modal, Navigation, View};

struct AppState {
    store: Mutex<Store<SqliteStore>>,
    navigation: Mutex<Navigation>,
    settings: Settings,
    insight: InsightClient,
}

struct LogGuard(#[allow(dead_code)] WorkerGuard);

#[derive(Serialize)]
struct BillingSummary {
    totals: BillingTotals,
    collection_rate: f64,
}

#[derive(Serialize)]
struct ExportFile {
    file_name: String,
    contents: String,
}

#[derive(Serialize)]
struct NavigationState {
    navigation: Navigation,
    title: String,
}

fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_date_local(date_local: Option<String>) -> Result<NaiveDate, String> {
    match date_local {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|err| format!("invalid date_local: {}", err)),
        None => Ok(today_local()),
    }
}

fn lock_store<'a>(
    state: &'a State<'_, AppState>,
) -> Result<MutexGuard<'a, Store<SqliteStore>>, String> {
    state.store.lock().map_err(|err| err.to_string())
}

fn lock_navigation<'a>(
    state: &'a State<'_, AppState>,
) -> Result<MutexGuard<'a, Navigation>, String> {
    state.navigation.lock().map_err(|err| err.to_string())
}

fn write_export(path: Option<String>, file: &ExportFile) -> Result<(), String> {
    if let Some(path) = path {
        fs::write(&path, &file.contents).map_err(|err| err.to_string())?;
        info!("Wrote {} to {}", file.file_name, path);
    }
    Ok(())
}

#[tauri::command(rename_all = "snake_case")]
fn get_ledger(state: State<'_, AppState>) -> Result<Ledger, String> {
    Ok(lock_store(&state)?.ledger().clone())
}

#[tauri::command(rename_all = "snake_case")]
fn add_area(state: State<'_, AppState>, name: String) -> Result<Area, String> {
    lock_store(&state)?
        .add_area(&name)
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn delete_area(state: State<'_, AppState>, name: String) -> Result<(), String> {
    lock_store(&state)?
        .delete_area(&name)
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn list_customers(
    state: State<'_, AppState>,
    search: Option<String>,
    area: Option<String>,
) -> Result<Vec<Customer>, String> {
    let store = lock_store(&state)?;
    Ok(store
        .ledger()
        .search_customers(search.as_deref().unwrap_or(""), area.as_deref()))
}

#[tauri::command(rename_all = "snake_case")]
fn add_customer(state: State<'_, AppState>, draft: CustomerDraft) -> Result<Customer, String> {
    lock_store(&state)?
        .add_customer(draft, today_local())
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn update_customer(
    state: State<'_, AppState>,
    customer_id: String,
    draft: CustomerDraft,
) -> Result<Customer, String> {
    lock_store(&state)?
        .update_customer(&customer_id, draft)
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn delete_customer(state: State<'_, AppState>, customer_id: String) -> Result<Customer, String> {
    lock_store(&state)?
        .delete_customer(&customer_id)
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn upsert_delivery(
    state: State<'_, AppState>,
    customer_id: String,
    liters: f64,
    date_local: Option<String>,
) -> Result<DeliveryLog, String> {
    let date = resolve_date_local(date_local)?;
    lock_store(&state)?
        .upsert_delivery(&customer_id, date, liters)
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn record_payment(
    state: State<'_, AppState>,
    customer_id: String,
    amount: String,
    method: Option<String>,
) -> Result<PaymentRecord, String> {
    let amount = ledger::parse_amount(&amount).map_err(|err| err.to_string())?;
    lock_store(&state)?
        .record_payment(
            &customer_id,
            amount,
            method.as_deref().unwrap_or(""),
            Utc::now(),
        )
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn list_payments(
    state: State<'_, AppState>,
    search: Option<String>,
) -> Result<Vec<PaymentRecord>, String> {
    let store = lock_store(&state)?;
    Ok(store.ledger().search_payments(search.as_deref().unwrap_or("")))
}

#[tauri::command(rename_all = "snake_case")]
fn get_customer_balance(
    state: State<'_, AppState>,
    customer_id: String,
) -> Result<CustomerBalance, String> {
    let store = lock_store(&state)?;
    let ledger = store.ledger();
    let customer = ledger
        .customer(&customer_id)
        .ok_or_else(|| format!("Customer not found: {}", customer_id))?;
    Ok(balance::customer_balance(
        customer,
        &ledger.logs,
        &ledger.payments,
    ))
}

#[tauri::command(rename_all = "snake_case")]
fn get_billing_summary(state: State<'_, AppState>) -> Result<BillingSummary, String> {
    let store = lock_store(&state)?;
    let ledger = store.ledger();
    let totals = balance::billing_totals(&ledger.customers, &ledger.logs, &ledger.payments);
    Ok(BillingSummary {
        collection_rate: balance::collection_rate(&totals),
        totals,
    })
}

#[tauri::command(rename_all = "snake_case")]
fn get_customer_history(
    state: State<'_, AppState>,
    customer_id: String,
) -> Result<CustomerHistory, String> {
    let store = lock_store(&state)?;
    let ledger = store.ledger();
    Ok(balance::customer_history(
        &customer_id,
        &ledger.logs,
        &ledger.payments,
    ))
}

#[tauri::command(rename_all = "snake_case")]
fn get_recent_deliveries(state: State<'_, AppState>) -> Result<Vec<RecentDelivery>, String> {
    let store = lock_store(&state)?;
    let ledger = store.ledger();
    Ok(balance::recent_deliveries(
        &ledger.customers,
        &ledger.logs,
        state.settings.recent_deliveries_limit,
    ))
}

#[tauri::command(rename_all = "snake_case")]
fn update_branding(
    state: State<'_, AppState>,
    store_name: String,
    store_icon: String,
) -> Result<Branding, String> {
    lock_store(&state)?
        .set_branding(&store_name, &store_icon)
        .map_err(|err| err.to_string())
}

#[tauri::command(rename_all = "snake_case")]
fn export_backup(state: State<'_, AppState>, path: Option<String>) -> Result<ExportFile, String> {
    let store = lock_store(&state)?;
    let file = ExportFile {
        file_name: backup::backup_file_name(&store.ledger().branding, today_local()),
        contents: backup::export_backup(store.ledger()).map_err(|err| err.to_string())?,
    };
    write_export(path, &file)?;
    Ok(file)
}

#[tauri::command(rename_all = "snake_case")]
fn export_accounts_csv(
    state: State<'_, AppState>,
    path: Option<String>,
) -> Result<ExportFile, String> {
    let store = lock_store(&state)?;
    let file = ExportFile {
        file_name: backup::accounts_file_name(&store.ledger().branding, today_local()),
        contents: backup::accounts_csv(store.ledger()),
    };
    write_export(path, &file)?;
    Ok(file)
}

/// The front-end asks for confirmation before calling this.
#[tauri::command(rename_all = "snake_case")]
fn import_backup(state: State<'_, AppState>, payload: String) -> Result<Ledger, String> {
    let restored = backup::parse_backup(&payload).map_err(|err| err.to_string())?;
    let mut store = lock_store(&state)?;
    store.replace(restored).map_err(|err| err.to_string())?;
    Ok(store.ledger().clone())
}

#[tauri::command(rename_all = "snake_case")]
fn reset_data(state: State<'_, AppState>) -> Result<Ledger, String> {
    let mut store = lock_store(&state)?;
    store.reset(today_local()).map_err(|err| err.to_string())?;
    Ok(store.ledger().clone())
}

#[tauri::command(rename_all = "snake_case")]
async fn generate_insights(state: State<'_, AppState>) -> Result<String, String> {
    let summary = {
        let store = lock_store(&state)?;
        insight::summarize(&store.ledger().customers, &store.ledger().logs)
    };
    Ok(state.insight.generate_insights(&summary).await)
}

#[tauri::command(rename_all = "snake_case")]
fn get_navigation(state: State<'_, AppState>) -> Result<NavigationState, String> {
    let navigation = lock_navigation(&state)?.clone();
    Ok(NavigationState {
        title: navigation.title(),
        navigation,
    })
}

#[tauri::command(rename_all = "snake_case")]
fn navigate(state: State<'_, AppState>, view: View) -> Result<NavigationState, String> {
    lock_navigation(&state)?.navigate(view);
    get_navigation(state)
}

#[tauri::command(rename_all = "snake_case")]
fn open_modal(state: State<'_, AppState>, modal: Modal) -> Result<NavigationState, String> {
    lock_navigation(&state)?.open_modal(modal);
    get_navigation(state)
}

#[tauri::command(rename_all = "snake_case")]
fn close_modal(state: State<'_, AppState>) -> Result<NavigationState, String> {
    lock_navigation(&state)?.close_modal();
    get_navigation(state)
}

#[tauri::command(rename_all = "snake_case")]
fn switch_history_tab(
    state: State<'_, AppState>,
    tab: HistoryTab,
) -> Result<NavigationState, String> {
    lock_navigation(&state)?.switch_history_tab(tab);
    get_navigation(state)
}

fn build_state(data_dir: PathBuf) -> Result<AppState, Box<dyn std::error::Error>> {
    let settings = Settings::load(&data_dir)?;
    let kv = SqliteStore::open(&data_dir)?;
    let store = Store::load(kv, today_local())?;
    let insight = InsightClient::from_settings(&settings)?;
    Ok(AppState {
        store: Mutex::new(store),
        navigation: Mutex::new(Navigation::default()),
        settings,
        insight,
    })
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let guard = logger::init(&app.path().app_log_dir()?)?;
            app.manage(LogGuard(guard));
            let state = build_state(app.path().app_data_dir()?)?;
            app.manage(state);
            Ok(())
        })
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            get_ledger,
            add_area,
            delete_area,
            list_customers,
            add_customer,
            update_customer,
            delete_customer,
            upsert_delivery,
            record_payment,
            list_payments,
            get_customer_balance,
            get_billing_summary,
            get_customer_history,
            get_recent_deliveries,
            update_branding,
            export_backup,
            export_accounts_csv,
            import_backup,
            reset_data,
            generate_insights,
            get_navigation,
            navigate,
            open_modal,
            close_modal,
            switch_history_tab
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
