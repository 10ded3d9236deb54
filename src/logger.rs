use std::path::Path;

use anyhow::Result;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: stdout plus a daily-rolling `ledger.log`.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the app.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "ledger.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let writer = std::io::stdout.and(non_blocking);

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_timer(timer)
        .with_ansi(cfg!(debug_assertions))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    tracing::info!("Logging to {}", log_dir.display());
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _guard = init(dir.path()).expect("first init");
        assert!(init(dir.path()).is_err());
        assert!(dir.path().exists());
    }

    #[test]
    fn log_dir_that_is_a_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let occupied = dir.path().join("logs");
        std::fs::write(&occupied, "not a directory").unwrap();

        assert!(init(&occupied).is_err());
        assert!(occupied.is_file());
    }
}
