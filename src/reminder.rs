use crate::state::AppState;
use chrono::{Local, Timelike};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

pub const CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const REMINDER_MESSAGE: &str =
    "Daily reminder: How are you feeling today? Take a moment to check in.";

/// A reminder fires on the configured hour, and only once something has
/// been logged.
pub fn reminder_due(current_hour: u32, entry_count: usize, reminder_hour: u32) -> bool {
    entry_count > 0 && current_hour == reminder_hour
}

/// Hourly check for the lifetime of the process. Never touches the journal
/// beyond reading its size.
pub fn spawn(state: AppState, reminder_hour: u32) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CHECK_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let entry_count = state.journal.lock().await.entries().len();
            if reminder_due(Local::now().hour(), entry_count, reminder_hour) {
                info!("{REMINDER_MESSAGE}");
            }
        }
    })
}
