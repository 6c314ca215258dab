pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod journal;
pub mod models;
pub mod reminder;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use journal::Journal;
pub use state::AppState;
pub use storage::LocalStorage;
