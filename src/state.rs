use crate::journal::Journal;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub journal: Arc<Mutex<Journal>>,
}

impl AppState {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal: Arc::new(Mutex::new(journal)),
        }
    }
}
