use crate::models::AppData;
use crate::storage::Storage;
use crate::store::AttendanceStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub store: Arc<Mutex<AttendanceStore>>,
}

impl AppState {
    pub fn new(storage: Storage, data: AppData) -> Self {
        Self {
            storage,
            store: Arc::new(Mutex::new(AttendanceStore::new(data))),
        }
    }
}
