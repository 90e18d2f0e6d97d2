use crate::store::MetricStore;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Shared by every transport; commands lock the store only while they run.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub store: Arc<Mutex<MetricStore>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, store: MetricStore) -> Self {
        Self {
            data_path,
            store: Arc::new(Mutex::new(store)),
        }
    }
}
