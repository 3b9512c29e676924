use crate::{config::AppConfig, loader::IndicatorStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: IndicatorStore,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let store = IndicatorStore::new(config.data_dir.clone(), config.maps_dir.clone());
        Self { config, store }
    }
}
