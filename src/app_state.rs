use std::sync::Arc;

use crate::config;
use crate::db::Store;
use crate::i18n::Localizer;
use crate::workflow::NominationService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NominationService>,
    pub env: config::Config,
    pub localizer: Arc<Localizer>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, env: config::Config, localizer: Arc<Localizer>) -> Self {
        Self {
            service: Arc::new(NominationService::new(store)),
            env,
            localizer,
        }
    }
}
