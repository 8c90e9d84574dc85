use std::sync::Arc;

use crate::config::Config;
use crate::store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub config: Arc<Config>,
}
