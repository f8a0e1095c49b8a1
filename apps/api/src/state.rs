use std::sync::Arc;

use crate::config::Config;
use crate::services::email::EmailClient;
use crate::services::generation::GenerationClient;
use crate::store::{ObjectStorage, RecordStore};
use crate::wizard::registry::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Collaborators are trait objects so tests can swap in in-memory fakes
/// without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub generation: Arc<dyn GenerationClient>,
    pub email: Arc<dyn EmailClient>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Config,
}
