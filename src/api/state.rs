use std::sync::Arc;

use crate::archive::ArchiveSource;
use crate::catalog::DeckCatalog;
use crate::config::AppConfig;
use crate::live::LiveSession;
use crate::storage::LiveStore;

pub type SharedLiveSession = Arc<tokio::sync::RwLock<LiveSession<Box<dyn LiveStore>>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub live: SharedLiveSession,
    pub archive: Arc<dyn ArchiveSource>,
    pub catalog: Arc<DeckCatalog>,
}
