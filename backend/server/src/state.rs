use std::sync::Arc;

use crate::{
    config::Config,
    database::RedisStore,
    imgbb::{ImageHost, ImgBb},
    ledger::Ledger,
    store::{Store, StoreError},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub image_host: Arc<dyn ImageHost>,
    pub ledger: Ledger,
}

impl AppState {
    pub async fn new() -> Result<Arc<Self>, StoreError> {
        let config = Config::load();

        let store = Arc::new(RedisStore::connect(&config.redis_url).await?);
        let image_host = Arc::new(ImgBb::new(
            config.imgbb_url.clone(),
            config.imgbb_key.clone(),
        ));

        Ok(Self::with_parts(config, store, image_host))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        image_host: Arc<dyn ImageHost>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            ledger: Ledger::new(store.clone()),
            store,
            image_host,
        })
    }
}
