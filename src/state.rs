use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::TokenSigner;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub tokens: TokenSigner,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = TokenSigner::from_config(&config.auth)?;

        Ok(Arc::new(Self {
            config,
            store,
            tokens,
        }))
    }
}
