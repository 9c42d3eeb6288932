use std::sync::Arc;

use tracing::warn;

use crate::auth::repo::{MongoUserStore, UserStore};
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connects the credential store. Errors here are fatal to the process.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(&config).await?;

        let users = MongoUserStore::new(&db);
        if let Err(e) = users.ensure_indexes().await {
            warn!(error = ?e, "unique email index unavailable; continuing");
        }

        Ok(Self::from_parts(Arc::new(users), Arc::new(config)))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }
}

#[cfg(test)]
impl AppState {
    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_database: "authentication".into(),
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                expires_in: std::time::Duration::from_secs(3600),
            },
        }
    }

    pub fn fake() -> Self {
        use crate::auth::repo::MemoryUserStore;
        Self::from_parts(Arc::new(MemoryUserStore::new()), Arc::new(Self::test_config()))
    }

    pub fn fake_unavailable() -> Self {
        use crate::auth::repo::MemoryUserStore;
        Self::from_parts(
            Arc::new(MemoryUserStore::unavailable()),
            Arc::new(Self::test_config()),
        )
    }
}
