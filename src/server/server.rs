use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_document::DocumentRelationshipStore;
use crate::infra_memory::MemoryDocumentStore;
use crate::infra_mysql::MySqlDocumentStore;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

/// Knobs of the follow core that do not depend on the storage backend.
#[derive(Debug, Clone)]
pub struct CoreOptions {
    pub collection: CollectionId,
    pub request_timeout: Duration,
    pub count_strategy: CountStrategy,
    pub identity_header: String,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            collection: CollectionId("followers".to_string()),
            request_timeout: Duration::from_secs(5),
            count_strategy: CountStrategy::Optimistic,
            identity_header: "x-user-id".to_string(),
        }
    }
}

impl From<&Settings> for CoreOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            collection: CollectionId(settings.store.collection.clone()),
            request_timeout: Duration::from_millis(settings.store.request_timeout_ms),
            count_strategy: settings.follow.count_strategy,
            identity_header: settings.identity.header.clone(),
        }
    }
}

pub struct Server {
    pub resolver: Arc<dyn FollowResolver>,
    pub commands: Arc<dyn FollowCommandHandler>,
    pub identity: Arc<dyn IdentityProvider>,
    pub identity_header: String,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let options = CoreOptions::from(settings);

        let (documents, pool): (Arc<dyn DocumentStore>, Option<MySqlPool>) =
            match settings.store.backend.as_str() {
                "memory" => {
                    let mut store = MemoryDocumentStore::new();
                    if settings.store.unique_edges {
                        store = store.with_unique_index(
                            options.collection.clone(),
                            &[FOLLOWER_FIELD, FOLLOWED_FIELD],
                        );
                    }
                    (Arc::new(store), None)
                }
                "mysql" => {
                    let dsn = settings
                        .store
                        .mysql_dsn
                        .as_deref()
                        .ok_or_else(|| anyhow!("store.mysql_dsn is required for the mysql backend"))?;
                    let pool = MySqlPool::connect(dsn).await?;
                    let store = MySqlDocumentStore::new(pool.clone());
                    store.ensure_schema(settings.store.unique_edges).await?;
                    (Arc::new(store), Some(pool))
                }
                other => return Err(anyhow!("Unknown store backend: {}", other)),
            };

        let server = Self::assemble(documents, options, pool);
        info!(backend = %settings.store.backend, "server started");
        Ok(server)
    }

    /// Single-process server over a fresh in-memory store with unique edges.
    pub fn in_memory(options: CoreOptions) -> Self {
        let store = MemoryDocumentStore::new()
            .with_unique_index(options.collection.clone(), &[FOLLOWER_FIELD, FOLLOWED_FIELD]);
        Self::assemble(Arc::new(store), options, None)
    }

    pub fn assemble(
        documents: Arc<dyn DocumentStore>,
        options: CoreOptions,
        pool: Option<MySqlPool>,
    ) -> Self {
        let relationship_store: Arc<dyn RelationshipStore> = Arc::new(
            DocumentRelationshipStore::new(documents, options.collection, options.request_timeout),
        );

        // every caller shares one resolver and one command handler, so the
        // per-pair guard covers all of them
        let resolver: Arc<dyn FollowResolver> =
            Arc::new(RealFollowResolver::new(relationship_store.clone()));
        let commands: Arc<dyn FollowCommandHandler> = Arc::new(RealFollowCommandHandler::new(
            relationship_store,
            options.count_strategy,
        ));
        let identity: Arc<dyn IdentityProvider> = Arc::new(TrustedHeaderIdentity::new());

        Self {
            resolver,
            commands,
            identity,
            identity_header: options.identity_header,
            pool,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
