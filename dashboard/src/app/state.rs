//! Explicit application state with a build/shutdown lifecycle.

use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use tracing::info;

use crate::domain::entities::{Brand, Campaign, Client, Consumer, Survey};
use crate::domain::ports::{
    AccessTokenSource, AuthGateway, CredentialStore, EntityApi, FixtureAuthGateway, FixtureEntityApi,
    KeyValueStorage, StorageCredentialStore,
};
use crate::domain::{EntityService, QueryCache, SessionResolver};
use crate::outbound::http::{HttpAuthGateway, HttpEntityApi, HttpTransport};
use crate::outbound::storage::{DirStorage, MemoryStorage};

use super::{DashboardSettings, RequiredEnv, StartupError};

/// One entity API per dashboard collection.
pub struct EntityApis {
    pub clients: Arc<dyn EntityApi<Client>>,
    pub brands: Arc<dyn EntityApi<Brand>>,
    pub campaigns: Arc<dyn EntityApi<Campaign>>,
    pub surveys: Arc<dyn EntityApi<Survey>>,
    pub consumers: Arc<dyn EntityApi<Consumer>>,
}

impl EntityApis {
    /// In-memory fixtures sharing `clock` for timestamps.
    pub fn fixtures(clock: &Arc<dyn Clock>) -> Self {
        Self {
            clients: Arc::new(FixtureEntityApi::<Client>::new(Arc::clone(clock))),
            brands: Arc::new(FixtureEntityApi::<Brand>::new(Arc::clone(clock))),
            campaigns: Arc::new(FixtureEntityApi::<Campaign>::new(Arc::clone(clock))),
            surveys: Arc::new(FixtureEntityApi::<Survey>::new(Arc::clone(clock))),
            consumers: Arc::new(FixtureEntityApi::<Consumer>::new(Arc::clone(clock))),
        }
    }
}

/// Session resolver plus one cached service per entity.
pub struct AppState {
    pub session: Arc<SessionResolver>,
    pub clients: EntityService<Client>,
    pub brands: EntityService<Brand>,
    pub campaigns: EntityService<Campaign>,
    pub surveys: EntityService<Survey>,
    pub consumers: EntityService<Consumer>,
}

impl AppState {
    /// Wire the HTTP adapters against the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Storage`] when the credential directory cannot
    /// be opened and [`StartupError::Transport`] when the HTTP client cannot
    /// be built.
    pub fn build(env: &RequiredEnv, settings: &DashboardSettings) -> Result<Self, StartupError> {
        let storage: Arc<dyn KeyValueStorage> = match &settings.storage_dir {
            Some(path) => Arc::new(DirStorage::open(path).map_err(|source| {
                StartupError::Storage {
                    path: path.clone(),
                    source,
                }
            })?),
            None => Arc::new(MemoryStorage::new()),
        };
        let transport = Arc::new(
            HttpTransport::new(env.api_base_url().clone(), env.project_id())
                .map_err(StartupError::Transport)?,
        );
        let store: Arc<dyn CredentialStore> = Arc::new(StorageCredentialStore::new(storage));
        let gateway: Arc<dyn AuthGateway> = Arc::new(HttpAuthGateway::new(Arc::clone(&transport)));
        let session = Arc::new(SessionResolver::new(store, gateway));
        let tokens: Arc<dyn AccessTokenSource> = session.clone();
        let apis = EntityApis {
            clients: Arc::new(HttpEntityApi::<Client>::new(
                Arc::clone(&transport),
                Arc::clone(&tokens),
            )),
            brands: Arc::new(HttpEntityApi::<Brand>::new(
                Arc::clone(&transport),
                Arc::clone(&tokens),
            )),
            campaigns: Arc::new(HttpEntityApi::<Campaign>::new(
                Arc::clone(&transport),
                Arc::clone(&tokens),
            )),
            surveys: Arc::new(HttpEntityApi::<Survey>::new(
                Arc::clone(&transport),
                Arc::clone(&tokens),
            )),
            consumers: Arc::new(HttpEntityApi::<Consumer>::new(transport, tokens)),
        };
        info!(base_url = %env.api_base_url(), "dashboard state built");
        Ok(Self::assemble(session, apis, settings.invalidation_window()))
    }

    /// Wire in-memory fixtures with no backend.
    pub fn with_fixtures(window: Duration) -> Self {
        let store: Arc<dyn CredentialStore> =
            Arc::new(StorageCredentialStore::new(Arc::new(MemoryStorage::new())));
        let session = Arc::new(SessionResolver::new(store, Arc::new(FixtureAuthGateway)));
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        Self::assemble(session, EntityApis::fixtures(&clock), window)
    }

    /// Wire caller-provided ports.
    pub fn assemble(session: Arc<SessionResolver>, apis: EntityApis, window: Duration) -> Self {
        Self {
            session,
            clients: EntityService::new(apis.clients, QueryCache::new(window)),
            brands: EntityService::new(apis.brands, QueryCache::new(window)),
            campaigns: EntityService::new(apis.campaigns, QueryCache::new(window)),
            surveys: EntityService::new(apis.surveys, QueryCache::new(window)),
            consumers: EntityService::new(apis.consumers, QueryCache::new(window)),
        }
    }

    /// Close every cache; responses still in flight are discarded.
    pub fn shutdown(&self) {
        self.clients.cache().shutdown();
        self.brands.cache().shutdown();
        self.campaigns.cache().shutdown();
        self.surveys.cache().shutdown();
        self.consumers.cache().shutdown();
        info!("dashboard state shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.clients.cache().is_shut_down()
    }
}
