//! Per-entity use-cases: cached list reads and mutations that invalidate the
//! cached lists of their entity type.

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::entities::{Entity, EntityId, ListFilter};
use crate::domain::ports::{CacheKey, EntityApi};
use crate::domain::query_cache::{Fetcher, QueryCache, QueryState};
use crate::domain::validation::Validated;
use crate::domain::Error;

/// Reads go through the cache; writes go straight to the API and then
/// invalidate every list key of `E`'s kind before returning.
pub struct EntityService<E: Entity> {
    api: Arc<dyn EntityApi<E>>,
    cache: QueryCache<E>,
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: self.cache.clone(),
        }
    }
}

impl<E: Entity> EntityService<E> {
    /// Combine an API adapter with the cache holding `E`'s lists.
    pub fn new(api: Arc<dyn EntityApi<E>>, cache: QueryCache<E>) -> Self {
        Self { api, cache }
    }

    /// Cache key for the list narrowed by `filter`.
    pub fn key(filter: Option<&ListFilter>) -> CacheKey {
        match filter {
            Some(filter) => CacheKey::filtered(E::KIND, filter.clone()),
            None => CacheKey::list(E::KIND),
        }
    }

    fn fetcher(&self, filter: Option<ListFilter>) -> Fetcher<E> {
        let api = Arc::clone(&self.api);
        Arc::new(move || {
            let api = Arc::clone(&api);
            let filter = filter.clone();
            async move { api.list(filter.as_ref()).await }.boxed()
        })
    }

    /// The list view's state for `filter`, fetching when needed.
    pub async fn list(&self, filter: Option<&ListFilter>) -> QueryState<E> {
        let key = Self::key(filter);
        self.cache.read(&key, self.fetcher(filter.cloned())).await
    }

    /// Subscribe to the list view for `filter`.
    pub fn watch_list(&self, filter: Option<&ListFilter>) -> watch::Receiver<QueryState<E>> {
        self.cache.subscribe(&Self::key(filter))
    }

    /// Detail fetch. `Ok(None)` is the not-found outcome.
    pub async fn get(&self, id: &EntityId) -> Result<Option<E>, Error> {
        self.api.get(id).await
    }

    /// Create an entity from a validated draft.
    pub async fn create(&self, draft: &Validated<E::Draft>) -> Result<E, Error> {
        let created = self.api.create(draft.as_inner()).await?;
        info!(kind = %E::KIND, id = %created.id(), "entity created");
        self.invalidate_lists();
        Ok(created)
    }

    /// Replace the entity with `id` from a validated draft.
    pub async fn update(&self, id: &EntityId, draft: &Validated<E::Draft>) -> Result<E, Error> {
        let updated = self.api.update(id, draft.as_inner()).await?;
        info!(kind = %E::KIND, %id, "entity updated");
        self.invalidate_lists();
        Ok(updated)
    }

    /// Delete the entity with `id`.
    pub async fn delete(&self, id: &EntityId) -> Result<(), Error> {
        self.api.delete(id).await?;
        info!(kind = %E::KIND, %id, "entity deleted");
        self.invalidate_lists();
        Ok(())
    }

    fn invalidate_lists(&self) {
        let keys = self.cache.invalidate_kind(E::KIND);
        debug!(kind = %E::KIND, keys, "lists invalidated after mutation");
    }

    /// The cache backing this service.
    pub fn cache(&self) -> &QueryCache<E> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    //! Mutation and invalidation coverage over the in-memory collection.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::entities::{Brand, BrandDraft, Client, ClientDraft};
    use crate::domain::ports::FixtureEntityApi;
    use crate::domain::validation::Validate;
    use mockable::DefaultClock;
    use rstest::rstest;
    use std::time::Duration;

    fn brands() -> (EntityService<Brand>, Arc<FixtureEntityApi<Brand>>) {
        let api = Arc::new(FixtureEntityApi::new(Arc::new(DefaultClock)));
        let service = EntityService::new(
            api.clone() as Arc<dyn EntityApi<Brand>>,
            QueryCache::new(Duration::from_secs(60)),
        );
        (service, api)
    }

    fn brand_draft(name: &str, client: &str) -> Validated<BrandDraft> {
        BrandDraft {
            name: name.to_owned(),
            client_id: client.to_owned(),
            ..BrandDraft::default()
        }
        .validated()
        .expect("valid draft")
    }

    #[rstest]
    #[tokio::test]
    async fn created_brand_appears_in_next_list() {
        let (service, api) = brands();
        assert!(service.list(None).await.items().is_empty());

        service
            .create(&brand_draft("Acme", "c1"))
            .await
            .expect("create");

        assert!(service.cache().snapshot(&EntityService::<Brand>::key(None)).is_stale);
        let state = service.list(None).await;
        let acme = state.items().first().expect("one brand");
        assert_eq!(acme.name, "Acme");
        assert_eq!(acme.client_id.as_ref().map(EntityId::as_str), Some("c1"));
        assert_eq!(api.list_calls(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn updated_brand_replaces_its_listed_name() {
        let (service, api) = brands();
        let created = service
            .create(&brand_draft("Acme", "c1"))
            .await
            .expect("create");
        assert_eq!(service.list(None).await.items().len(), 1);
        let calls_before = api.list_calls();

        let updated = service
            .update(&created.id, &brand_draft("Acme Labs", "c1"))
            .await
            .expect("update");

        assert_eq!(updated.id, created.id);
        assert!(service.cache().snapshot(&EntityService::<Brand>::key(None)).is_stale);
        let names: Vec<_> = service
            .list(None)
            .await
            .items()
            .iter()
            .map(|brand| brand.name.clone())
            .collect();
        assert_eq!(names, ["Acme Labs"]);
        assert_eq!(api.list_calls(), calls_before + 1);
    }

    #[rstest]
    #[tokio::test]
    async fn mutation_invalidates_filtered_lists_too() {
        let (service, _) = brands();
        let filter = ListFilter::Client(EntityId::new("c1").expect("id"));
        service.list(Some(&filter)).await;
        service.list(None).await;

        service
            .create(&brand_draft("Acme", "c1"))
            .await
            .expect("create");

        assert!(service.cache().snapshot(&EntityService::<Brand>::key(Some(&filter))).is_stale);
        let names: Vec<_> = service
            .list(Some(&filter))
            .await
            .items()
            .iter()
            .map(|brand| brand.name.clone())
            .collect();
        assert_eq!(names, ["Acme"]);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_mutation_leaves_cache_fresh() {
        let (service, api) = brands();
        service.list(None).await;
        api.queue_failure(Error::conflict("Brand name already taken"));

        let err = service
            .create(&brand_draft("Acme", "c1"))
            .await
            .expect_err("conflict");

        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(!service.cache().snapshot(&EntityService::<Brand>::key(None)).is_stale);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_client_leaves_other_kinds_untouched() {
        let client_api = Arc::new(FixtureEntityApi::<Client>::new(Arc::new(DefaultClock)));
        let clients = EntityService::new(
            client_api as Arc<dyn EntityApi<Client>>,
            QueryCache::new(Duration::from_secs(60)),
        );
        let (brands, _) = brands();
        let draft = ClientDraft {
            name: "Northwind".to_owned(),
            email: "buyer@northwind.example".to_owned(),
            ..ClientDraft::default()
        }
        .validated()
        .expect("valid draft");
        let keep = clients.create(&draft).await.expect("create");
        let gone = clients.create(&draft).await.expect("create");
        brands
            .create(&brand_draft("Acme", keep.id.as_str()))
            .await
            .expect("brand");
        brands.list(None).await;

        clients.delete(&gone.id).await.expect("delete");

        let remaining: Vec<_> = clients
            .list(None)
            .await
            .items()
            .iter()
            .map(|client| client.id.clone())
            .collect();
        assert_eq!(remaining, [keep.id]);
        assert!(!brands.cache().snapshot(&EntityService::<Brand>::key(None)).is_stale);
        assert_eq!(brands.list(None).await.items().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn get_reports_missing_entities_as_none() {
        let (service, _) = brands();
        let id = EntityId::new("missing").expect("id");
        assert!(service.get(&id).await.expect("get").is_none());
    }
}
