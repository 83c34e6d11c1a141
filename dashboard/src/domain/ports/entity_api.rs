//! Driven port for per-entity CRUD against the backend.
//!
//! Callers validate payloads first; implementations never re-validate. No
//! caching happens behind this port.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::entities::{Entity, EntityId, ListFilter};

/// Typed CRUD over one entity collection.
#[async_trait]
pub trait EntityApi<E: Entity>: Send + Sync {
    /// Every entity in the collection, narrowed by `filter` when given.
    async fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<E>, Error>;

    /// The entity with `id`, or `None` when the backend has no such entity.
    async fn get(&self, id: &EntityId) -> Result<Option<E>, Error>;

    /// Create an entity from `draft` and return the stored form.
    async fn create(&self, draft: &E::Draft) -> Result<E, Error>;

    /// Replace the entity with `id` and return the stored form.
    async fn update(&self, id: &EntityId, draft: &E::Draft) -> Result<E, Error>;

    /// Remove the entity with `id`.
    async fn delete(&self, id: &EntityId) -> Result<(), Error>;
}

#[derive(Debug)]
struct FixtureInner<E> {
    items: Vec<E>,
    failures: VecDeque<Error>,
}

/// In-memory collection that mimics the backend.
///
/// Ids are random UUIDs and timestamps come from the injected clock. Queued
/// failures are returned, one per call, before any operation touches the
/// collection.
pub struct FixtureEntityApi<E: Entity> {
    inner: Mutex<FixtureInner<E>>,
    clock: Arc<dyn Clock>,
    list_calls: AtomicUsize,
}

impl<E: Entity> FixtureEntityApi<E> {
    /// An empty collection.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_items(clock, Vec::new())
    }

    /// A collection seeded with `items`.
    pub fn with_items(clock: Arc<dyn Clock>, items: Vec<E>) -> Self {
        Self {
            inner: Mutex::new(FixtureInner {
                items,
                failures: VecDeque::new(),
            }),
            clock,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Make the next call fail with `error`.
    pub fn queue_failure(&self, error: Error) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.push_back(error);
        }
    }

    /// Number of `list` calls served so far, failed ones included.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored entities.
    pub fn items(&self) -> Vec<E> {
        self.inner
            .lock()
            .map(|inner| inner.items.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, FixtureInner<E>>, Error> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| Error::internal("fixture collection lock poisoned"))?;
        match inner.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(inner),
        }
    }

    fn missing(id: &EntityId) -> Error {
        Error::not_found(format!("{} {id} not found", E::KIND.label()))
    }
}

#[async_trait]
impl<E: Entity> EntityApi<E> for FixtureEntityApi<E> {
    async fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<E>, Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.lock()?;
        Ok(inner
            .items
            .iter()
            .filter(|item| filter.is_none_or(|filter| item.matches(filter)))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &EntityId) -> Result<Option<E>, Error> {
        let inner = self.lock()?;
        Ok(inner.items.iter().find(|item| item.id() == id).cloned())
    }

    async fn create(&self, draft: &E::Draft) -> Result<E, Error> {
        let id = EntityId::new(Uuid::new_v4().to_string())
            .map_err(|err| Error::internal(format!("generated id rejected: {err}")))?;
        let now = self.clock.utc();
        let mut inner = self.lock()?;
        let created = E::from_draft(id, draft, now, now);
        inner.items.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &EntityId, draft: &E::Draft) -> Result<E, Error> {
        let now = self.clock.utc();
        let mut inner = self.lock()?;
        let slot = inner
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Self::missing(id))?;
        *slot = E::from_draft(id.clone(), draft, now, now);
        Ok(slot.clone())
    }

    async fn delete(&self, id: &EntityId) -> Result<(), Error> {
        let mut inner = self.lock()?;
        let before = inner.items.len();
        inner.items.retain(|item| item.id() != id);
        if inner.items.len() == before {
            return Err(Self::missing(id));
        }
        Ok(())
    }
}
