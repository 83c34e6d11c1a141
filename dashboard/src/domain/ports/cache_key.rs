//! Identity of a cached entity list: the entity type plus an optional parent
//! filter.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::entities::{EntityId, EntityKind, ListFilter};

/// Cache key for one entity list, rendered as `brands` or
/// `brands?clientId=c1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    kind: EntityKind,
    filter: Option<ListFilter>,
}

impl CacheKey {
    /// Key of the unfiltered list of `kind`.
    pub fn list(kind: EntityKind) -> Self {
        Self { kind, filter: None }
    }

    /// Key of the list of `kind` narrowed by `filter`.
    pub fn filtered(kind: EntityKind, filter: ListFilter) -> Self {
        Self {
            kind,
            filter: Some(filter),
        }
    }

    /// Entity type of the list.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Parent filter, if any.
    pub fn filter(&self) -> Option<&ListFilter> {
        self.filter.as_ref()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}?{filter}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Validation errors returned when parsing a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("cache key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
    /// Collection segment names no known entity type.
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
    /// Filter segment is not `clientId=`, `brandId=` or `campaignId=` with an id.
    #[error("malformed list filter '{0}'")]
    MalformedFilter(String),
}

impl FromStr for CacheKey {
    type Err = CacheKeyValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().is_empty() {
            return Err(CacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(CacheKeyValidationError::ContainsWhitespace);
        }
        let (collection, filter) = match raw.split_once('?') {
            Some((collection, filter)) => (collection, Some(filter)),
            None => (raw, None),
        };
        let kind = EntityKind::ALL
            .into_iter()
            .find(|kind| kind.collection() == collection)
            .ok_or_else(|| CacheKeyValidationError::UnknownCollection(collection.to_owned()))?;
        let Some(filter) = filter else {
            return Ok(Self::list(kind));
        };
        let malformed = || CacheKeyValidationError::MalformedFilter(filter.to_owned());
        let (name, value) = filter.split_once('=').ok_or_else(malformed)?;
        let id = EntityId::new(value).map_err(|_| malformed())?;
        let filter = match name {
            "clientId" => ListFilter::Client(id),
            "brandId" => ListFilter::Brand(id),
            "campaignId" => ListFilter::Campaign(id),
            _ => return Err(malformed()),
        };
        Ok(Self::filtered(kind, filter))
    }
}
