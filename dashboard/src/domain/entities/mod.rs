//! Dashboard entities and their form drafts.
//!
//! Each entity carries an opaque backend identifier, its domain attributes,
//! an enumerated status and optional `createdAt`/`updatedAt` timestamps.
//! Parent links are plain ids: Brand→Client, Campaign→Client and
//! Campaign→Brands (by id list), Survey→Campaign and Survey→Brand.
//!
//! Wire names are camelCase throughout.

mod brand;
mod campaign;
mod client;
mod consumer;
mod survey;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::{IdValidationError, check_identifier};
use super::validation::Validate;

pub use self::brand::{Brand, BrandDraft};
pub use self::campaign::{Campaign, CampaignDraft, CampaignStatus};
pub use self::client::{Client, ClientDraft};
pub use self::consumer::{AGE_MAX, AGE_MIN, Consumer, ConsumerDraft};
pub use self::survey::{QuestionKind, Survey, SurveyDraft, SurveyQuestion, SurveyStatus};

/// Opaque backend identifier of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Validate and construct an [`EntityId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let id = id.into();
        check_identifier(&id)?;
        Ok(Self(id))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Entity type tag, used for cache keys and REST collection names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Client,
    Brand,
    Campaign,
    Survey,
    Consumer,
}

impl EntityKind {
    /// Every kind, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Client,
        Self::Brand,
        Self::Campaign,
        Self::Survey,
        Self::Consumer,
    ];

    /// REST collection segment, e.g. `brands`.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Client => "clients",
            Self::Brand => "brands",
            Self::Campaign => "campaigns",
            Self::Survey => "surveys",
            Self::Consumer => "consumers",
        }
    }

    /// Singular human label, e.g. `brand`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Brand => "brand",
            Self::Campaign => "campaign",
            Self::Survey => "survey",
            Self::Consumer => "consumer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Status shared by clients, brands and consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[default]
    Active,
    Inactive,
}

impl ActivityStatus {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Parent filter narrowing a list request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListFilter {
    /// Items owned by a client.
    Client(EntityId),
    /// Items linked to a brand.
    Brand(EntityId),
    /// Items belonging to a campaign.
    Campaign(EntityId),
}

impl ListFilter {
    /// Query parameter name and value, e.g. `("clientId", "c1")`.
    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            Self::Client(id) => ("clientId", id.as_str()),
            Self::Brand(id) => ("brandId", id.as_str()),
            Self::Campaign(id) => ("campaignId", id.as_str()),
        }
    }
}

impl fmt::Display for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, value) = self.query_pair();
        write!(f, "{name}={value}")
    }
}

/// Common behaviour of the five dashboard entities.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Form payload used to create or update the entity.
    type Draft: Validate + Clone + fmt::Debug + Serialize + Send + Sync + 'static;

    /// Type tag.
    const KIND: EntityKind;

    /// Backend identifier.
    fn id(&self) -> &EntityId;

    /// Name or title shown in lists and reference labels.
    fn label(&self) -> &str;

    /// Whether the entity falls within `filter`. Filters that do not apply
    /// to the entity type never match.
    fn matches(&self, filter: &ListFilter) -> bool;

    /// Build the stored entity a backend would return for `draft`.
    fn from_draft(
        id: EntityId,
        draft: &Self::Draft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self;
}

/// Display label for a parent reference.
///
/// Dangling references fall back to the raw id; absent ones to `"Unknown"`.
///
/// # Examples
/// ```
/// use dashboard::domain::{reference_label, EntityId};
///
/// let id = EntityId::new("c9").unwrap();
/// assert_eq!(reference_label(Some(&id), |_| None), "c9");
/// assert_eq!(reference_label(None, |_| Some("Acme".to_owned())), "Unknown");
/// ```
pub fn reference_label(
    id: Option<&EntityId>,
    lookup: impl Fn(&EntityId) -> Option<String>,
) -> String {
    match id {
        None => "Unknown".to_owned(),
        Some(id) => lookup(id).unwrap_or_else(|| id.to_string()),
    }
}

/// Look up the label of the entity with `id` in a fetched list.
pub fn label_in<E: Entity>(items: &[E], id: &EntityId) -> Option<String> {
    items
        .iter()
        .find(|item| item.id() == id)
        .map(|item| item.label().to_owned())
}
