//! Brands owned by a client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ActivityStatus, Entity, EntityId, EntityKind, ListFilter};
use crate::domain::validation::{
    DESCRIPTION_MAX, FieldErrors, NAME_MAX, Validate, trim_optional_text, trim_text,
};

/// A brand marketed by one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: EntityId,
    pub name: String,
    /// Owning client; may dangle if the client was removed.
    pub client_id: Option<EntityId>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: ActivityStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a [`Brand`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDraft {
    pub name: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub status: ActivityStatus,
}

impl Validate for BrandDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Name", &self.name, NAME_MAX);
        errors.require_reference("clientId", "client", &self.client_id);
        errors.limit_optional_text(
            "description",
            "Description",
            self.description.as_deref(),
            DESCRIPTION_MAX,
        );
        if self
            .logo_url
            .as_deref()
            .is_some_and(|logo| Url::parse(logo.trim()).is_err())
        {
            errors.add("logoUrl", "Enter a valid URL");
        }
        errors
    }

    fn normalized(mut self) -> Self {
        trim_text(&mut self.name);
        trim_text(&mut self.client_id);
        trim_optional_text(&mut self.description);
        trim_optional_text(&mut self.logo_url);
        self
    }
}

impl Entity for Brand {
    type Draft = BrandDraft;

    const KIND: EntityKind = EntityKind::Brand;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        self.name.as_str()
    }

    fn matches(&self, filter: &ListFilter) -> bool {
        match filter {
            ListFilter::Client(client) => self.client_id.as_ref() == Some(client),
            ListFilter::Brand(_) | ListFilter::Campaign(_) => false,
        }
    }

    fn from_draft(
        id: EntityId,
        draft: &BrandDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            client_id: EntityId::new(draft.client_id.trim()).ok(),
            description: draft.description.clone(),
            logo_url: draft.logo_url.clone(),
            status: draft.status,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }
}
