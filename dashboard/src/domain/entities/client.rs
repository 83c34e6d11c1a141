//! Client accounts managed by admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityStatus, Entity, EntityId, EntityKind, ListFilter};
use crate::domain::validation::{FieldErrors, NAME_MAX, Validate, trim_optional_text, trim_text};

const PHONE_MAX: usize = 32;

/// A customer organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub status: ActivityStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a [`Client`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub status: ActivityStatus,
}

impl Validate for ClientDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Name", &self.name, NAME_MAX);
        errors.require_email("email", &self.email);
        errors.limit_optional_text("phone", "Phone", self.phone.as_deref(), PHONE_MAX);
        errors.limit_optional_text("industry", "Industry", self.industry.as_deref(), NAME_MAX);
        errors
    }

    fn normalized(mut self) -> Self {
        trim_text(&mut self.name);
        trim_text(&mut self.email);
        trim_optional_text(&mut self.phone);
        trim_optional_text(&mut self.industry);
        self
    }
}

impl Entity for Client {
    type Draft = ClientDraft;

    const KIND: EntityKind = EntityKind::Client;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        self.name.as_str()
    }

    fn matches(&self, _filter: &ListFilter) -> bool {
        false
    }

    fn from_draft(
        id: EntityId,
        draft: &ClientDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            email: draft.email.trim().to_owned(),
            phone: draft.phone.clone(),
            industry: draft.industry.clone(),
            status: draft.status,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }
}
