//! Panel consumers and their reward balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityStatus, Entity, EntityId, EntityKind, ListFilter};
use crate::domain::validation::{FieldErrors, NAME_MAX, Validate, trim_optional_text, trim_text};

/// Youngest consumer the panel may enrol.
pub const AGE_MIN: u8 = 13;
/// Oldest plausible consumer age.
pub const AGE_MAX: u8 = 120;

/// A survey respondent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<u8>,
    pub location: Option<String>,
    /// Reward points earned by completing surveys.
    pub reward_points: u32,
    pub status: ActivityStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a [`Consumer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerDraft {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub reward_points: u32,
    pub status: ActivityStatus,
}

impl Validate for ConsumerDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Name", &self.name, NAME_MAX);
        errors.require_email("email", &self.email);
        if self
            .age
            .is_some_and(|age| !(AGE_MIN..=AGE_MAX).contains(&age))
        {
            errors.add("age", format!("Age must be between {AGE_MIN} and {AGE_MAX}"));
        }
        errors.limit_optional_text("location", "Location", self.location.as_deref(), NAME_MAX);
        errors
    }

    fn normalized(mut self) -> Self {
        trim_text(&mut self.name);
        trim_text(&mut self.email);
        trim_optional_text(&mut self.phone);
        trim_optional_text(&mut self.location);
        self
    }
}

impl Entity for Consumer {
    type Draft = ConsumerDraft;

    const KIND: EntityKind = EntityKind::Consumer;

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
        draft: &ConsumerDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            email: draft.email.trim().to_owned(),
            phone: draft.phone.clone(),
            age: draft.age,
            location: draft.location.clone(),
            reward_points: draft.reward_points,
            status: draft.status,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }
}
