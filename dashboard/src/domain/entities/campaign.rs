//! Campaigns run by a client across one or more of its brands.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId, EntityKind, ListFilter};
use crate::domain::validation::{
    DESCRIPTION_MAX, FieldErrors, NAME_MAX, Validate, trim_optional_text, trim_text,
};

/// Campaign lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

/// A marketing campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: EntityId,
    pub name: String,
    pub client_id: Option<EntityId>,
    pub brand_ids: Vec<EntityId>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub status: CampaignStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a [`Campaign`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    pub name: String,
    pub client_id: String,
    pub brand_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    pub status: CampaignStatus,
}

impl Validate for CampaignDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Name", &self.name, NAME_MAX);
        errors.require_reference("clientId", "client", &self.client_id);
        if self.brand_ids.iter().all(|id| id.trim().is_empty()) {
            errors.add("brandIds", "Select at least one brand");
        } else if self.brand_ids.iter().any(|id| id.trim().is_empty()) {
            errors.add("brandIds", "Brand selections must not be blank");
        }
        errors.limit_optional_text(
            "description",
            "Description",
            self.description.as_deref(),
            DESCRIPTION_MAX,
        );
        if matches!(
            (self.start_date, self.end_date),
            (Some(start), Some(end)) if end < start
        ) {
            errors.add("endDate", "End date must not be before the start date");
        }
        if self
            .budget
            .is_some_and(|budget| !budget.is_finite() || budget < 0.0)
        {
            errors.add("budget", "Budget must be a non-negative amount");
        }
        errors
    }

    fn normalized(mut self) -> Self {
        trim_text(&mut self.name);
        trim_text(&mut self.client_id);
        self.brand_ids.iter_mut().for_each(trim_text);
        trim_optional_text(&mut self.description);
        self
    }
}

impl Entity for Campaign {
    type Draft = CampaignDraft;

    const KIND: EntityKind = EntityKind::Campaign;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        self.name.as_str()
    }

    fn matches(&self, filter: &ListFilter) -> bool {
        match filter {
            ListFilter::Client(client) => self.client_id.as_ref() == Some(client),
            ListFilter::Brand(brand) => self.brand_ids.contains(brand),
            ListFilter::Campaign(_) => false,
        }
    }

    fn from_draft(
        id: EntityId,
        draft: &CampaignDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            client_id: EntityId::new(draft.client_id.trim()).ok(),
            brand_ids: draft
                .brand_ids
                .iter()
                .filter_map(|raw| EntityId::new(raw.trim()).ok())
                .collect(),
            description: draft.description.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            budget: draft.budget,
            status: draft.status,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }
}
