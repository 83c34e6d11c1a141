//! Surveys attached to a campaign and a brand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId, EntityKind, ListFilter};
use crate::domain::validation::{
    DESCRIPTION_MAX, FieldErrors, NAME_MAX, Validate, trim_optional_text, trim_text,
};

const MIN_CHOICE_OPTIONS: usize = 2;

/// Survey lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    #[default]
    Draft,
    Active,
    Closed,
}

impl SurveyStatus {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

/// Answer format of a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    #[default]
    SingleChoice,
    MultipleChoice,
    Text,
    Rating,
}

impl QuestionKind {
    fn needs_options(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

/// One survey question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
}

/// A consumer survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: EntityId,
    pub title: String,
    pub campaign_id: Option<EntityId>,
    pub brand_id: Option<EntityId>,
    pub description: Option<String>,
    pub questions: Vec<SurveyQuestion>,
    pub status: SurveyStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a [`Survey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDraft {
    pub title: String,
    pub campaign_id: String,
    pub brand_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<SurveyQuestion>,
    pub status: SurveyStatus,
}

impl Validate for SurveyDraft {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("title", "Title", &self.title, NAME_MAX);
        errors.require_reference("campaignId", "campaign", &self.campaign_id);
        errors.require_reference("brandId", "brand", &self.brand_id);
        errors.limit_optional_text(
            "description",
            "Description",
            self.description.as_deref(),
            DESCRIPTION_MAX,
        );
        if self.questions.is_empty() {
            errors.add("questions", "Add at least one question");
        }
        for (index, question) in self.questions.iter().enumerate() {
            let number = index + 1;
            if question.prompt.trim().is_empty() {
                errors.add("questions", format!("Question {number} needs a prompt"));
            }
            let options = question
                .options
                .iter()
                .filter(|option| !option.trim().is_empty())
                .count();
            if question.kind.needs_options() && options < MIN_CHOICE_OPTIONS {
                errors.add(
                    "questions",
                    format!("Question {number} needs at least {MIN_CHOICE_OPTIONS} options"),
                );
            } else if options < question.options.len() {
                errors.add("questions", format!("Question {number} has a blank option"));
            }
        }
        errors
    }

    fn normalized(mut self) -> Self {
        trim_text(&mut self.title);
        trim_text(&mut self.campaign_id);
        trim_text(&mut self.brand_id);
        trim_optional_text(&mut self.description);
        for question in &mut self.questions {
            trim_text(&mut question.prompt);
            question.options.iter_mut().for_each(trim_text);
        }
        self
    }
}

impl Entity for Survey {
    type Draft = SurveyDraft;

    const KIND: EntityKind = EntityKind::Survey;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn label(&self) -> &str {
        self.title.as_str()
    }

    fn matches(&self, filter: &ListFilter) -> bool {
        match filter {
            ListFilter::Campaign(campaign) => self.campaign_id.as_ref() == Some(campaign),
            ListFilter::Brand(brand) => self.brand_id.as_ref() == Some(brand),
            ListFilter::Client(_) => false,
        }
    }

    fn from_draft(
        id: EntityId,
        draft: &SurveyDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title.trim().to_owned(),
            campaign_id: EntityId::new(draft.campaign_id.trim()).ok(),
            brand_id: EntityId::new(draft.brand_id.trim()).ok(),
            description: draft.description.clone(),
            questions: draft.questions.clone(),
            status: draft.status,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }
}
