//! Wire DTOs for the dashboard backend.
//!
//! Responses decode into these lenient transport shapes first and then map
//! into domain entities in one pass. Optional fields resolve to defaults here:
//! a missing status becomes the first variant, missing lists become empty, and
//! `_id`/`id` or `name`/`displayName` are accepted interchangeably.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ActivityStatus, AuthToken, Brand, Campaign, CampaignStatus, Client, Consumer, CredentialRecord,
    Entity, EntityId, QuestionKind, Role, Session, Survey, SurveyQuestion, SurveyStatus, UserId,
};

/// Entities the HTTP adapter can decode.
pub trait WireEntity: Entity {
    /// Lenient response shape of the entity.
    type Dto: DeserializeOwned + Send;

    /// Map a decoded DTO into the domain entity.
    fn from_dto(dto: Self::Dto) -> Result<Self, String>;
}

fn entity_id(raw: String, what: &str) -> Result<EntityId, String> {
    EntityId::new(raw).map_err(|err| format!("{what} id is invalid: {err}"))
}

fn reference(raw: Option<String>) -> Option<EntityId> {
    raw.and_then(|raw| EntityId::new(raw.trim()).ok())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ErrorFieldDto {
    Text(String),
    Detail {
        #[serde(default)]
        message: Option<String>,
    },
}

/// Error body: `{"message": ...}`, `{"error": "..."}` or
/// `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorFieldDto>,
}

impl ErrorBodyDto {
    pub(super) fn into_message(self) -> Option<String> {
        let nested = match self.error {
            Some(ErrorFieldDto::Text(text)) => Some(text),
            Some(ErrorFieldDto::Detail { message }) => message,
            None => None,
        };
        [self.message, nested]
            .into_iter()
            .flatten()
            .find(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LoginRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserDto {
    #[serde(alias = "_id", alias = "userId")]
    id: String,
    email: String,
    #[serde(default, alias = "displayName")]
    name: Option<String>,
    #[serde(default)]
    role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponseDto {
    token: String,
    user: UserDto,
}

impl LoginResponseDto {
    /// Map into a credential record; a missing role falls back to the role
    /// of the endpoint that answered.
    pub(super) fn into_record(self, endpoint_role: Role) -> Result<CredentialRecord, String> {
        let token = AuthToken::new(self.token).ok_or("login response carried a blank token")?;
        let user_id =
            UserId::new(self.user.id).map_err(|err| format!("user id is invalid: {err}"))?;
        let session = Session::new(
            user_id,
            self.user.email,
            self.user.name,
            self.user.role.unwrap_or(endpoint_role),
        );
        Ok(CredentialRecord::new(token, session))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "displayName")]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    status: ActivityStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl WireEntity for Client {
    type Dto = ClientDto;

    fn from_dto(dto: ClientDto) -> Result<Self, String> {
        Ok(Self {
            id: entity_id(dto.id, "client")?,
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
            industry: dto.industry,
            status: dto.status,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDto {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "displayName")]
    name: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    logo_url: Option<String>,
    #[serde(default)]
    status: ActivityStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl WireEntity for Brand {
    type Dto = BrandDto;

    fn from_dto(dto: BrandDto) -> Result<Self, String> {
        Ok(Self {
            id: entity_id(dto.id, "brand")?,
            name: dto.name,
            client_id: reference(dto.client_id),
            description: dto.description,
            logo_url: dto.logo_url,
            status: dto.status,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDto {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "displayName")]
    name: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    brand_ids: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    budget: Option<f64>,
    #[serde(default)]
    status: CampaignStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl WireEntity for Campaign {
    type Dto = CampaignDto;

    fn from_dto(dto: CampaignDto) -> Result<Self, String> {
        Ok(Self {
            id: entity_id(dto.id, "campaign")?,
            name: dto.name,
            client_id: reference(dto.client_id),
            brand_ids: dto
                .brand_ids
                .into_iter()
                .filter_map(|raw| reference(Some(raw)))
                .collect(),
            description: dto.description,
            start_date: dto.start_date,
            end_date: dto.end_date,
            budget: dto.budget,
            status: dto.status,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    #[serde(default, alias = "text")]
    prompt: String,
    #[serde(default, alias = "type")]
    kind: QuestionKind,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDto {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "name")]
    title: String,
    #[serde(default)]
    campaign_id: Option<String>,
    #[serde(default)]
    brand_id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    questions: Vec<QuestionDto>,
    #[serde(default)]
    status: SurveyStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl WireEntity for Survey {
    type Dto = SurveyDto;

    fn from_dto(dto: SurveyDto) -> Result<Self, String> {
        Ok(Self {
            id: entity_id(dto.id, "survey")?,
            title: dto.title,
            campaign_id: reference(dto.campaign_id),
            brand_id: reference(dto.brand_id),
            description: dto.description,
            questions: dto
                .questions
                .into_iter()
                .map(|question| SurveyQuestion {
                    prompt: question.prompt,
                    kind: question.kind,
                    options: question.options,
                })
                .collect(),
            status: dto.status,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerDto {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "displayName")]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    age: Option<u8>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "points")]
    reward_points: u32,
    #[serde(default)]
    status: ActivityStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl WireEntity for Consumer {
    type Dto = ConsumerDto;

    fn from_dto(dto: ConsumerDto) -> Result<Self, String> {
        Ok(Self {
            id: entity_id(dto.id, "consumer")?,
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
            age: dto.age,
            location: dto.location,
            reward_points: dto.reward_points,
            status: dto.status,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}
