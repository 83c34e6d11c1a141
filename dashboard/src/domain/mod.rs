//! Domain primitives, use-cases and ports.
//!
//! Purpose: keep the dashboard core free of transport concerns. Adapters in
//! `outbound` implement the traits in [`ports`]; inbound surfaces drive the
//! services defined here.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failures with stable codes.
//! - Role, LoginCredentials, AuthToken: authentication inputs and outputs.
//! - Session, SessionState, CredentialRecord: the session model.
//! - SessionResolver: owns the session lifecycle.
//! - decide / Navigator: route guard.
//! - QueryCache / EntityService: cached entity lists and mutations.
//! - FormDialog: validated form submission.

pub mod auth;
pub mod dialog;
pub mod entities;
pub mod entity_service;
pub mod error;
pub mod ports;
pub mod query_cache;
pub mod route_guard;
pub mod session;
pub mod session_service;
pub mod validation;

pub use self::auth::{AuthToken, LoginCredentials, LoginValidationError, Role, UnknownRole};
pub use self::dialog::{FormDialog, Notice, NoticeKind, SubmitOutcome};
pub use self::entities::{
    ActivityStatus, Brand, BrandDraft, Campaign, CampaignDraft, CampaignStatus, Client,
    ClientDraft, Consumer, ConsumerDraft, Entity, EntityId, EntityKind, ListFilter, QuestionKind,
    Survey, SurveyDraft, SurveyQuestion, SurveyStatus, label_in, reference_label,
};
pub use self::entity_service::EntityService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, GENERIC_NETWORK_FAILURE};
pub use self::query_cache::{DEFAULT_INVALIDATION_WINDOW, Fetcher, QueryCache, QueryState};
pub use self::route_guard::{GuardDecision, Navigator, PUBLIC_PATHS, decide, is_public_path};
pub use self::session::{CredentialRecord, IdValidationError, Session, SessionState, UserId};
pub use self::session_service::SessionResolver;
pub use self::validation::{FieldErrors, Validate, Validated};
