//! Operator CLI standing in for the dashboard views.
//!
//! Each invocation restores the stored session, runs one command against
//! [`AppState`] and writes `key=value` records to the supplied writer.

mod args;
pub mod render;

use std::io::{self, Write};

pub use args::{
    BrandArgs, BrandsCommand, CampaignsCommand, Cli, ClientArgs, ClientsCommand, Command,
    ConsumersCommand, SurveysCommand,
};

use crate::app::AppState;
use crate::domain::{
    BrandDraft, ClientDraft, Entity, EntityId, EntityService, Error, ErrorCode, FormDialog, ListFilter,
    LoginCredentials, Notice, QueryState, Role, SubmitOutcome, decide, label_in,
};

/// Failures reported by CLI commands.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// The backend or a domain service rejected the request.
    #[error(transparent)]
    Request(#[from] Error),
    /// Arguments failed validation before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Rendering to the output stream failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Execute `command` and render its outcome to `out`.
///
/// A request rejected as unauthorized while a session is stored drops that
/// session.
///
/// # Errors
///
/// Returns [`CliError`] when validation fails, the backend rejects the
/// request or the output cannot be written.
pub async fn run<W: Write>(command: Command, state: &AppState, out: &mut W) -> Result<(), CliError> {
    state.session.restore();
    let result = dispatch(command, state, out).await;
    let rejected = matches!(
        &result,
        Err(CliError::Request(error)) if error.code() == ErrorCode::Unauthorized
    );
    if rejected && state.session.state().session().is_some() {
        let target = state.session.invalidate();
        writeln!(out, "session=expired redirect={target}")?;
    }
    result
}

async fn dispatch<W: Write>(
    command: Command,
    state: &AppState,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Command::Login {
            role,
            email,
            password,
        } => login(state, role, &email, &password, out).await,
        Command::Logout => {
            let target = state.session.logout();
            writeln!(out, "session=anonymous redirect={target}")?;
            Ok(())
        }
        Command::Whoami => {
            writeln!(out, "{}", render::session(&state.session.state()))?;
            Ok(())
        }
        Command::Guard { path } => {
            let decision = decide(&state.session.state(), &path);
            writeln!(out, "{}", render::guard(&path, decision))?;
            Ok(())
        }
        Command::Clients(command) => clients(state, command, out).await,
        Command::Brands(command) => brands(state, command, out).await,
        Command::Campaigns(command) => campaigns(state, command, out).await,
        Command::Surveys(command) => surveys(state, command, out).await,
        Command::Consumers(command) => consumers(state, command, out).await,
    }
}

async fn login<W: Write>(
    state: &AppState,
    role: Role,
    email: &str,
    password: &str,
    out: &mut W,
) -> Result<(), CliError> {
    let credentials = match LoginCredentials::try_from_parts(email, password) {
        Ok(credentials) => credentials,
        Err(err) => {
            writeln!(out, "field={} error={err}", err.field())?;
            return Err(CliError::InvalidInput(err.to_string()));
        }
    };
    let session = state.session.login(role, &credentials).await?;
    writeln!(out, "{}", render::session(&state.session.state()))?;
    writeln!(out, "redirect={}", session.role().dashboard_path())?;
    Ok(())
}

fn entity_id(raw: &str) -> Result<EntityId, CliError> {
    EntityId::new(raw).map_err(|err| CliError::InvalidInput(err.to_string()))
}

fn parent_filter(
    raw: Option<String>,
    filter: fn(EntityId) -> ListFilter,
) -> Result<Option<ListFilter>, CliError> {
    raw.map(|id| entity_id(&id).map(filter)).transpose()
}

/// Cached list, failing when the latest fetch failed.
async fn fetch_list<E: Entity>(
    service: &EntityService<E>,
    filter: Option<&ListFilter>,
) -> Result<QueryState<E>, CliError> {
    let mut state = service.list(filter).await;
    match state.error.take() {
        Some(error) => Err(error.into()),
        None => Ok(state),
    }
}

/// Lookup table for reference labels; a failed fetch leaves raw ids.
async fn labels<E: Entity>(service: &EntityService<E>) -> impl Fn(&EntityId) -> Option<String> {
    let state = service.list(None).await;
    move |id: &EntityId| label_in(state.items(), id)
}

async fn list<E: Entity, W: Write>(
    service: &EntityService<E>,
    filter: Option<ListFilter>,
    render: impl Fn(&E) -> String,
    out: &mut W,
) -> Result<(), CliError> {
    let state = fetch_list(service, filter.as_ref()).await?;
    if state.items().is_empty() {
        writeln!(out, "no {} found", E::KIND.collection())?;
    }
    for item in state.items() {
        writeln!(out, "{}", render(item))?;
    }
    Ok(())
}

async fn show<E: Entity, W: Write>(
    service: &EntityService<E>,
    raw_id: &str,
    render: impl Fn(&E) -> String,
    out: &mut W,
) -> Result<(), CliError> {
    let id = entity_id(raw_id)?;
    match service.get(&id).await? {
        Some(item) => writeln!(out, "{}", render(&item))?,
        None => writeln!(out, "{} {id} not found", E::KIND.label())?,
    }
    Ok(())
}

async fn delete<E: Entity, W: Write>(
    service: &EntityService<E>,
    raw_id: &str,
    out: &mut W,
) -> Result<(), CliError> {
    let id = entity_id(raw_id)?;
    service.delete(&id).await?;
    writeln!(out, "deleted {} id={id}", E::KIND.label())?;
    Ok(())
}

fn report<T, W: Write>(
    outcome: SubmitOutcome<T>,
    notice: Option<&Notice>,
    render: impl Fn(&T) -> String,
    out: &mut W,
) -> Result<(), CliError> {
    if let Some(notice) = notice {
        writeln!(out, "notice={}", notice.message())?;
    }
    match outcome {
        SubmitOutcome::Saved(item) => {
            writeln!(out, "{}", render(&item))?;
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            for line in render::field_errors(&errors) {
                writeln!(out, "{line}")?;
            }
            Err(CliError::InvalidInput(format!(
                "{} field(s) failed validation",
                errors.len()
            )))
        }
        SubmitOutcome::Failed(error) => Err(error.into()),
    }
}

async fn clients<W: Write>(
    state: &AppState,
    command: ClientsCommand,
    out: &mut W,
) -> Result<(), CliError> {
    let service = &state.clients;
    match command {
        ClientsCommand::List => list(service, None, render::client, out).await,
        ClientsCommand::Show { id } => show(service, &id, render::client, out).await,
        ClientsCommand::Delete { id } => delete(service, &id, out).await,
        ClientsCommand::Create(args) => {
            let mut dialog = FormDialog::new("Client created successfully");
            dialog.open(ClientDraft::from(args));
            let outcome = dialog
                .submit(|draft| async move { service.create(&draft).await })
                .await;
            report(outcome, dialog.notice(), render::client, out)
        }
    }
}

async fn brands<W: Write>(
    state: &AppState,
    command: BrandsCommand,
    out: &mut W,
) -> Result<(), CliError> {
    let service = &state.brands;
    match command {
        BrandsCommand::List { client_id } => {
            let filter = parent_filter(client_id, ListFilter::Client)?;
            let clients = labels(&state.clients).await;
            list(service, filter, |brand| render::brand(brand, &clients), out).await
        }
        BrandsCommand::Show { id } => {
            let clients = labels(&state.clients).await;
            show(service, &id, |brand| render::brand(brand, &clients), out).await
        }
        BrandsCommand::Delete { id } => delete(service, &id, out).await,
        BrandsCommand::Create(args) => {
            let mut dialog = FormDialog::new("Brand created successfully");
            dialog.open(BrandDraft::from(args));
            let outcome = dialog
                .submit(|draft| async move { service.create(&draft).await })
                .await;
            let clients = labels(&state.clients).await;
            report(
                outcome,
                dialog.notice(),
                |brand| render::brand(brand, &clients),
                out,
            )
        }
    }
}

async fn campaigns<W: Write>(
    state: &AppState,
    command: CampaignsCommand,
    out: &mut W,
) -> Result<(), CliError> {
    let service = &state.campaigns;
    match command {
        CampaignsCommand::List { client_id } => {
            let filter = parent_filter(client_id, ListFilter::Client)?;
            let clients = labels(&state.clients).await;
            list(service, filter, |item| render::campaign(item, &clients), out).await
        }
        CampaignsCommand::Show { id } => {
            let clients = labels(&state.clients).await;
            show(service, &id, |item| render::campaign(item, &clients), out).await
        }
        CampaignsCommand::Delete { id } => delete(service, &id, out).await,
    }
}

async fn surveys<W: Write>(
    state: &AppState,
    command: SurveysCommand,
    out: &mut W,
) -> Result<(), CliError> {
    let service = &state.surveys;
    match command {
        SurveysCommand::List { campaign_id } => {
            let filter = parent_filter(campaign_id, ListFilter::Campaign)?;
            let campaigns = labels(&state.campaigns).await;
            list(service, filter, |item| render::survey(item, &campaigns), out).await
        }
        SurveysCommand::Show { id } => {
            let campaigns = labels(&state.campaigns).await;
            show(service, &id, |item| render::survey(item, &campaigns), out).await
        }
        SurveysCommand::Delete { id } => delete(service, &id, out).await,
    }
}

async fn consumers<W: Write>(
    state: &AppState,
    command: ConsumersCommand,
    out: &mut W,
) -> Result<(), CliError> {
    let service = &state.consumers;
    match command {
        ConsumersCommand::List => list(service, None, render::consumer, out).await,
        ConsumersCommand::Show { id } => show(service, &id, render::consumer, out).await,
        ConsumersCommand::Delete { id } => delete(service, &id, out).await,
    }
}
