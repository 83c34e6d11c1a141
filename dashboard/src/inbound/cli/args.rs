//! Command-line arguments for the `dashboard` operator CLI.

use clap::{Args, Parser, Subcommand};

use crate::domain::{ActivityStatus, BrandDraft, ClientDraft, Role};

/// `dashboard` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dashboard",
    about = "Operate the consumer-insights dashboard from the terminal",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in through the admin or client login endpoint.
    Login {
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Print the stored session.
    Whoami,
    /// Print the route guard decision for `path`.
    Guard { path: String },
    #[command(subcommand)]
    Clients(ClientsCommand),
    #[command(subcommand)]
    Brands(BrandsCommand),
    #[command(subcommand)]
    Campaigns(CampaignsCommand),
    #[command(subcommand)]
    Surveys(SurveysCommand),
    #[command(subcommand)]
    Consumers(ConsumersCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum ClientsCommand {
    List,
    Show { id: String },
    Delete { id: String },
    Create(ClientArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum BrandsCommand {
    List {
        #[arg(long = "client-id", value_name = "id")]
        client_id: Option<String>,
    },
    Show { id: String },
    Delete { id: String },
    Create(BrandArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum CampaignsCommand {
    List {
        #[arg(long = "client-id", value_name = "id")]
        client_id: Option<String>,
    },
    Show { id: String },
    Delete { id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum SurveysCommand {
    List {
        #[arg(long = "campaign-id", value_name = "id")]
        campaign_id: Option<String>,
    },
    Show { id: String },
    Delete { id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConsumersCommand {
    List,
    Show { id: String },
    Delete { id: String },
}

/// Fields of the client form.
#[derive(Debug, Clone, Args)]
pub struct ClientArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub industry: Option<String>,
    #[arg(long)]
    pub inactive: bool,
}

impl From<ClientArgs> for ClientDraft {
    fn from(args: ClientArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            phone: args.phone,
            industry: args.industry,
            status: status(args.inactive),
        }
    }
}

/// Fields of the brand form.
#[derive(Debug, Clone, Args)]
pub struct BrandArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long = "client-id", value_name = "id", default_value = "")]
    pub client_id: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "logo-url", value_name = "url")]
    pub logo_url: Option<String>,
    #[arg(long)]
    pub inactive: bool,
}

impl From<BrandArgs> for BrandDraft {
    fn from(args: BrandArgs) -> Self {
        Self {
            name: args.name,
            client_id: args.client_id,
            description: args.description,
            logo_url: args.logo_url,
            status: status(args.inactive),
        }
    }
}

fn status(inactive: bool) -> ActivityStatus {
    if inactive {
        ActivityStatus::Inactive
    } else {
        ActivityStatus::Active
    }
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse::<Role>().map_err(|err| err.to_string())
}
