//! `dashboard` entry point: loads configuration, builds application state and
//! runs one operator command.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use dashboard::app::{AppState, DashboardSettings, RequiredEnv};
use dashboard::inbound::cli::{Cli, run};

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let required =
        RequiredEnv::from_env(&DefaultEnv::new()).wrap_err("invalid startup environment")?;
    let settings = DashboardSettings::load_from_iter([OsString::from("dashboard")])
        .map_err(|err| eyre!("failed to load dashboard settings: {err}"))?;
    let state = AppState::build(&required, &settings).wrap_err("failed to build dashboard")?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    let mut stdout = io::stdout().lock();
    let outcome = runtime.block_on(run(cli.command, &state, &mut stdout));
    state.shutdown();
    outcome.wrap_err("command failed")
}
