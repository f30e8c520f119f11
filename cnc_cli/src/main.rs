//! onlycncs-admin - command-line front-end for the OnlyCNCs admin console.
//!
//! Every command drives the same screen controller the console uses, so
//! validation, error messages and re-fetch behaviour are identical.
//!
//! Configuration comes from `ONLYCNCS_BASE_URL_ADMIN`, `ONLYCNCS_BASE_URL`
//! and `ONLYCNCS_AUTHORIZATION`; the global flags override them.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cnc_admin::{AdminConfig, HttpAdminApi};
use cnc_common::{Bit, EntityId, Machine, Material, Spindle};
use tracing::debug;

// =============================================================================
// CLI Arguments
// =============================================================================

#[derive(Parser)]
#[command(name = "onlycncs-admin")]
#[command(version)]
#[command(about = "OnlyCNCs admin console", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(long, global = true)]
    admin_url: Option<String>,

    /// Public site API base URL
    #[arg(long, global = true)]
    public_url: Option<String>,

    /// Authorization token
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage machines
    Machines {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage spindles
    Spindles {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage materials
    Materials {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage bits
    Bits {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// All cutting settings, with spindle/bit/material pickers
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Settings of one spindle: CSV upload/export and cascade delete
    SpindleSettings {
        /// Spindle id
        spindle: EntityId,
        #[command(subcommand)]
        action: SpindleSettingsAction,
    },
    /// Admin accounts
    Admins {
        #[command(subcommand)]
        action: AdminsAction,
    },
    /// Registered users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Calls made by the public site
    Public {
        #[command(subcommand)]
        action: PublicAction,
    },
}

#[derive(Subcommand)]
enum EntityAction {
    /// List newest first
    List,
    View {
        id: EntityId,
    },
    Create(EntityFields),
    Edit {
        id: EntityId,
        #[command(flatten)]
        fields: EntityFields,
    },
    Delete {
        id: EntityId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Form inputs; flags that do not apply to a collection are ignored.
#[derive(Args, Debug, Default)]
struct EntityFields {
    #[arg(long)]
    name: Option<String>,
    /// Machines only
    #[arg(long)]
    multiplier: Option<String>,
    /// Bits only: diameter used in calculations
    #[arg(long)]
    diameter: Option<String>,
    /// Bits only
    #[arg(long)]
    stepover_ratio: Option<String>,
}

/// Numeric inputs of a setting, as typed.
#[derive(Args, Debug, Default)]
struct SettingValues {
    #[arg(long)]
    rpm: Option<String>,
    #[arg(long)]
    feed: Option<String>,
    #[arg(long)]
    doc: Option<String>,
    #[arg(long)]
    stepover: Option<String>,
    #[arg(long)]
    plunge: Option<String>,
    /// Free-text warning; an empty value clears it
    #[arg(long)]
    warning: Option<String>,
}

#[derive(Subcommand)]
enum SettingsAction {
    List,
    View {
        id: EntityId,
    },
    Create {
        #[arg(long)]
        spindle: Option<EntityId>,
        #[arg(long)]
        bit: Option<EntityId>,
        #[arg(long)]
        material: Option<EntityId>,
        #[command(flatten)]
        values: SettingValues,
    },
    Edit {
        id: EntityId,
        #[command(flatten)]
        values: SettingValues,
    },
    Delete {
        id: EntityId,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SpindleSettingsAction {
    List,
    View {
        id: EntityId,
    },
    /// Bulk import a CSV file
    Upload {
        file: PathBuf,
    },
    Edit {
        id: EntityId,
        #[command(flatten)]
        values: SettingValues,
    },
    Delete {
        id: EntityId,
        #[arg(long)]
        yes: bool,
    },
    /// Save the settings as `settings_<spindle>_<date>.csv`
    Export {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete the spindle and all of its settings
    DeleteSpindle {
        /// Exact spindle name
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
enum AdminsAction {
    List,
    View {
        id: EntityId,
    },
    /// Grant the admin role by email
    Grant {
        email: String,
    },
    /// Revoke the admin role
    Revoke {
        id: EntityId,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    List,
    View {
        id: EntityId,
    },
    /// Save all users as `users_<date>.csv`
    Export {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum PublicAction {
    /// Print the embed link of the FAQ video
    FaqVideo,
    Subscribe {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Report {
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    Share {
        #[arg(long)]
        machine: String,
        #[arg(long)]
        spindle: String,
        #[arg(long)]
        bit: String,
        #[arg(long)]
        material: String,
        /// Typed multiplier; anything that is not a number counts as 0
        #[arg(long, default_value = "1")]
        multiplier: String,
    },
    /// Forget the remembered machine/spindle/bit/material choice
    ResetPreference,
}

impl Cli {
    fn config(&self) -> AdminConfig {
        let mut config = AdminConfig::from_env();
        if let Some(url) = &self.admin_url {
            config = config.with_admin_base_url(url.clone());
        }
        if let Some(url) = &self.public_url {
            config = config.with_public_base_url(url.clone());
        }
        if let Some(token) = &self.token {
            config = config.with_token(token.clone());
        }
        config
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    debug!(
        "admin url: {:?}, public url: {:?}",
        config.admin_base_url, config.public_base_url
    );

    if let Err(message) = run(cli.command, &config).await {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &AdminConfig) -> commands::CliResult {
    let api = || HttpAdminApi::new(config).map_err(|e| e.to_string());
    match command {
        Commands::Machines { action } => commands::entity::<Machine>(api()?, action).await,
        Commands::Spindles { action } => commands::entity::<Spindle>(api()?, action).await,
        Commands::Materials { action } => commands::entity::<Material>(api()?, action).await,
        Commands::Bits { action } => commands::entity::<Bit>(api()?, action).await,
        Commands::Settings { action } => commands::settings(api()?, action).await,
        Commands::SpindleSettings { spindle, action } => {
            commands::spindle_settings(api()?, spindle, action).await
        }
        Commands::Admins { action } => commands::admins(config, action).await,
        Commands::Users { action } => commands::users(api()?, action).await,
        Commands::Public { action } => commands::public(config, action).await,
    }
}
