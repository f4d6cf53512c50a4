pub mod record;
pub mod stats;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};

use crate::services::{AppConfig, AuthMode, CatalogService, ConfigOverrides, HttpGateway, SessionStore};
use crate::types::{CatalogEntry, PrestaError};
use record::RecordArgs;
use stats::StatsArgs;

/// Record service transactions and review earnings
#[derive(Parser)]
#[command(name = "prestatrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script endpoint URL
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// How the token is sent on submission (body or bearer)
    #[arg(long, global = true, value_name = "MODE")]
    auth_mode: Option<AuthMode>,

    /// Config file (default ~/.prestatrack/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui,

    /// Store the session token
    Login {
        /// Token issued by the identity provider
        token: String,
    },

    /// Forget the session token
    Logout,

    /// Show session and endpoint status
    Status,

    /// List the prestation catalog
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Ignore the cached catalog
        #[arg(long)]
        refresh: bool,
    },

    /// Record a transaction
    Record(RecordArgs),

    /// Show statistics per prestation
    Stats(StatsArgs),
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.load_config().map_err(user_facing)?;

        if let None | Some(Commands::Tui) = self.command {
            return crate::tui::run(config);
        }
        crate::logging::init_stderr();

        let session = SessionStore::new().map_err(user_facing)?;
        match self.command {
            None | Some(Commands::Tui) => Ok(()),
            Some(Commands::Login { token }) => {
                session.set_token(&token).map_err(user_facing)?;
                println!("Session enregistrée.");
                Ok(())
            }
            Some(Commands::Logout) => {
                session.clear_token().map_err(user_facing)?;
                println!("Session supprimée.");
                Ok(())
            }
            Some(Commands::Status) => {
                println!("{}", format_status(&session, &config));
                Ok(())
            }
            Some(Commands::Catalog { json, refresh }) => {
                let gateway = HttpGateway::new(config).map_err(user_facing)?;
                let load = CatalogService::new()
                    .load(&gateway, refresh)
                    .map_err(user_facing)?;
                if let Some(warning) = &load.warning {
                    eprintln!("[prestatrack] {}", warning.message());
                }
                if json {
                    println!("{}", serde_json::to_string_pretty(&load.entries)?);
                } else {
                    println!("{}", format_catalog(&load.entries));
                }
                Ok(())
            }
            Some(Commands::Record(args)) => {
                let gateway = HttpGateway::new(config).map_err(user_facing)?;
                let token = session.get_token();
                let submission = args
                    .run(&gateway, &CatalogService::new(), token.as_deref())
                    .map_err(user_facing)?;
                println!("{}", record::format_receipt(&submission));
                Ok(())
            }
            Some(Commands::Stats(args)) => {
                let gateway = HttpGateway::new(config).map_err(user_facing)?;
                let token = session.get_token();
                let report = args
                    .run(&gateway, token.as_deref())
                    .map_err(user_facing)?;
                println!("{}", args.render(&report).map_err(user_facing)?);
                Ok(())
            }
        }
    }

    fn load_config(&self) -> crate::types::Result<AppConfig> {
        let overrides = ConfigOverrides {
            endpoint: self.endpoint.clone(),
            stats_endpoint: None,
            auth_mode: self.auth_mode,
        };
        match &self.config {
            Some(path) => AppConfig::load_from(path, &overrides),
            None => AppConfig::load(&overrides),
        }
    }
}

/// Convert to the message shown to the user; transport detail goes to the log
fn user_facing(err: PrestaError) -> anyhow::Error {
    if let PrestaError::Transport(detail) = &err {
        tracing::error!(%detail, "request failed");
    }
    anyhow!(err.user_message())
}

fn format_status(session: &SessionStore, config: &AppConfig) -> String {
    let session_line = match (session.get_token(), session.saved_at()) {
        (Some(_), Some(saved_at)) => format!(
            "Session : connecté (depuis le {})",
            saved_at.format("%d/%m/%Y %H:%M")
        ),
        (Some(_), None) => "Session : connecté".to_string(),
        (None, _) => "Session : déconnecté".to_string(),
    };
    let endpoint = config.endpoint().unwrap_or("(non configuré)");
    format!(
        "{}\nEndpoint : {}\nMode d'authentification : {}",
        session_line, endpoint, config.auth_mode
    )
}

fn format_catalog(entries: &[CatalogEntry]) -> String {
    if entries.is_empty() {
        return "Catalogue vide.".to_string();
    }
    let width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Prestation".len());

    let mut lines = vec![format!("{:<width$}  {:>12}  {:>12}", "Prestation", "Prix", "Coût")];
    for entry in entries {
        lines.push(format!(
            "{:<width$}  {:>12}  {:>12}",
            entry.name,
            entry.earning.to_string(),
            entry.cost.to_string()
        ));
    }
    lines.join("\n")
}
