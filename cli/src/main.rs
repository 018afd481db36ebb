use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod utils;

use commands::{check, config, policies, roles, tree};
use utils::loader;

/// rbacctl - Inspect and exercise RBAC authorization policies
#[derive(Parser)]
#[command(name = "rbacctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "RBAC_CONFIG")]
    config: Option<PathBuf>,

    /// Seed file with roles, permissions and bindings; overrides the configuration
    #[arg(short, long, global = true, env = "RBAC_SEED_FILE")]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a subject may perform an action on a resource path
    Check {
        /// User id or role code
        subject: String,

        /// Request path, e.g. /api/users/42
        path: String,

        /// HTTP action (GET, POST, PATCH, DELETE)
        action: String,

        /// Roles to sync for the subject first, as a login would (comma separated)
        #[arg(long, value_delimiter = ',')]
        login: Option<Vec<String>>,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check a declared permission code such as user:create
    Authorize {
        /// User id
        user: String,

        /// Permission code in resource:verb form
        permission: String,

        /// Roles to sync for the user first, as a login would (comma separated)
        #[arg(long, value_delimiter = ',')]
        login: Option<Vec<String>>,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List policies, role bindings and role inheritance
    Policies {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the direct and effective roles of a user
    Roles {
        /// User id
        user: String,

        /// Roles to sync for the user first, as a login would (comma separated)
        #[arg(long, value_delimiter = ',')]
        login: Option<Vec<String>>,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the permission forest
    Tree {
        /// Only menu entries
        #[arg(long)]
        menu: bool,

        /// Include inactive menu entries
        #[arg(long, requires = "menu")]
        all: bool,

        /// Only the menus visible to this user
        #[arg(long, conflicts_with_all = ["menu", "all"])]
        user: Option<String>,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read a single configuration value
    Get {
        /// Dotted key path (e.g., "logging.level")
        key: String,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env must be loaded before clap reads RBAC_* variables
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let app_config = loader::load_config(cli.config.as_deref(), cli.seed.as_deref())?;

    let mut logging = app_config.logging.clone();
    logging.level = if cli.verbose { "debug" } else { "warn" }.to_string();
    let _guard = rbac_app::logging::init_logging(&logging)?;

    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Show { format } => config::show(&app_config, format)?,
            ConfigAction::Get { key, format } => config::get(&app_config, key, format)?,
        }
        return Ok(ExitCode::SUCCESS);
    }

    let app = rbac_app::App::from_config(app_config).await?;

    let allowed = match cli.command {
        Commands::Check {
            subject,
            path,
            action,
            login,
            format,
        } => {
            loader::apply_login(&app, &subject, login).await?;
            check::resource(&app, &subject, &path, &action, &format).await?
        }
        Commands::Authorize {
            user,
            permission,
            login,
            format,
        } => {
            loader::apply_login(&app, &user, login).await?;
            check::permission(&app, &user, &permission, &format).await?
        }
        Commands::Policies { format } => {
            policies::execute(&app, &format).await?;
            true
        }
        Commands::Roles {
            user,
            login,
            format,
        } => {
            loader::apply_login(&app, &user, login).await?;
            roles::execute(&app, &user, &format).await?;
            true
        }
        Commands::Tree {
            menu,
            all,
            user,
            format,
        } => {
            let view = match user {
                Some(user) => tree::View::User(user),
                None if menu => tree::View::Menu { active_only: !all },
                None => tree::View::Full,
            };
            tree::execute(&app, view, &format).await?;
            true
        }
        Commands::Config { .. } => true,
    };

    // Denied checks exit non-zero
    Ok(if allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
