//! onboard: membership onboarding service
//!
//! Serves the onboarding form steps, and offers a few member management
//! commands for operators.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use onboard::auth::SessionKeys;
use onboard::member::{DiscordProfile, EthicsForm, MemberRecord, MemberStore};
use onboard::{server, Config};

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Membership onboarding service with schema-driven forms")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "onboard.toml")]
    config: String,

    /// HTTP listen address (overrides config file)
    #[arg(long, env = "ONBOARD_LISTEN")]
    listen: Option<String>,

    /// Forms directory (overrides config file)
    #[arg(long, env = "ONBOARD_FORMS_DIR")]
    forms_dir: Option<String>,

    /// SQLite database path (overrides config file)
    #[arg(long, env = "ONBOARD_DB")]
    db: Option<String>,

    /// Session signing secret (overrides config file)
    #[arg(long, env = "ONBOARD_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Manage member records
    #[command(subcommand)]
    Member(MemberCommands),
}

#[derive(Subcommand)]
enum MemberCommands {
    /// Create a member as a first Discord login would
    Create {
        #[arg(long)]
        discord_id: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        email: Option<String>,

        /// Grant access to the admin API
        #[arg(long)]
        sudo: bool,
    },

    /// Issue a fresh session token for an existing member
    Token {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("onboard=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if let Some(forms_dir) = cli.forms_dir {
        config.forms.dir = PathBuf::from(forms_dir);
    }
    if let Some(db) = cli.db {
        config.store.path = PathBuf::from(db);
    }
    if let Some(jwt_secret) = cli.jwt_secret {
        config.auth.jwt_secret = jwt_secret;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!("Starting onboard");
            info!("Forms dir: {}", config.forms.dir.display());
            info!("Database: {}", config.store.path.display());
            server::run(config).await?;
        }
        Commands::Member(command) => member_command(&config, command)?,
    }

    Ok(())
}

fn member_command(config: &Config, command: MemberCommands) -> anyhow::Result<()> {
    let store = MemberStore::open(&config.store.path)?;
    let sessions = SessionKeys::new(&config.auth.jwt_secret, config.auth.lifetime_secs)?;

    let member = match command {
        MemberCommands::Create {
            discord_id,
            username,
            email,
            sudo,
        } => {
            let mut member = MemberRecord::new(discord_id);
            member.email = email.clone().unwrap_or_default();
            member.sudo = sudo;
            member.discord = Some(DiscordProfile {
                email,
                username,
                ..Default::default()
            });
            member.ethics_form = Some(EthicsForm::default());

            store.insert(&member)?;
            info!(id = %member.id, sudo, "Created member");
            member
        }
        MemberCommands::Token { id } => store
            .get(id)?
            .ok_or_else(|| anyhow::anyhow!("no member with id {}", id))?,
    };

    println!("id:    {}", member.id);
    println!("token: {}", sessions.issue(&member)?);
    Ok(())
}
