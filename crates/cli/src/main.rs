//! Moonstone CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ms-cli migrate
//!
//! # Load the crystal catalog
//! ms-cli seed crystals
//!
//! # Create (or promote) an admin user
//! ms-cli admin create -e admin@example.com -n "Admin Name" -p 'long passphrase'
//!
//! # Write a blog post from the next unused topic, or topic 3
//! ms-cli blog generate
//! ms-cli blog generate --topic 3 --publish
//! ```
//!
//! All commands read `DATABASE_URL` (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ms-cli")]
#[command(author, version, about = "Moonstone CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Blog content
    Blog {
        #[command(subcommand)]
        action: BlogAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert the crystal catalog fixtures
    Crystals,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin user, or promote an existing account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum BlogAction {
    /// Generate a post with the template generator
    Generate {
        /// Topic number (1-based); the next unused topic when omitted
        #[arg(short, long)]
        topic: Option<usize>,

        /// Publish immediately instead of saving a draft
        #[arg(long)]
        publish: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Crystals => {
                commands::seed::crystals().await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
        },
        Commands::Blog { action } => match action {
            BlogAction::Generate { topic, publish } => {
                commands::blog::generate(topic, publish).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_blog_generate() {
        let cli = Cli::try_parse_from(["ms-cli", "blog", "generate", "--topic", "3", "--publish"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Blog {
                action: BlogAction::Generate {
                    topic: Some(3),
                    publish: true
                }
            }
        ));
    }

    #[test]
    fn test_admin_create_requires_password() {
        assert!(Cli::try_parse_from(["ms-cli", "admin", "create", "-e", "a@b.co", "-n", "A"]).is_err());
    }
}
