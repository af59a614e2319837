use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use common::wait::wait_until_ready;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::database;
use server::repository::account::AccountStore;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Block until the configured database accepts queries.
    WaitForDb {
        /// Number of connection attempts, one second apart.
        #[arg(long, default_value_t = 7)]
        retry: u32,
    },
    /// Create an account with staff and superuser rights.
    CreateSuperuser {
        #[arg(long, env = "RECIPE_SUPERUSER_EMAIL")]
        email: String,
        #[arg(long, env = "RECIPE_SUPERUSER_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let result = match args.command {
        Command::WaitForDb { retry } => wait_for_db(retry).await,
        Command::CreateSuperuser { email, password } => create_superuser(&email, &password).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn wait_for_db(retry: u32) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let outcome = wait_until_ready(retry, Duration::from_secs(1), || async {
        let db = database::connect(&config.database).await?;
        let pinged = database::ping(&db).await;
        let _ = db.close().await;
        pinged
    })
    .await;

    match outcome {
        Ok(attempts) => {
            info!(attempts, "Database is available.");
            println!("Database is available.");
            Ok(())
        }
        Err(e) => {
            println!("Cannot connect to the database.");
            Err(e.into())
        }
    }
}

async fn create_superuser(email: &str, password: &str) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;

    let account = AccountStore::new(&db)
        .create_privileged(email, password)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create superuser: {e:?}"))?;

    info!(user_id = account.id, email = %account.email, "Superuser created");
    println!("Superuser {} created.", account.email);
    Ok(())
}
