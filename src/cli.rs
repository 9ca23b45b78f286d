// cli.rs
// Console commands for catalogue maintenance

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use catalog_api::common::{migrations, safe_email_log, AppConfig};
use catalog_api::products::{ProductsService, PublishError};
use catalog_api::users::{UserError, UsersService};

#[derive(Debug, Parser)]
#[command(name = "catalog", about = "Product catalogue maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mark a product as published
    #[command(name = "product:publish")]
    ProductPublish {
        /// Product id
        id: i64,
    },
    /// Grant the admin role to a registered account
    #[command(name = "user:promote")]
    UserPromote {
        /// Account email
        email: String,
    },
}

async fn connect() -> anyhow::Result<SqlitePool> {
    let config = AppConfig::from_env();
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    migrations::run_migrations(&pool).await?;
    Ok(pool)
}

async fn publish(id: i64) -> anyhow::Result<Result<(), PublishError>> {
    let pool = connect().await?;
    Ok(ProductsService::new(pool).publish(id).await.map(|_| ()))
}

async fn promote(email: &str) -> anyhow::Result<Result<(), UserError>> {
    let pool = connect().await?;
    Ok(UsersService::new(pool).promote_by_email(email).await.map(|_| ()))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::ProductPublish { id } => match publish(id).await {
            Ok(Ok(())) => {
                println!("Product published successfully");
                ExitCode::SUCCESS
            }
            Ok(Err(PublishError::NotFound)) => {
                eprintln!("Product not found");
                ExitCode::FAILURE
            }
            Ok(Err(PublishError::AlreadyPublished)) => {
                eprintln!("Product already published");
                ExitCode::FAILURE
            }
            Ok(Err(PublishError::Database(e))) => {
                eprintln!("❌ Database error: {}", e);
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                ExitCode::FAILURE
            }
        },
        Command::UserPromote { email } => match promote(&email).await {
            Ok(Ok(())) => {
                println!("{} is now an admin", safe_email_log(&email));
                ExitCode::SUCCESS
            }
            Ok(Err(UserError::NotFound)) => {
                eprintln!("User not found");
                ExitCode::FAILURE
            }
            Ok(Err(UserError::Database(e))) => {
                eprintln!("❌ Database error: {}", e);
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
