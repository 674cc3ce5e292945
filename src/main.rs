use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tokio::net::TcpListener;

use index_tracker::app;
use index_tracker::config::{AppConfig, AuthConfig};
use index_tracker::db;
use index_tracker::external::price_provider::PriceProvider;
use index_tracker::external::yahoo::YahooProvider;
use index_tracker::logging::{init_logging, LoggingConfig};
use index_tracker::services::auth_service::{self, Authenticator};
use index_tracker::services::investment_service::{self, CreateOutcome};
use index_tracker::services::price_service::{IndexPriceSource, RetryingIndexPriceSource};
use index_tracker::state::AppState;

#[derive(Parser)]
#[command(name = "index-tracker", version, about = "Index-pegged investment tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web page (default)
    Serve,
    /// Store the initial investment amounts, buying shares at today's index price
    Seed {
        /// One to four amounts in local currency
        #[arg(required = true, num_args = 1..=4)]
        amounts: Vec<f64>,
    },
    /// Print an Argon2 hash for LOGIN_PASSWORD_HASH
    HashPassword {
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Seed { amounts } => seed(&amounts).await,
        Command::HashPassword { password } => {
            println!("{}", auth_service::hash_password(&password)?);
            Ok(())
        }
    }
}

fn build_price_source(config: &AppConfig) -> anyhow::Result<Arc<dyn IndexPriceSource>> {
    let provider: Arc<dyn PriceProvider> = Arc::new(YahooProvider::new(&config.price.base_url));
    tracing::info!("📊 Using Yahoo Finance for {} at {}", config.price.symbol, config.price.base_url);
    Ok(Arc::new(RetryingIndexPriceSource::new(provider, &config.price)?))
}

async fn open_store(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))
}

async fn seed_amounts(
    pool: &SqlitePool,
    price_source: &dyn IndexPriceSource,
    amounts: &[f64],
) -> anyhow::Result<()> {
    let slots = investment_service::amounts_from_slice(amounts)?;
    match investment_service::create_record(pool, price_source, slots).await? {
        CreateOutcome::Created { id, price } => {
            tracing::info!("Seeded investment record {} at index price {:.2}", id, price);
        }
        CreateOutcome::AlreadyExists => {
            tracing::info!("Investment record already exists, seed amounts ignored");
        }
    }
    Ok(())
}

async fn seed(amounts: &[f64]) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let pool = open_store(&config).await?;
    let price_source = build_price_source(&config)?;
    seed_amounts(&pool, price_source.as_ref(), amounts).await
}

async fn serve() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let auth = Authenticator::new(&AuthConfig::from_env()?)?;

    let pool = open_store(&config).await?;
    let price_source = build_price_source(&config)?;

    if let Some(amounts) = &config.seed_amounts {
        seed_amounts(&pool, price_source.as_ref(), amounts).await?;
    }
    if investment_service::record_count(&pool).await? == 0 {
        tracing::warn!("No investment record yet; run `index-tracker seed <amounts>` or set SEED_AMOUNTS");
    }

    let state = AppState {
        pool,
        price_source,
        auth: Arc::new(auth),
        currency_symbol: config.currency_symbol.clone(),
    };
    let app = app::create_app(state);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 index-tracker running at http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
