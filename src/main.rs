use std::path::PathBuf;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use rateware::config::{CliOverrides, Config};
use rateware::db::Database;
use rateware::{api, oracle};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Review form that predicts sentiment and rating for submitted text
#[derive(Parser, Debug)]
#[command(name = "rateware")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./rateware.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    addr: Option<String>,

    /// SQLite database file
    #[arg(long)]
    database: Option<String>,

    /// Prediction artifact for the in-process oracle
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Model server endpoint; selects the http oracle
    #[arg(long)]
    oracle_url: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?
        .with_env_overrides()
        .with_cli_overrides(CliOverrides {
            addr: cli.addr,
            database: cli.database,
            artifact: cli.artifact,
            oracle_url: cli.oracle_url,
        });

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // The oracle must be ready before the first request
    let oracle = oracle::from_config(&config.oracle).context("failed to load prediction oracle")?;
    let oracle = web::Data::from(oracle);

    // Initialize the database
    let db = Database::new(&config.database.path)
        .with_context(|| format!("failed to open database {}", config.database.path))?;
    db.create_schema().await.context("failed to create schema")?;
    info!(
        "Schema ready, {} reviews on record",
        db.count_reviews().await?
    );
    let db = web::Data::new(db);

    let addr = config.server.addr.clone();
    let assets_dir = config.server.assets_dir.clone();
    let routes = api::configure(config.server.form_limit);
    info!("listening on http://{}", &addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(db.clone())
            .app_data(oracle.clone())
            // Serve the stylesheet from the assets directory
            .service(Files::new("/assets", assets_dir.clone()))
            .configure(routes.clone())
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
