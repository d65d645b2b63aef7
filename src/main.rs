mod auth;
mod config;
mod db;
mod error;
mod extract;
mod models;
mod routes;
mod rules;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{http::HeaderValue, Router};
use config::Config;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
}

/// Build the full router with CORS and request tracing
pub fn app(state: Arc<AppState>) -> Result<Router> {
    let origin = state
        .config
        .server
        .frontend_url
        .parse::<HeaderValue>()
        .context("FRONTEND_URL is not a valid origin")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(routes::create_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neblir_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // `issue-token <user-id> <email> [name]` prints a signed token for local testing
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("issue-token") {
        return issue_token(&config, &args[1..]);
    }

    tracing::info!("Starting Neblir backend server...");

    // Connect to database
    let db = db::create_pool(config.database_url(), config.database.max_connections).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations completed");

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
    });
    let app = app(state)?;

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!(
        "Catalogue admins: {}",
        config.security.admin_emails.join(", ")
    );

    axum::serve(listener, app).await?;

    Ok(())
}

fn issue_token(config: &Config, args: &[String]) -> Result<()> {
    let (user_id, email) = match args {
        [user_id, email, ..] => (user_id, email),
        _ => anyhow::bail!("usage: neblir-backend issue-token <user-id> <email> [name]"),
    };
    let user_id = user_id.parse::<Uuid>().context("user id must be a UUID")?;
    let token = auth::generate_token(
        user_id,
        email,
        args.get(2).map(String::as_str),
        &config.security.jwt_secret,
    )?;
    println!("{}", token);
    Ok(())
}
