//! Purchase Verification Service - Main Application Entry Point
//!
//! A verification API that checks whether a user owns a resource purchased
//! on a third-party marketplace (Spigot, Polymart, BuiltByBit), with read
//! endpoints for resources and users. The same binary doubles as the admin
//! CLI for API keys and database lifecycle.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: API key with SHA-256 hashing
//! - **CLI**: clap subcommands sharing the service layer with the server
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow (serve)
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod cli;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::cli::{Cli, Command};
use crate::db::DbPool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Cli::parse();
    let command = args.command.unwrap_or(Command::Serve);

    // init-env runs before any configuration can exist
    if let Command::InitEnv {
        force,
        database_url,
    } = &command
    {
        cli::lifecycle::init_env(*force, database_url.as_deref())?;
        return Ok(());
    }

    // Load configuration
    let config = config::Config::from_env()?;
    if config.secret_key.is_none() {
        tracing::debug!("SECRET_KEY is not set; run 'init-env' to generate one");
    }

    // db-test reports connectivity as a structured result, not an error
    if matches!(command, Command::DbTest) {
        if !cli::lifecycle::db_test(&config.database_url).await {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;

    match command {
        Command::Serve => {
            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");
            run_server(&config, pool).await?;
        }
        Command::Create { name, length } => {
            db::run_migrations(&pool).await?;
            cli::keys::create(&pool, name, length).await?;
        }
        Command::InitKey => {
            db::run_migrations(&pool).await?;
            cli::keys::init_key(&pool).await?;
        }
        Command::List { json } => {
            db::run_migrations(&pool).await?;
            cli::keys::list(&pool, json).await?;
        }
        Command::Activate { id } => {
            db::run_migrations(&pool).await?;
            cli::keys::activate(&pool, id).await?;
        }
        Command::Deactivate { id } => {
            db::run_migrations(&pool).await?;
            cli::keys::deactivate(&pool, id).await?;
        }
        Command::Delete { id } => {
            db::run_migrations(&pool).await?;
            cli::keys::delete(&pool, id).await?;
        }
        Command::DbReset { yes_i_am_sure } => {
            cli::lifecycle::db_reset(&pool, yes_i_am_sure).await?;
        }
        Command::DbExport { output } => {
            db::run_migrations(&pool).await?;
            cli::lifecycle::db_export(&pool, &output).await?;
        }
        Command::DbImport { input, wipe } => {
            cli::lifecycle::db_import(&pool, &input, wipe).await?;
        }
        Command::ResourcesRefresh { file } => {
            db::run_migrations(&pool).await?;
            cli::lifecycle::resources_refresh(&pool, &file).await?;
        }
        // Handled above before the pool was created
        Command::InitEnv { .. } | Command::DbTest => unreachable!(),
    }

    Ok(())
}

/// Build the router and serve HTTP requests until shutdown.
async fn run_server(config: &config::Config, pool: DbPool) -> anyhow::Result<()> {
    // Create authenticated routes (API endpoints)
    let authenticated_routes = Router::new()
        // Ownership verification
        .route(
            "/verify",
            get(handlers::verify::verify_get).post(handlers::verify::verify_post),
        )
        // Resource browsing
        .route("/resources", get(handlers::resources::list_resources))
        .route("/resources/{slug}", get(handlers::resources::get_resource))
        // User browsing and identity management
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/{platform}/{external_user_id}",
            get(handlers::users::get_user).delete(handlers::users::delete_user),
        )
        .route(
            "/users/{platform}/{external_user_id}/discord",
            post(handlers::users::set_discord).delete(handlers::users::unset_discord),
        )
        .route(
            "/users/{platform}/discord/{discord_id}",
            get(handlers::users::get_user_by_discord),
        )
        // Purchase recording
        .route("/purchases", post(handlers::purchases::record_purchase))
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine authenticated routes with public routes
    let app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        // Merge authenticated routes
        .merge(authenticated_routes)
        // Add request tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share database pool with all handlers via State extraction
        .with_state(pool);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
