//! PDF Master API Server
//!
//! Stateless HTTP backend for the PDF Master clients. Each route accepts a
//! multipart upload, runs one transform from `pdfmaster-core` and answers
//! with the URL of the produced file:
//!
//! - `POST /api/pdf/merge`, `/split`, `/rotate`, `/compress`,
//!   `/images-to-pdf`, `/protect`
//! - `GET /health`
//! - `/output/*` and `/uploads/*` served from disk

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod handlers;
mod state;
mod storage;
mod upload;

use config::Args;
use state::AppState;

/// Build the full router over `state`
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pdf_routes = Router::new()
        .route("/merge", post(handlers::merge))
        .route("/split", post(handlers::split))
        .route("/rotate", post(handlers::rotate))
        .route("/compress", post(handlers::compress))
        .route("/images-to-pdf", post(handlers::images))
        .route("/protect", post(handlers::protect));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/pdf", pdf_routes)
        .nest_service("/output", ServeDir::new(state.output_dir()))
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so env fallbacks see it
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdfmaster_api={},tower_http=debug", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::new(
        &args.upload_dir,
        &args.output_dir,
        args.max_file_size(),
        args.owner_password_policy,
    )
    .await?;
    let app = build_router(Arc::new(state));

    let addr = args.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("PDF Master API listening on http://{}", addr);
    info!("Upload limit: {} MiB per file", args.max_file_size_mb);
    info!("Owner password policy: {}", args.owner_password_policy);

    axum::serve(listener, app).await?;

    Ok(())
}
