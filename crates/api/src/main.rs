use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricing_core::config::NotFoundPolicy;
use pricing_core::domain::contract::{PriceRequest, PriceResponse};
use pricing_core::pricing::Resolver;
use pricing_core::storage::prices::PgPriceStore;
use pricing_core::time::reference::TimeReference;

const HEALTHCHECK_MESSAGE: &str = "Service is running";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = pricing_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let time = settings.time_reference()?;
    let not_found = settings.not_found_policy()?;

    let resolver: Option<Resolver> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match pricing_core::storage::migrate(&pool).await {
                Ok(()) => Some(Resolver::new(Arc::new(PgPriceStore::new(pool)))),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        resolver,
        time,
        not_found,
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, time_offset_secs = time.offset_seconds(), ?not_found, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/product/healthcheck", get(healthcheck))
        .route("/product/price", post(get_product_price))
        .with_state(state)
}

async fn healthcheck() -> &'static str {
    HEALTHCHECK_MESSAGE
}

#[derive(Clone)]
struct AppState {
    resolver: Option<Resolver>,
    time: TimeReference,
    not_found: NotFoundPolicy,
}

async fn get_product_price(
    State(state): State<AppState>,
    Json(request): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, StatusCode> {
    let Some(resolver) = &state.resolver else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let query = request.into_query(&state.time).map_err(|e| {
        tracing::debug!(error = %e, "rejected price request");
        StatusCode::BAD_REQUEST
    })?;

    let resolution = resolver.resolve(&query).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "price resolution failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if !resolution.is_found() && state.not_found == NotFoundPolicy::NotFound {
        return Err(StatusCode::NOT_FOUND);
    }

    let resolved = resolution.unwrap_or_empty();
    Ok(Json(PriceResponse::from_resolved(&resolved, &state.time)))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &pricing_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
