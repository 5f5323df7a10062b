use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;

#[derive(Debug, Parser)]
#[command(name = "pricing_worker")]
struct Args {
    /// Catalog JSON file with products and their price rules.
    #[arg(long, default_value = "catalog/sample.json")]
    catalog: PathBuf,

    /// Validate and load the catalog in memory without touching the database.
    #[arg(long)]
    dry_run: bool,
}

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

    let args = Args::parse();
    let time = settings.time_reference()?;

    let loaded = match catalog::load_catalog(&args.catalog, &time) {
        Ok(loaded) => loaded,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(catalog = %args.catalog.display(), error = %format!("{err:#}"), "catalog rejected");
            return Err(err);
        }
    };

    for (product_id, rules) in loaded.rules_per_product() {
        tracing::debug!(product_id, rules, "catalog product");
    }

    if args.dry_run {
        let products = loaded.products.len();
        let store = loaded.into_memory_store()?;
        tracing::info!(
            catalog = %args.catalog.display(),
            dry_run = true,
            products,
            prices = store.len(),
            "catalog validated"
        );
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    pricing_core::storage::migrate(&pool).await?;

    let mut lock_conn = pool.acquire().await.context("acquire lock connection failed")?;
    let acquired = pricing_core::storage::lock::try_acquire_catalog_lock(&mut *lock_conn).await?;
    if !acquired {
        tracing::warn!("catalog lock not acquired; another import in progress");
        return Ok(());
    }

    let result =
        pricing_core::storage::catalog::upsert_catalog(&pool, &loaded.products, &loaded.rules)
            .await;

    let _ = pricing_core::storage::lock::release_catalog_lock(&mut *lock_conn).await;

    match result {
        Ok(summary) => {
            tracing::info!(
                catalog = %args.catalog.display(),
                products = summary.products,
                prices = summary.prices,
                pruned_prices = summary.pruned_prices,
                "catalog imported"
            );
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "catalog import failed");
            Err(err)
        }
    }
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
