use crate::domain::price::{PriceRule, Product};
use anyhow::Context;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub products: u64,
    pub prices: u64,
    pub pruned_prices: u64,
}

/// Writes the catalog in one transaction. Prices of the listed products that are missing
/// from `rules` are removed, so importing the same file twice leaves the same rows.
pub async fn upsert_catalog(
    pool: &sqlx::PgPool,
    products: &[Product],
    rules: &[PriceRule],
) -> anyhow::Result<ImportSummary> {
    anyhow::ensure!(!products.is_empty(), "catalog must contain at least one product");

    let chunk_size: usize = std::env::var("CATALOG_UPSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(200);
    anyhow::ensure!(chunk_size >= 1, "CATALOG_UPSERT_BATCH must be >= 1");

    let mut tx = pool.begin().await.context("begin transaction failed")?;
    let mut summary = ImportSummary::default();

    for chunk in products.chunks(chunk_size) {
        let mut qb = sqlx::QueryBuilder::new("INSERT INTO products (product_id, brand_id) ");
        qb.push_values(chunk, |mut b, p| {
            b.push_bind(p.product_id).push_bind(p.brand_id);
        });
        qb.push(" ON CONFLICT (product_id) DO UPDATE SET brand_id = EXCLUDED.brand_id");

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch upsert products failed")?;
        summary.products += res.rows_affected();
    }

    let product_ids: Vec<i64> = products.iter().map(|p| p.product_id).collect();
    let price_ids: Vec<i64> = rules.iter().map(|r| r.price_id).collect();
    let pruned = sqlx::query(
        "DELETE FROM prices WHERE product_id = ANY($1) AND NOT (price_id = ANY($2))",
    )
    .persistent(false)
    .bind(&product_ids[..])
    .bind(&price_ids[..])
    .execute(&mut *tx)
    .await
    .context("prune stale prices failed")?;
    summary.pruned_prices = pruned.rows_affected();

    for (batch_idx, chunk) in rules.chunks(chunk_size).enumerate() {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO prices (price_id, product_id, price, priority, start_date, end_date, currency) ",
        );
        qb.push_values(chunk, |mut b, r| {
            b.push_bind(r.price_id)
                .push_bind(r.product.product_id)
                .push_bind(r.price)
                .push_bind(r.priority)
                .push_bind(r.start_date)
                .push_bind(r.end_date)
                .push_bind(r.currency.as_str());
        });
        qb.push(
            " ON CONFLICT (price_id) DO UPDATE \
               SET product_id = EXCLUDED.product_id, price = EXCLUDED.price, \
                   priority = EXCLUDED.priority, start_date = EXCLUDED.start_date, \
                   end_date = EXCLUDED.end_date, currency = EXCLUDED.currency",
        );

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch upsert prices failed")?;
        summary.prices += res.rows_affected();

        tracing::debug!(
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "prices batch upsert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(summary)
}
