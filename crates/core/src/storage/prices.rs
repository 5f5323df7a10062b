use crate::domain::price::{PriceRule, Product};
use crate::pricing::PriceStore;
use anyhow::Context;
use chrono::{DateTime, Utc};

type PriceRow = (i64, i64, i32, f64, i32, DateTime<Utc>, DateTime<Utc>, String);

/// Postgres-backed price store. `PgPool` is reference counted, so clones share connections.
#[derive(Debug, Clone)]
pub struct PgPriceStore {
    pool: sqlx::PgPool,
}

impl PgPriceStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PriceStore for PgPriceStore {
    async fn find_applicable_prices(
        &self,
        product_id: i64,
        brand_id: i32,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PriceRule>> {
        let rows = sqlx::query_as::<_, PriceRow>(
            "SELECT pr.price_id, p.product_id, p.brand_id, pr.price, pr.priority, \
                    pr.start_date, pr.end_date, pr.currency \
             FROM products p \
             JOIN prices pr ON pr.product_id = p.product_id \
             WHERE p.product_id = $1 AND p.brand_id = $2 \
               AND $3 BETWEEN pr.start_date AND pr.end_date",
        )
        .bind(product_id)
        .bind(brand_id)
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .with_context(|| {
            format!("select prices failed (product_id={product_id}, brand_id={brand_id})")
        })?;

        Ok(rows.into_iter().map(into_rule).collect())
    }
}

fn into_rule(row: PriceRow) -> PriceRule {
    let (price_id, product_id, brand_id, price, priority, start_date, end_date, currency) = row;
    PriceRule {
        price_id,
        product: Product {
            product_id,
            brand_id,
        },
        price,
        priority,
        start_date,
        end_date,
        currency: currency.trim().to_string(),
    }
}
