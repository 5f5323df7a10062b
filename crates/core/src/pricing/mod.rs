use crate::domain::price::{PriceQuery, PriceRule, Resolution, ResolvedPrice};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod memory;
pub mod selection;

/// Source of price rules. Implementations return every rule of the product/brand
/// whose inclusive window contains `at`, in no particular order. An unknown product
/// yields an empty list, not an error.
#[async_trait::async_trait]
pub trait PriceStore: Send + Sync {
    async fn find_applicable_prices(
        &self,
        product_id: i64,
        brand_id: i32,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PriceRule>>;
}

/// Picks the governing price for a query. Holds no per-request state.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn PriceStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, query: &PriceQuery) -> anyhow::Result<Resolution> {
        let candidates = self
            .store
            .find_applicable_prices(query.product_id, query.brand_id, query.application_date)
            .await?;

        tracing::debug!(
            product_id = query.product_id,
            brand_id = query.brand_id,
            at = %query.application_date,
            candidates = candidates.len(),
            "price candidates loaded"
        );

        let Some(rule) = selection::select_rule(&candidates) else {
            return Ok(Resolution::NotFound);
        };

        tracing::debug!(
            price_id = rule.price_id,
            priority = rule.priority,
            "price rule selected"
        );

        Ok(Resolution::Found(ResolvedPrice::from_rule(rule)))
    }
}
