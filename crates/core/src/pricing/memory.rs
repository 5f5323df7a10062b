use crate::domain::price::PriceRule;
use crate::pricing::selection::applicable_prices;
use crate::pricing::PriceStore;
use chrono::{DateTime, Utc};

/// Price store over a validated in-process rule set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceStore {
    rules: Vec<PriceRule>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = PriceRule>) -> anyhow::Result<Self> {
        let mut store = Self::new();
        for rule in rules {
            store.insert(rule)?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, rule: PriceRule) -> anyhow::Result<()> {
        rule.validate()?;
        anyhow::ensure!(
            self.rules.iter().all(|r| r.price_id != rule.price_id),
            "duplicate priceId: {}",
            rule.price_id
        );
        if let Some(known) = self
            .rules
            .iter()
            .find(|r| r.product.product_id == rule.product.product_id)
        {
            anyhow::ensure!(
                known.product.brand_id == rule.product.brand_id,
                "product {} belongs to brand {}, not {}",
                rule.product.product_id,
                known.product.brand_id,
                rule.product.brand_id
            );
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Drops a product together with every price it owns.
    pub fn remove_product(&mut self, product_id: i64) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| r.product.product_id != product_id);
        before - self.rules.len()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[async_trait::async_trait]
impl PriceStore for InMemoryPriceStore {
    async fn find_applicable_prices(
        &self,
        product_id: i64,
        brand_id: i32,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PriceRule>> {
        Ok(applicable_prices(&self.rules, product_id, brand_id, at)
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::Product;
    use chrono::TimeZone;

    fn rule(price_id: i64, brand_id: i32) -> PriceRule {
        PriceRule {
            price_id,
            product: Product {
                product_id: 35455,
                brand_id,
            },
            price: 35.5,
            priority: 0,
            start_date: Utc.with_ymd_and_hms(2020, 6, 14, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2020, 12, 31, 23, 59, 59).unwrap(),
            currency: "EUR".to_string(),
        }
    }

    #[test]
    fn rejects_second_brand_for_known_product() {
        let err = InMemoryPriceStore::from_rules([rule(1, 1), rule(2, 2)]).unwrap_err();
        assert!(err.to_string().contains("belongs to brand 1"));
    }

    #[test]
    fn accepts_more_rules_for_same_brand() {
        let store = InMemoryPriceStore::from_rules([rule(1, 1), rule(2, 1)]).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn rejects_duplicate_price_id() {
        assert!(InMemoryPriceStore::from_rules([rule(1, 1), rule(1, 1)]).is_err());
    }
}
