use anyhow::Context;
use pricing_core::domain::contract::CatalogSeed;
use pricing_core::domain::price::{PriceRule, Product};
use pricing_core::pricing::memory::InMemoryPriceStore;
use pricing_core::time::reference::TimeReference;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub products: Vec<Product>,
    pub rules: Vec<PriceRule>,
}

impl LoadedCatalog {
    /// Rule count per product, including products that carry no prices.
    pub fn rules_per_product(&self) -> BTreeMap<i64, usize> {
        let mut out: BTreeMap<i64, usize> =
            self.products.iter().map(|p| (p.product_id, 0)).collect();
        for rule in &self.rules {
            *out.entry(rule.product.product_id).or_default() += 1;
        }
        out
    }

    pub fn into_memory_store(self) -> anyhow::Result<InMemoryPriceStore> {
        InMemoryPriceStore::from_rules(self.rules)
    }
}

pub fn load_catalog(path: &Path, time: &TimeReference) -> anyhow::Result<LoadedCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    parse_catalog(&raw, time).with_context(|| format!("invalid catalog {}", path.display()))
}

pub fn parse_catalog(raw: &str, time: &TimeReference) -> anyhow::Result<LoadedCatalog> {
    let seed: CatalogSeed =
        serde_json::from_str(raw).context("catalog is not valid JSON for the catalog schema")?;
    let (products, rules) = seed.validate_and_into_rules(time)?;
    anyhow::ensure!(!products.is_empty(), "catalog must contain at least one product");
    Ok(LoadedCatalog { products, rules })
}
