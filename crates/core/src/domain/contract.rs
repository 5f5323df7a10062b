use crate::domain::price::{PriceQuery, PriceRule, Product, ResolvedPrice};
use crate::time::reference::TimeReference;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub product_id: i64,
    pub brand_id: i32,
    pub application_date: ApplicationDate,
}

/// Clients send either an ISO-8601 string or epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplicationDate {
    EpochMillis(i64),
    Text(String),
}

impl PriceRequest {
    pub fn into_query(self, time: &TimeReference) -> anyhow::Result<PriceQuery> {
        let application_date = match &self.application_date {
            ApplicationDate::EpochMillis(ms) => time.epoch_millis(*ms)?,
            ApplicationDate::Text(s) => time
                .parse_timestamp(s)
                .context("applicationDate is not a valid timestamp")?,
        };

        Ok(PriceQuery {
            product_id: self.product_id,
            brand_id: self.brand_id,
            application_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub product_id: i64,
    pub brand_id: i32,
    pub price_list: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub price: f64,
}

impl PriceResponse {
    pub fn from_resolved(resolved: &ResolvedPrice, time: &TimeReference) -> Self {
        Self {
            product_id: resolved.product_id,
            brand_id: resolved.brand_id,
            price_list: resolved.price_list,
            start_date: resolved.start_date.map(|d| time.format_local(d)),
            end_date: resolved.end_date.map(|d| time.format_local(d)),
            price: resolved.price,
        }
    }
}

/// Catalog document loaded by the importer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    pub products: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub product_id: i64,
    pub brand_id: i32,
    #[serde(default)]
    pub prices: Vec<CatalogPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPrice {
    pub price_id: i64,
    pub price: f64,
    pub priority: i32,
    pub start_date: String,
    pub end_date: String,
    pub currency: String,
}

impl CatalogSeed {
    pub fn validate_and_into_rules(
        self,
        time: &TimeReference,
    ) -> anyhow::Result<(Vec<Product>, Vec<PriceRule>)> {
        let mut seen_products = BTreeSet::<i64>::new();
        let mut seen_prices = BTreeSet::<i64>::new();
        let mut products = Vec::with_capacity(self.products.len());
        let mut rules = Vec::new();

        for item in self.products {
            ensure!(
                seen_products.insert(item.product_id),
                "duplicate productId: {}",
                item.product_id
            );
            let product = Product {
                product_id: item.product_id,
                brand_id: item.brand_id,
            };
            products.push(product);

            for price in item.prices {
                ensure!(
                    seen_prices.insert(price.price_id),
                    "duplicate priceId: {}",
                    price.price_id
                );
                let rule = price.validate_and_into_rule(product, time)?;
                rules.push(rule);
            }
        }

        Ok((products, rules))
    }
}

impl CatalogPrice {
    fn validate_and_into_rule(
        self,
        product: Product,
        time: &TimeReference,
    ) -> anyhow::Result<PriceRule> {
        let start_date = time
            .parse_timestamp(&self.start_date)
            .with_context(|| format!("priceId {} has an invalid startDate", self.price_id))?;
        let end_date = time
            .parse_timestamp(&self.end_date)
            .with_context(|| format!("priceId {} has an invalid endDate", self.price_id))?;

        let rule = PriceRule {
            price_id: self.price_id,
            product,
            price: self.price,
            priority: self.priority,
            start_date,
            end_date,
            currency: self.currency.trim().to_string(),
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn request_accepts_iso_string() {
        let req: PriceRequest = serde_json::from_value(json!({
            "productId": 35455,
            "brandId": 1,
            "applicationDate": "2020-06-14T10:00:00",
        }))
        .unwrap();

        let q = req.into_query(&TimeReference::utc()).unwrap();
        assert_eq!(q.product_id, 35455);
        assert_eq!(q.brand_id, 1);
        assert_eq!(
            q.application_date,
            Utc.with_ymd_and_hms(2020, 6, 14, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn request_accepts_epoch_millis() {
        let req: PriceRequest = serde_json::from_value(json!({
            "productId": 35455,
            "brandId": 1,
            "applicationDate": 1_592_128_800_000_i64,
        }))
        .unwrap();

        let q = req.into_query(&TimeReference::utc()).unwrap();
        assert_eq!(
            q.application_date,
            Utc.with_ymd_and_hms(2020, 6, 14, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn request_missing_fields_fails_to_deserialize() {
        let res = serde_json::from_value::<PriceRequest>(json!({
            "productId": 35455,
            "applicationDate": "2020-06-14T10:00:00",
        }));
        assert!(res.is_err());
    }

    #[test]
    fn request_with_garbage_date_fails_validation() {
        let req: PriceRequest = serde_json::from_value(json!({
            "productId": 35455,
            "brandId": 1,
            "applicationDate": "yesterday",
        }))
        .unwrap();
        assert!(req.into_query(&TimeReference::utc()).is_err());
    }

    #[test]
    fn response_uses_wire_names_and_null_dates() {
        let body = serde_json::to_value(PriceResponse::from_resolved(
            &ResolvedPrice::empty(),
            &TimeReference::utc(),
        ))
        .unwrap();

        assert_eq!(
            body,
            json!({
                "productId": 0,
                "brandId": 0,
                "priceList": 0,
                "startDate": null,
                "endDate": null,
                "price": 0.0,
            })
        );
    }

    fn seed(prices: serde_json::Value) -> CatalogSeed {
        serde_json::from_value(json!({
            "products": [{ "productId": 35455, "brandId": 1, "prices": prices }]
        }))
        .unwrap()
    }

    #[test]
    fn catalog_converts_local_times_with_reference() {
        let cet: TimeReference = "+01:00".parse().unwrap();
        let (products, rules) = seed(json!([{
            "priceId": 1,
            "price": 35.50,
            "priority": 0,
            "startDate": "2020-06-14T00:00:00",
            "endDate": "2020-12-31T23:59:59",
            "currency": "EUR",
        }]))
        .validate_and_into_rules(&cet)
        .unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].product, products[0]);
        assert_eq!(
            rules[0].start_date,
            Utc.with_ymd_and_hms(2020, 6, 13, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn catalog_rejects_inverted_window() {
        let err = seed(json!([{
            "priceId": 1,
            "price": 35.50,
            "priority": 0,
            "startDate": "2020-12-31T00:00:00",
            "endDate": "2020-06-14T00:00:00",
            "currency": "EUR",
        }]))
        .validate_and_into_rules(&TimeReference::utc())
        .unwrap_err();
        assert!(err.to_string().contains("starts after it ends"));
    }

    #[test]
    fn catalog_rejects_duplicate_price_ids() {
        let price = json!({
            "priceId": 1,
            "price": 1.0,
            "priority": 0,
            "startDate": "2020-06-14T00:00:00",
            "endDate": "2020-06-15T00:00:00",
            "currency": "EUR",
        });
        let res = seed(json!([price.clone(), price]))
            .validate_and_into_rules(&TimeReference::utc());
        assert!(res.is_err());
    }
}
