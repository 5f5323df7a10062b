use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub brand_id: i32,
}

/// A price that applies to one product during an inclusive validity window.
///
/// `price_id` is what clients know as the price list. Higher `priority` overrides lower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub price_id: i64,
    pub product: Product,
    pub price: f64,
    pub priority: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub currency: String,
}

impl PriceRule {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.start_date <= self.end_date,
            "price {} window starts after it ends ({} > {})",
            self.price_id,
            self.start_date,
            self.end_date
        );
        anyhow::ensure!(
            self.price.is_finite() && self.price >= 0.0,
            "price {} amount must be a non-negative number (got {})",
            self.price_id,
            self.price
        );
        anyhow::ensure!(
            self.currency.len() == 3 && self.currency.bytes().all(|b| b.is_ascii_uppercase()),
            "price {} currency must be an ISO 4217 code (got {:?})",
            self.price_id,
            self.currency
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuery {
    pub product_id: i64,
    pub brand_id: i32,
    pub application_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    pub product_id: i64,
    pub brand_id: i32,
    pub price_list: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub price: f64,
}

impl ResolvedPrice {
    /// The zero-valued shape clients have always received when nothing matched.
    /// Identifiers are zeroed rather than echoed from the query.
    pub fn empty() -> Self {
        Self {
            product_id: 0,
            brand_id: 0,
            price_list: 0,
            start_date: None,
            end_date: None,
            price: 0.0,
        }
    }

    pub fn from_rule(rule: &PriceRule) -> Self {
        Self {
            product_id: rule.product.product_id,
            brand_id: rule.product.brand_id,
            price_list: rule.price_id,
            start_date: Some(rule.start_date),
            end_date: Some(rule.end_date),
            price: rule.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolvedPrice),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn unwrap_or_empty(self) -> ResolvedPrice {
        match self {
            Self::Found(resolved) => resolved,
            Self::NotFound => ResolvedPrice::empty(),
        }
    }
}
