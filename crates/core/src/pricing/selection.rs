use crate::domain::price::PriceRule;
use chrono::{DateTime, Utc};

/// Rules for `(product_id, brand_id)` whose window contains `at`, in input order.
pub fn applicable_prices<'a>(
    rules: &'a [PriceRule],
    product_id: i64,
    brand_id: i32,
    at: DateTime<Utc>,
) -> Vec<&'a PriceRule> {
    rules
        .iter()
        .filter(|r| r.product.product_id == product_id && r.product.brand_id == brand_id)
        .filter(|r| r.contains(at))
        .collect()
}

/// Highest priority wins; equal priorities fall back to the lowest `price_id`.
pub fn select_rule<'a, I>(candidates: I) -> Option<&'a PriceRule>
where
    I: IntoIterator<Item = &'a PriceRule>,
{
    candidates.into_iter().max_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.price_id.cmp(&a.price_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::Product;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, d, h, m, 0).unwrap()
    }

    fn rule(price_id: i64, priority: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> PriceRule {
        PriceRule {
            price_id,
            product: Product {
                product_id: 35455,
                brand_id: 1,
            },
            price: price_id as f64,
            priority,
            start_date: start,
            end_date: end,
            currency: "EUR".to_string(),
        }
    }

    #[test]
    fn filters_by_product_brand_and_window() {
        let mut other_brand = rule(2, 0, at(1, 0, 0), at(30, 0, 0));
        other_brand.product.brand_id = 2;
        let rules = vec![
            rule(1, 0, at(1, 0, 0), at(30, 0, 0)),
            other_brand,
            rule(3, 0, at(20, 0, 0), at(30, 0, 0)),
        ];

        let found = applicable_prices(&rules, 35455, 1, at(14, 10, 0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].price_id, 1);

        assert!(applicable_prices(&rules, 1, 1, at(14, 10, 0)).is_empty());
    }

    #[test]
    fn boundaries_are_included() {
        let rules = vec![rule(1, 0, at(14, 15, 0), at(14, 18, 30))];
        assert_eq!(applicable_prices(&rules, 35455, 1, at(14, 15, 0)).len(), 1);
        assert_eq!(applicable_prices(&rules, 35455, 1, at(14, 18, 30)).len(), 1);
        assert!(applicable_prices(&rules, 35455, 1, at(14, 18, 31)).is_empty());
    }

    #[test]
    fn highest_priority_wins_regardless_of_order() {
        let base = rule(1, 0, at(1, 0, 0), at(30, 0, 0));
        let promo = rule(2, 1, at(14, 15, 0), at(14, 18, 30));

        assert_eq!(select_rule([&base, &promo]).unwrap().price_id, 2);
        assert_eq!(select_rule([&promo, &base]).unwrap().price_id, 2);
    }

    #[test]
    fn equal_priority_picks_lowest_price_id() {
        let a = rule(9, 1, at(1, 0, 0), at(30, 0, 0));
        let b = rule(4, 1, at(1, 0, 0), at(30, 0, 0));
        let c = rule(6, 1, at(1, 0, 0), at(30, 0, 0));

        assert_eq!(select_rule([&a, &b, &c]).unwrap().price_id, 4);
        assert_eq!(select_rule([&c, &a, &b]).unwrap().price_id, 4);
    }

    #[test]
    fn empty_candidates_select_nothing() {
        assert!(select_rule(std::iter::empty()).is_none());
    }
}
