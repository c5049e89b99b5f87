//! Dashboard figures derived from recorded sales and stored alerts.

use crate::domain::inventory::Product;
use crate::domain::types::SalesRecord;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    /// Cost of the units sold below list price, which would otherwise have spoiled.
    pub loss_avoided: Decimal,
    /// Margin earned on those marked-down units. Negative when sold below cost.
    pub markdown_profit: Decimal,
    pub reorders_triggered: u64,
}

/// Sales without a recorded price, or for products missing from the catalog,
/// are not counted as markdown sales.
pub fn summarize_kpis(sales: &[SalesRecord], products: &[Product], reorders_triggered: u64) -> KpiSummary {
    let catalog: HashMap<&str, &Product> =
        products.iter().map(|p| (p.product_id.as_str(), p)).collect();

    let mut loss_avoided = Decimal::ZERO;
    let mut markdown_profit = Decimal::ZERO;
    for sale in sales {
        let Some(product) = catalog.get(sale.product_id.as_str()) else {
            continue;
        };
        let Some(price) = Decimal::from_f64(sale.price_at_sale).filter(|p| *p > Decimal::ZERO) else {
            continue;
        };
        if price >= product.selling_price {
            continue;
        }
        let units = Decimal::from(sale.units_sold);
        loss_avoided += units * product.cost_price;
        markdown_profit += units * (price - product.cost_price);
    }

    KpiSummary {
        loss_avoided: loss_avoided.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        markdown_profit: markdown_profit
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        reorders_triggered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bread() -> Product {
        Product {
            product_id: "BREAD".into(),
            name: "Bread".into(),
            category: "Bakery".into(),
            selling_price: dec!(3.00),
            cost_price: dec!(1.50),
            is_perishable: true,
            shelf_life_days: 4,
        }
    }

    #[test]
    fn test_only_marked_down_sales_count() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let sales = vec![
            SalesRecord::new("BREAD", day, 10).with_price(3.0),
            SalesRecord::new("BREAD", day.succ_opt().unwrap(), 4).with_price(2.0),
            SalesRecord::new("BREAD", day.pred_opt().unwrap(), 6).with_price(1.35),
            SalesRecord::new("BREAD", day - chrono::Duration::days(2), 9),
            SalesRecord::new("GHOST", day, 5).with_price(0.5),
        ];

        let kpis = summarize_kpis(&sales, &[bread()], 3);

        // 4 * 1.50 + 6 * 1.50
        assert_eq!(kpis.loss_avoided, dec!(15.00));
        // 4 * 0.50 + 6 * -0.15
        assert_eq!(kpis.markdown_profit, dec!(1.10));
        assert_eq!(kpis.reorders_triggered, 3);
    }

    #[test]
    fn test_no_sales_is_zero() {
        let kpis = summarize_kpis(&[], &[bread()], 0);
        assert_eq!(kpis.loss_avoided, Decimal::ZERO);
        assert_eq!(kpis.markdown_profit, Decimal::ZERO);
    }
}
