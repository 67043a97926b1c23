use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A catalog entry. `reorder_point` drives low-stock alerting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    #[serde(default)]
    pub sku: String,

    pub name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default, with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 12.5)]
    pub unit_cost: Decimal,

    #[serde(default)]
    pub reorder_point: i64,
}

impl Product {
    /// Reorder point used for alerting. A zero (unset) reorder point falls back
    /// to `default_reorder_point`.
    pub fn effective_reorder_point(&self, default_reorder_point: i64) -> i64 {
        if self.reorder_point > 0 {
            self.reorder_point
        } else {
            default_reorder_point
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unset_reorder_point_uses_default() {
        let product: Product =
            serde_json::from_str(r#"{"id": 1, "name": "Bolt", "unitCost": 0.25}"#).unwrap();
        assert_eq!(product.reorder_point, 0);
        assert_eq!(product.effective_reorder_point(10), 10);
        assert_eq!(product.unit_cost, dec!(0.25));
    }

    #[test]
    fn unit_cost_is_written_as_a_number() {
        let product = Product {
            id: 3,
            sku: "SKU-3".into(),
            name: "Nut".into(),
            category: "hardware".into(),
            unit_cost: dec!(1.5),
            reorder_point: 4,
        };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["unitCost"], serde_json::json!(1.5));
        assert_eq!(value["reorderPoint"], 4);
        assert_eq!(product.effective_reorder_point(10), 4);
    }
}
