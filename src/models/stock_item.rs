use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Quantity on hand of one product in one warehouse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: i64,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
}

impl StockItem {
    pub fn matches(&self, product_id: i64, warehouse_id: i64) -> bool {
        self.product_id == product_id && self.warehouse_id == warehouse_id
    }
}
