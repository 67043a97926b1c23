use crate::errors::ServiceError;
use crate::models::{Product, StockItem, Warehouse};
use crate::services::ledger::saturating_total;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockHealth {
    Success,
    Warning,
    Error,
}

impl StockHealth {
    /// Compares total stock against the sum of raw reorder points: under half is
    /// an error, under the full sum a warning.
    pub fn assess(total_stock: i64, reorder_point_sum: i64) -> Self {
        // total < sum / 2, kept in integers
        if total_stock.saturating_mul(2) < reorder_point_sum {
            StockHealth::Error
        } else if total_stock < reorder_point_sum {
            StockHealth::Warning
        } else {
            StockHealth::Success
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub products: usize,
    pub warehouses: usize,
    pub total_stock: i64,
    pub stock_health: StockHealth,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStock {
    pub warehouse_id: i64,
    pub name: String,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockLine {
    pub stock_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub quantity: i64,
    pub reorder_point: i64,
}

pub fn overview(products: &[Product], warehouses: &[Warehouse], stock: &[StockItem]) -> Overview {
    let total_stock = saturating_total(stock.iter().map(|s| s.quantity));
    let reorder_point_sum = saturating_total(products.iter().map(|p| p.reorder_point));
    Overview {
        products: products.len(),
        warehouses: warehouses.len(),
        total_stock,
        stock_health: StockHealth::assess(total_stock, reorder_point_sum),
    }
}

/// One bar per warehouse, in warehouse order. Warehouses without stock show 0.
pub fn warehouse_chart(warehouses: &[Warehouse], stock: &[StockItem]) -> Vec<WarehouseStock> {
    let mut totals: HashMap<i64, i64> = HashMap::new();
    for row in stock {
        let total = totals.entry(row.warehouse_id).or_default();
        *total = total.saturating_add(row.quantity);
    }
    warehouses
        .iter()
        .map(|w| WarehouseStock {
            warehouse_id: w.id,
            name: w.name.clone(),
            quantity: totals.get(&w.id).copied().unwrap_or(0),
        })
        .collect()
}

/// Stock lines under their product's effective reorder point, lowest first.
/// Lines of unknown products are skipped; unknown warehouses show an empty name.
pub fn low_stock(
    products: &[Product],
    warehouses: &[Warehouse],
    stock: &[StockItem],
    default_reorder_point: i64,
) -> Vec<LowStockLine> {
    let products: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let warehouses: HashMap<i64, &Warehouse> = warehouses.iter().map(|w| (w.id, w)).collect();

    let mut lines: Vec<LowStockLine> = stock
        .iter()
        .filter_map(|row| {
            let product = products.get(&row.product_id)?;
            let reorder_point = product.effective_reorder_point(default_reorder_point);
            (row.quantity < reorder_point).then(|| LowStockLine {
                stock_id: row.id,
                product_id: product.id,
                product_name: product.name.clone(),
                warehouse_id: row.warehouse_id,
                warehouse_name: warehouses
                    .get(&row.warehouse_id)
                    .map(|w| w.name.clone())
                    .unwrap_or_default(),
                quantity: row.quantity,
                reorder_point,
            })
        })
        .collect();
    lines.sort_by_key(|line| (line.quantity, line.stock_id));
    lines
}

/// Read models behind the dashboard cards
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<RecordStore>,
    default_reorder_point: i64,
}

impl DashboardService {
    pub fn new(store: Arc<RecordStore>, default_reorder_point: i64) -> Self {
        Self {
            store,
            default_reorder_point,
        }
    }

    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<Overview, ServiceError> {
        let products = self.store.products.load().await?;
        let warehouses = self.store.warehouses.load().await?;
        let stock = self.store.stock.load().await?;
        Ok(overview(&products, &warehouses, &stock))
    }

    #[instrument(skip(self))]
    pub async fn warehouse_chart(&self) -> Result<Vec<WarehouseStock>, ServiceError> {
        let warehouses = self.store.warehouses.load().await?;
        let stock = self.store.stock.load().await?;
        Ok(warehouse_chart(&warehouses, &stock))
    }

    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<LowStockLine>, ServiceError> {
        let products = self.store.products.load().await?;
        let warehouses = self.store.warehouses.load().await?;
        let stock = self.store.stock.load().await?;
        Ok(low_stock(
            &products,
            &warehouses,
            &stock,
            self.default_reorder_point,
        ))
    }
}
