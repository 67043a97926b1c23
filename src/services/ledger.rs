//! Stock ledger: on-hand quantity per (product, warehouse) pair.
//!
//! The free functions operate on an already-loaded stock collection so the
//! transfer engine and the alert sweep can compose them inside their own locked
//! cycles. [`StockLedger`] wraps them with persistence and the stock CRUD used by
//! the API.

use crate::common::{whole_number, FieldCheck};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::StockItem;
use crate::store::{next_id, RecordStore};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

/// Quantity of the matching row, or 0 when the pair has no row.
pub fn get_quantity(stock: &[StockItem], product_id: i64, warehouse_id: i64) -> i64 {
    stock
        .iter()
        .find(|s| s.matches(product_id, warehouse_id))
        .map_or(0, |s| s.quantity)
}

/// Sum of quantities, capped at `i64::MAX` instead of overflowing.
pub fn saturating_total(quantities: impl IntoIterator<Item = i64>) -> i64 {
    quantities.into_iter().fold(0, i64::saturating_add)
}

/// Sum of the product's quantities across all warehouses.
pub fn get_total_quantity(stock: &[StockItem], product_id: i64) -> i64 {
    saturating_total(
        stock
            .iter()
            .filter(|s| s.product_id == product_id)
            .map(|s| s.quantity),
    )
}

/// Applies `delta` to the pair's row.
///
/// A missing pair is created only for a positive delta; a non-positive delta on
/// a missing pair is a no-op and returns `None`. A result below zero is rejected
/// and leaves the collection untouched.
pub fn adjust(
    stock: &mut Vec<StockItem>,
    product_id: i64,
    warehouse_id: i64,
    delta: i64,
) -> Result<Option<StockItem>, ServiceError> {
    if let Some(row) = stock.iter_mut().find(|s| s.matches(product_id, warehouse_id)) {
        let updated = row
            .quantity
            .checked_add(delta)
            .filter(|q| *q >= 0)
            .ok_or_else(|| {
                ServiceError::InvariantViolation(format!(
                    "stock {} of product {} in warehouse {} cannot change by {}",
                    row.quantity, product_id, warehouse_id, delta
                ))
            })?;
        row.quantity = updated;
        return Ok(Some(row.clone()));
    }

    if delta <= 0 {
        return Ok(None);
    }

    let row = StockItem {
        id: next_id(stock),
        product_id,
        warehouse_id,
        quantity: delta,
    };
    stock.push(row.clone());
    Ok(Some(row))
}

/// Body of `POST /stock`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStockItem {
    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 1)]
    pub product_id: Option<f64>,

    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 2)]
    pub warehouse_id: Option<f64>,

    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 40)]
    pub quantity: Option<f64>,
}

/// Body of `PUT /stock/{id}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StockQuantityUpdate {
    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 12)]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StockFilter {
    /// Only rows for this product
    pub product_id: Option<i64>,
    /// Only rows held in this warehouse
    pub warehouse_id: Option<i64>,
}

impl StockFilter {
    fn accepts(&self, row: &StockItem) -> bool {
        self.product_id.map_or(true, |id| row.product_id == id)
            && self.warehouse_id.map_or(true, |id| row.warehouse_id == id)
    }
}

fn stock_quantity(value: Option<f64>) -> Result<i64, ServiceError> {
    let value = value.ok_or_else(|| ServiceError::MissingField("quantity".into()))?;
    whole_number(value)
        .filter(|q| *q >= 0)
        .ok_or_else(|| ServiceError::ValidationError("Quantity must be a whole number of 0 or more".into()))
}

/// Service for stock rows
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<RecordStore>,
    event_sender: EventSender,
}

impl StockLedger {
    pub fn new(store: Arc<RecordStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &StockFilter) -> Result<Vec<StockItem>, ServiceError> {
        let stock = self.store.stock.load().await?;
        Ok(stock.into_iter().filter(|row| filter.accepts(row)).collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<StockItem, ServiceError> {
        self.store
            .stock
            .load()
            .await?
            .into_iter()
            .find(|row| row.id == id)
            .ok_or_else(|| ServiceError::not_found("Stock item", id))
    }

    #[instrument(skip(self))]
    pub async fn quantity(&self, product_id: i64, warehouse_id: i64) -> Result<i64, ServiceError> {
        let stock = self.store.stock.load().await?;
        Ok(get_quantity(&stock, product_id, warehouse_id))
    }

    #[instrument(skip(self))]
    pub async fn total_quantity(&self, product_id: i64) -> Result<i64, ServiceError> {
        let stock = self.store.stock.load().await?;
        Ok(get_total_quantity(&stock, product_id))
    }

    /// Adds a stock row. A row for an existing pair is merged into it by adding
    /// the quantity.
    #[instrument(skip(self))]
    pub async fn create(&self, input: NewStockItem) -> Result<StockItem, ServiceError> {
        let mut check = FieldCheck::new();
        let product_id = check.require_id("productId", input.product_id);
        let warehouse_id = check.require_id("warehouseId", input.warehouse_id);
        check.require("quantity", input.quantity);
        check.finish()?;
        let quantity = stock_quantity(input.quantity)?;

        let products = self.store.products.lock().await?;
        let warehouses = self.store.warehouses.lock().await?;
        if !products.contains(product_id) {
            return Err(ServiceError::ProductNotFound(product_id));
        }
        if !warehouses.contains(warehouse_id) {
            return Err(ServiceError::WarehouseNotFound(warehouse_id));
        }

        let mut stock = self.store.stock.lock().await?;
        let row = match stock.iter().position(|s| s.matches(product_id, warehouse_id)) {
            Some(index) => {
                let existing = &mut stock[index];
                existing.quantity = existing.quantity.checked_add(quantity).ok_or_else(|| {
                    ServiceError::ValidationError("Quantity is too large".into())
                })?;
                existing.clone()
            }
            None => stock
                .insert_with(|id| StockItem {
                    id,
                    product_id,
                    warehouse_id,
                    quantity,
                })
                .clone(),
        };
        stock.commit().await?;

        info!(stock_id = row.id, product_id, warehouse_id, quantity = row.quantity, "Stock recorded");
        self.publish_change(&row);
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        id: i64,
        update: StockQuantityUpdate,
    ) -> Result<StockItem, ServiceError> {
        let quantity = stock_quantity(update.quantity)?;

        let mut stock = self.store.stock.lock().await?;
        let row = stock
            .find_mut(id)
            .ok_or_else(|| ServiceError::not_found("Stock item", id))?;
        row.quantity = quantity;
        let row = row.clone();
        stock.commit().await?;

        self.publish_change(&row);
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<StockItem, ServiceError> {
        let mut stock = self.store.stock.lock().await?;
        let removed = stock
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("Stock item", id))?;
        stock.commit().await?;

        self.event_sender.publish(Event::StockRemoved(id));
        Ok(removed)
    }

    /// Applies a signed delta to a pair and persists it. Returns `None` when the
    /// pair has no row and the delta is not positive.
    #[instrument(skip(self))]
    pub async fn adjust(
        &self,
        product_id: i64,
        warehouse_id: i64,
        delta: i64,
    ) -> Result<Option<StockItem>, ServiceError> {
        let mut stock = self.store.stock.lock().await?;
        let row = adjust(&mut stock, product_id, warehouse_id, delta)?;
        if let Some(row) = &row {
            stock.commit().await?;
            self.publish_change(row);
        }
        Ok(row)
    }

    fn publish_change(&self, row: &StockItem) {
        self.event_sender.publish(Event::StockChanged {
            stock_id: row.id,
            product_id: row.product_id,
            warehouse_id: row.warehouse_id,
            quantity: row.quantity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, Warehouse};
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn row(id: i64, product_id: i64, warehouse_id: i64, quantity: i64) -> StockItem {
        StockItem {
            id,
            product_id,
            warehouse_id,
            quantity,
        }
    }

    #[test]
    fn quantities_default_to_zero() {
        let stock = vec![row(1, 1, 1, 3), row(2, 1, 2, 4), row(3, 2, 1, 9)];
        assert_eq!(get_quantity(&stock, 1, 2), 4);
        assert_eq!(get_quantity(&stock, 1, 3), 0);
        assert_eq!(get_total_quantity(&stock, 1), 7);
        assert_eq!(get_total_quantity(&stock, 5), 0);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let huge = 1i64 << 62;
        let stock = vec![row(1, 1, 1, huge), row(2, 1, 2, huge), row(3, 1, 3, huge)];
        assert_eq!(get_total_quantity(&stock, 1), i64::MAX);
        assert_eq!(saturating_total([huge, 2]), huge + 2);
    }

    #[test]
    fn adjust_creates_rows_only_for_positive_deltas() {
        let mut stock = vec![row(4, 1, 1, 3)];

        assert_eq!(adjust(&mut stock, 1, 2, 0).unwrap(), None);
        assert_eq!(adjust(&mut stock, 1, 2, -1).unwrap(), None);
        assert_eq!(stock.len(), 1);

        let created = adjust(&mut stock, 1, 2, 5).unwrap().unwrap();
        assert_eq!(created, row(5, 1, 2, 5));
    }

    #[test]
    fn adjust_rejects_negative_results() {
        let mut stock = vec![row(1, 1, 1, 3)];
        assert_matches!(
            adjust(&mut stock, 1, 1, -4),
            Err(ServiceError::InvariantViolation(_))
        );
        assert_eq!(stock[0].quantity, 3);

        assert_eq!(adjust(&mut stock, 1, 1, -3).unwrap().unwrap().quantity, 0);
    }

    async fn ledger(dir: &TempDir) -> StockLedger {
        let store = Arc::new(RecordStore::open(dir.path()).await.unwrap());
        store
            .save(&[Product {
                id: 1,
                sku: "SKU-1".into(),
                name: "Widget".into(),
                category: "parts".into(),
                unit_cost: Decimal::ONE,
                reorder_point: 5,
            }])
            .await
            .unwrap();
        store
            .save(&[Warehouse {
                id: 1,
                code: "W1".into(),
                name: "North".into(),
                location: "Oslo".into(),
            }])
            .await
            .unwrap();
        let (events, _rx) = EventSender::channel(16);
        StockLedger::new(store, events)
    }

    #[tokio::test]
    async fn create_merges_existing_pairs() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir).await;

        let first = ledger
            .create(NewStockItem {
                product_id: Some(1.0),
                warehouse_id: Some(1.0),
                quantity: Some(4.0),
            })
            .await
            .unwrap();
        let merged = ledger
            .create(NewStockItem {
                product_id: Some(1.0),
                warehouse_id: Some(1.0),
                quantity: Some(6.0),
            })
            .await
            .unwrap();

        assert_eq!(first.id, merged.id);
        assert_eq!(merged.quantity, 10);
        assert_eq!(ledger.list(&StockFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_validates_references_and_quantity() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir).await;

        let missing = ledger.create(NewStockItem::default()).await;
        assert_matches!(missing, Err(ServiceError::MissingField(fields)) => {
            assert_eq!(fields, "productId, warehouseId, quantity");
        });

        let unknown = ledger
            .create(NewStockItem {
                product_id: Some(1.0),
                warehouse_id: Some(9.0),
                quantity: Some(1.0),
            })
            .await;
        assert_matches!(unknown, Err(ServiceError::WarehouseNotFound(9)));

        let negative = ledger
            .create(NewStockItem {
                product_id: Some(1.0),
                warehouse_id: Some(1.0),
                quantity: Some(-2.0),
            })
            .await;
        assert_matches!(negative, Err(ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn set_quantity_and_delete_report_unknown_ids() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir).await;

        let update = ledger
            .set_quantity(
                3,
                StockQuantityUpdate {
                    quantity: Some(1.0),
                },
            )
            .await;
        assert_matches!(update, Err(ServiceError::NotFound(_)));
        assert_matches!(ledger.delete(3).await, Err(ServiceError::NotFound(_)));

        let created = ledger.adjust(1, 1, 7).await.unwrap().unwrap();
        let updated = ledger
            .set_quantity(
                created.id,
                StockQuantityUpdate {
                    quantity: Some(2.0),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, 2);
        assert_eq!(ledger.quantity(1, 1).await.unwrap(), 2);

        ledger.delete(created.id).await.unwrap();
        assert_eq!(ledger.total_quantity(1).await.unwrap(), 0);
    }
}
