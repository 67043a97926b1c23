//! Inter-warehouse stock transfers.
//!
//! A transfer is checked completely before anything is mutated: field presence,
//! quantity, distinct warehouses, the product, the source warehouse, the
//! destination warehouse and finally stock sufficiency, in that order. The
//! products, warehouses, stock and transfers collections stay locked for the
//! whole cycle so two transfers from the same source can never both spend the
//! same units.

use crate::common::{whole_number, FieldCheck};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Product, StockItem, Transfer, Warehouse};
use crate::services::ledger;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// Body of `POST /transfers`. Every field accepts a number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 1)]
    pub product_id: Option<f64>,

    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 1)]
    pub from_warehouse_id: Option<f64>,

    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 2)]
    pub to_warehouse_id: Option<f64>,

    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 5)]
    pub quantity: Option<f64>,
}

/// A transfer request whose fields have all parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferCommand {
    pub product_id: i64,
    pub from_warehouse_id: i64,
    pub to_warehouse_id: i64,
    pub quantity: i64,
}

impl TryFrom<TransferRequest> for TransferCommand {
    type Error = ServiceError;

    fn try_from(req: TransferRequest) -> Result<Self, Self::Error> {
        let mut check = FieldCheck::new();
        let product_id = check.require_id("productId", req.product_id);
        let from_warehouse_id = check.require_id("fromWarehouseId", req.from_warehouse_id);
        let to_warehouse_id = check.require_id("toWarehouseId", req.to_warehouse_id);
        let quantity = check.require("quantity", req.quantity);
        check.finish()?;

        let quantity = quantity
            .and_then(whole_number)
            .filter(|q| *q > 0)
            .ok_or(ServiceError::InvalidQuantity)?;

        Ok(TransferCommand {
            product_id,
            from_warehouse_id,
            to_warehouse_id,
            quantity,
        })
    }
}

impl From<TransferCommand> for TransferRequest {
    fn from(cmd: TransferCommand) -> Self {
        TransferRequest {
            product_id: Some(cmd.product_id as f64),
            from_warehouse_id: Some(cmd.from_warehouse_id as f64),
            to_warehouse_id: Some(cmd.to_warehouse_id as f64),
            quantity: Some(cmd.quantity as f64),
        }
    }
}

/// Checks a parsed command against the current collections without mutating
/// anything.
pub fn validate(
    cmd: &TransferCommand,
    products: &[Product],
    warehouses: &[Warehouse],
    stock: &[StockItem],
) -> Result<(), ServiceError> {
    if cmd.quantity <= 0 {
        return Err(ServiceError::InvalidQuantity);
    }
    if cmd.from_warehouse_id == cmd.to_warehouse_id {
        return Err(ServiceError::SameWarehouse);
    }
    if !products.iter().any(|p| p.id == cmd.product_id) {
        return Err(ServiceError::ProductNotFound(cmd.product_id));
    }
    if !warehouses.iter().any(|w| w.id == cmd.from_warehouse_id) {
        return Err(ServiceError::SourceWarehouseNotFound(cmd.from_warehouse_id));
    }
    if !warehouses.iter().any(|w| w.id == cmd.to_warehouse_id) {
        return Err(ServiceError::DestinationWarehouseNotFound(cmd.to_warehouse_id));
    }

    // A missing source row counts as zero available.
    let available = ledger::get_quantity(stock, cmd.product_id, cmd.from_warehouse_id);
    if available < cmd.quantity {
        return Err(ServiceError::InsufficientStock {
            available,
            requested: cmd.quantity,
        });
    }
    Ok(())
}

/// Moves the quantity on an already validated command. On error the stock is
/// left as it was.
pub fn apply(cmd: &TransferCommand, stock: &mut Vec<StockItem>) -> Result<(), ServiceError> {
    let snapshot = stock.clone();
    let moved = ledger::adjust(stock, cmd.product_id, cmd.from_warehouse_id, -cmd.quantity)
        .and_then(|_| ledger::adjust(stock, cmd.product_id, cmd.to_warehouse_id, cmd.quantity));
    if let Err(err) = moved {
        *stock = snapshot;
        return Err(err);
    }
    Ok(())
}

/// The record appended for a completed transfer.
pub fn record(id: i64, cmd: &TransferCommand, date: DateTime<Utc>) -> Transfer {
    Transfer {
        id,
        product_id: cmd.product_id,
        from_warehouse_id: cmd.from_warehouse_id,
        to_warehouse_id: cmd.to_warehouse_id,
        quantity: cmd.quantity,
        date,
    }
}

/// Service executing and listing transfers
#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<RecordStore>,
    event_sender: EventSender,
}

impl TransferEngine {
    pub fn new(store: Arc<RecordStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Transfer>, ServiceError> {
        Ok(self.store.transfers.load().await?)
    }

    /// Parses and executes a transfer request.
    #[instrument(skip(self))]
    pub async fn transfer(&self, request: TransferRequest) -> Result<Transfer, ServiceError> {
        let cmd = TransferCommand::try_from(request)?;
        self.execute(cmd).await
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, cmd: TransferCommand) -> Result<Transfer, ServiceError> {
        if cmd.quantity <= 0 {
            return Err(ServiceError::InvalidQuantity);
        }
        if cmd.from_warehouse_id == cmd.to_warehouse_id {
            return Err(ServiceError::SameWarehouse);
        }

        let products = self.store.products.lock().await?;
        let warehouses = self.store.warehouses.lock().await?;
        let mut stock = self.store.stock.lock().await?;
        let mut transfers = self.store.transfers.lock().await?;

        if let Err(err) = validate(&cmd, &products, &warehouses, &stock) {
            warn!(error = %err, "Transfer rejected");
            return Err(err);
        }
        apply(&cmd, &mut stock)?;
        let transfer = transfers
            .insert_with(|id| record(id, &cmd, Utc::now()))
            .clone();

        // Read-only for this operation; release before the writes.
        drop(products);
        drop(warehouses);

        stock.commit().await?;
        transfers.commit().await?;

        info!(
            transfer_id = transfer.id,
            product_id = transfer.product_id,
            from = transfer.from_warehouse_id,
            to = transfer.to_warehouse_id,
            quantity = transfer.quantity,
            "Stock transferred"
        );
        self.event_sender.publish(Event::StockTransferred {
            transfer_id: transfer.id,
            product_id: transfer.product_id,
            from_warehouse_id: transfer.from_warehouse_id,
            to_warehouse_id: transfer.to_warehouse_id,
            quantity: transfer.quantity,
            at: transfer.date,
        });
        Ok(transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn product(id: i64) -> Product {
        Product {
            id,
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            category: String::new(),
            unit_cost: Decimal::ZERO,
            reorder_point: 10,
        }
    }

    fn warehouse(id: i64) -> Warehouse {
        Warehouse {
            id,
            code: format!("W{}", id),
            name: format!("Warehouse {}", id),
            location: String::new(),
        }
    }

    fn row(id: i64, warehouse_id: i64, quantity: i64) -> StockItem {
        StockItem {
            id,
            product_id: 1,
            warehouse_id,
            quantity,
        }
    }

    fn cmd(from: i64, to: i64, quantity: i64) -> TransferCommand {
        TransferCommand {
            product_id: 1,
            from_warehouse_id: from,
            to_warehouse_id: to,
            quantity,
        }
    }

    #[test]
    fn request_parsing_reports_missing_fields_before_quantity() {
        let err = TransferCommand::try_from(TransferRequest {
            product_id: Some(1.0),
            quantity: Some(-3.0),
            ..Default::default()
        })
        .unwrap_err();
        assert_matches!(err, ServiceError::MissingField(fields) => {
            assert_eq!(fields, "fromWarehouseId, toWarehouseId");
        });

        let err = TransferCommand::try_from(TransferRequest {
            product_id: Some(f64::NAN),
            from_warehouse_id: Some(1.0),
            to_warehouse_id: Some(2.0),
            quantity: Some(1.0),
        })
        .unwrap_err();
        assert_matches!(err, ServiceError::MissingField(fields) => assert_eq!(fields, "productId"));
    }

    #[test]
    fn request_parsing_rejects_non_positive_or_fractional_quantity() {
        for quantity in [0.0, -1.0, 1.5, f64::NAN] {
            let err = TransferCommand::try_from(TransferRequest {
                product_id: Some(1.0),
                from_warehouse_id: Some(1.0),
                to_warehouse_id: Some(1.0),
                quantity: Some(quantity),
            })
            .unwrap_err();
            assert_matches!(err, ServiceError::InvalidQuantity);
        }
    }

    #[test]
    fn validation_follows_check_order() {
        let products = [product(1)];
        let warehouses = [warehouse(1), warehouse(2)];
        let stock = [row(1, 1, 3)];

        assert_matches!(
            validate(&cmd(1, 1, 1), &products, &warehouses, &stock),
            Err(ServiceError::SameWarehouse)
        );
        assert_matches!(
            validate(
                &TransferCommand {
                    product_id: 7,
                    ..cmd(9, 8, 1)
                },
                &products,
                &warehouses,
                &stock
            ),
            Err(ServiceError::ProductNotFound(7))
        );
        assert_matches!(
            validate(&cmd(9, 8, 1), &products, &warehouses, &stock),
            Err(ServiceError::SourceWarehouseNotFound(9))
        );
        assert_matches!(
            validate(&cmd(1, 8, 1), &products, &warehouses, &stock),
            Err(ServiceError::DestinationWarehouseNotFound(8))
        );
        assert_matches!(
            validate(&cmd(1, 2, 5), &products, &warehouses, &stock),
            Err(ServiceError::InsufficientStock {
                available: 3,
                requested: 5
            })
        );
        assert_matches!(
            validate(&cmd(2, 1, 1), &products, &warehouses, &stock),
            Err(ServiceError::InsufficientStock { available: 0, .. })
        );
        assert!(validate(&cmd(1, 2, 3), &products, &warehouses, &stock).is_ok());
    }

    #[test]
    fn apply_moves_quantity_and_creates_destination_rows() {
        let mut stock = vec![row(1, 1, 3), row(2, 2, 4)];
        apply(&cmd(1, 2, 2), &mut stock).unwrap();
        assert_eq!(stock, vec![row(1, 1, 1), row(2, 2, 6)]);

        apply(&cmd(2, 3, 6), &mut stock).unwrap();
        assert_eq!(stock, vec![row(1, 1, 1), row(2, 2, 0), row(3, 3, 6)]);
    }

    #[test]
    fn apply_restores_stock_on_failure() {
        let mut stock = vec![row(1, 1, 3)];
        assert_matches!(
            apply(&cmd(1, 2, 4), &mut stock),
            Err(ServiceError::InvariantViolation(_))
        );
        assert_eq!(stock, vec![row(1, 1, 3)]);
    }

    async fn engine(dir: &TempDir) -> (Arc<RecordStore>, TransferEngine) {
        let store = Arc::new(RecordStore::open(dir.path()).await.unwrap());
        store.save(&[product(1)]).await.unwrap();
        store.save(&[warehouse(1), warehouse(2)]).await.unwrap();
        store.save(&[row(1, 1, 3), row(2, 2, 4)]).await.unwrap();
        let (events, _rx) = EventSender::channel(16);
        (store.clone(), TransferEngine::new(store, events))
    }

    #[tokio::test]
    async fn successful_transfer_persists_stock_and_record() {
        let dir = TempDir::new().unwrap();
        let (store, engine) = engine(&dir).await;

        let transfer = engine.execute(cmd(1, 2, 2)).await.unwrap();
        assert_eq!(transfer.id, 1);
        assert_eq!(transfer.quantity, 2);

        let stock = store.load::<StockItem>().await.unwrap();
        assert_eq!(ledger::get_quantity(&stock, 1, 1), 1);
        assert_eq!(ledger::get_quantity(&stock, 1, 2), 6);
        assert_eq!(engine.list().await.unwrap(), vec![transfer]);
    }

    #[tokio::test]
    async fn rejected_transfer_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let (store, engine) = engine(&dir).await;

        let err = engine.execute(cmd(1, 2, 5)).await.unwrap_err();
        assert_matches!(err, ServiceError::InsufficientStock { .. });

        let stock = store.load::<StockItem>().await.unwrap();
        assert_eq!(stock, vec![row(1, 1, 3), row(2, 2, 4)]);
        assert!(engine.list().await.unwrap().is_empty());
    }
}
