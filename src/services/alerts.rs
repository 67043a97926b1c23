//! Low-stock alerts: the sweep that derives them from stock levels, plus manual
//! alerts and resolution.

use crate::common::{legacy_record_id, FieldCheck};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{AlertItem, AlertScope, AlertStatus, Product, StockItem};
use crate::services::ledger;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Alerts for every product whose total, or any of whose warehouse lines, is
/// under the effective reorder point. Ids are assigned consecutively from
/// `first_id`, in product order with the aggregate alert before its lines.
pub fn generate_alerts(
    products: &[Product],
    stock: &[StockItem],
    default_reorder_point: i64,
    first_id: i64,
    now: DateTime<Utc>,
) -> Vec<AlertItem> {
    let mut alerts = Vec::new();

    for product in products {
        let reorder_point = product.effective_reorder_point(default_reorder_point);
        let total = ledger::get_total_quantity(stock, product.id);

        if total < reorder_point {
            alerts.push(low_stock_alert(
                product,
                AlertScope::Aggregate,
                total,
                format!(
                    "Total stock for {} is low ({} units left).",
                    product.name, total
                ),
                now,
            ));
        }

        for line in stock
            .iter()
            .filter(|s| s.product_id == product.id && s.quantity < reorder_point)
        {
            alerts.push(low_stock_alert(
                product,
                AlertScope::Warehouse(line.warehouse_id),
                line.quantity,
                format!(
                    "Stock for {} in warehouse {} is low ({} units left).",
                    product.name, line.warehouse_id, line.quantity
                ),
                now,
            ));
        }
    }

    for (alert, id) in alerts.iter_mut().zip(first_id..) {
        alert.id = id;
    }
    alerts
}

fn low_stock_alert(
    product: &Product,
    scope: AlertScope,
    quantity: i64,
    message: String,
    date: DateTime<Utc>,
) -> AlertItem {
    AlertItem {
        id: 0,
        product_id: product.id,
        product_name: product.name.clone(),
        scope,
        status: AlertStatus::for_quantity(quantity),
        message,
        date,
        resolved: false,
    }
}

/// Result of one sweep.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepOutcome {
    #[schema(example = "2 new alerts generated")]
    pub message: String,
    pub new_alerts: Vec<AlertItem>,
}

impl SweepOutcome {
    pub fn new(new_alerts: Vec<AlertItem>) -> Self {
        let message = if new_alerts.is_empty() {
            "No new low stock alerts".to_string()
        } else {
            format!("{} new alerts generated", new_alerts.len())
        };
        Self {
            message,
            new_alerts,
        }
    }
}

/// Body of `POST /alerts`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 1)]
    pub product_id: Option<f64>,

    #[schema(example = "info")]
    pub status: Option<String>,

    #[schema(example = "Supplier delayed next delivery")]
    pub message: Option<String>,
}

/// Body of `PATCH /alerts`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AlertResolution {
    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[schema(value_type = Option<i64>, example = 3)]
    pub id: Option<f64>,

    pub resolved: Option<bool>,
}

/// Service for alert generation and resolution
#[derive(Clone)]
pub struct AlertSweeper {
    store: Arc<RecordStore>,
    event_sender: EventSender,
    default_reorder_point: i64,
}

impl AlertSweeper {
    pub fn new(store: Arc<RecordStore>, event_sender: EventSender, default_reorder_point: i64) -> Self {
        Self {
            store,
            event_sender,
            default_reorder_point,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<AlertItem>, ServiceError> {
        Ok(self.store.alerts.load().await?)
    }

    /// Drops every unresolved alert and regenerates them from current stock.
    /// Resolved alerts are kept. Returns only the new alerts.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> Result<Vec<AlertItem>, ServiceError> {
        let products = self.store.products.lock().await?;
        let stock = self.store.stock.lock().await?;
        let mut alerts = self.store.alerts.lock().await?;

        // Ids keep growing past alerts this sweep discards.
        let first_id = alerts.next_id();
        alerts.retain(|alert| alert.resolved);
        let kept_resolved = alerts.len();

        let generated = generate_alerts(
            &products,
            &stock,
            self.default_reorder_point,
            first_id,
            Utc::now(),
        );
        drop(stock);
        drop(products);

        alerts.extend(generated.iter().cloned());
        alerts.commit().await?;

        info!(generated = generated.len(), kept_resolved, "Low stock sweep finished");
        self.event_sender.publish(Event::AlertsGenerated {
            generated: generated.len(),
            kept_resolved,
        });
        Ok(generated)
    }

    /// Stores a manually raised alert. The product name is filled in when the
    /// product exists.
    #[instrument(skip(self))]
    pub async fn create_manual(&self, input: NewAlert) -> Result<AlertItem, ServiceError> {
        let mut check = FieldCheck::new();
        let product_id = check.require_id("productId", input.product_id);
        let status = check.require_text("status", input.status.as_deref());
        let message = check.require_text("message", input.message.as_deref());
        check.finish()?;
        let status: AlertStatus = status.parse().map_err(ServiceError::ValidationError)?;

        let products = self.store.products.lock().await?;
        let product_name = products
            .find(product_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let mut alerts = self.store.alerts.lock().await?;
        drop(products);

        let alert = alerts
            .insert_with(|id| AlertItem {
                id,
                product_id,
                product_name,
                scope: AlertScope::Aggregate,
                status,
                message,
                date: Utc::now(),
                resolved: false,
            })
            .clone();
        alerts.commit().await?;

        self.event_sender.publish(Event::AlertCreated(alert.id));
        Ok(alert)
    }

    /// Sets the resolved flag; `false` reopens the alert.
    #[instrument(skip(self))]
    pub async fn set_resolved(&self, id: i64, resolved: bool) -> Result<AlertItem, ServiceError> {
        let mut alerts = self.store.alerts.lock().await?;
        let alert = alerts
            .find_mut(id)
            .ok_or_else(|| ServiceError::not_found("Alert", id))?;
        alert.resolved = resolved;
        let alert = alert.clone();
        alerts.commit().await?;

        self.event_sender.publish(Event::AlertResolutionChanged {
            alert_id: id,
            resolved,
        });
        Ok(alert)
    }

    pub async fn resolve(&self, id: i64) -> Result<AlertItem, ServiceError> {
        self.set_resolved(id, true).await
    }

    /// Applies a `PATCH /alerts` body. A missing `resolved` flag means resolve.
    /// Fractional ids address the alert their whole part was loaded as.
    #[instrument(skip(self))]
    pub async fn apply_resolution(&self, input: AlertResolution) -> Result<AlertItem, ServiceError> {
        let mut check = FieldCheck::new();
        let id = check
            .require("id", legacy_record_id(input.id))
            .unwrap_or_default();
        check.finish()?;
        self.set_resolved(id, input.resolved.unwrap_or(true)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::next_id;
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn product(id: i64, name: &str, reorder_point: i64) -> Product {
        Product {
            id,
            sku: format!("SKU-{}", id),
            name: name.into(),
            category: String::new(),
            unit_cost: Decimal::ZERO,
            reorder_point,
        }
    }

    fn row(id: i64, product_id: i64, warehouse_id: i64, quantity: i64) -> StockItem {
        StockItem {
            id,
            product_id,
            warehouse_id,
            quantity,
        }
    }

    #[test]
    fn aggregate_and_line_alerts_with_severity() {
        let products = [product(1, "Widget", 10)];
        let stock = [row(1, 1, 1, 3), row(2, 1, 2, 4)];

        let alerts = generate_alerts(&products, &stock, 10, 5, Utc::now());
        assert_eq!(alerts.len(), 3);

        assert_eq!(alerts[0].id, 5);
        assert_eq!(alerts[0].scope, AlertScope::Aggregate);
        assert_eq!(alerts[0].status, AlertStatus::Low);
        assert_eq!(
            alerts[0].message,
            "Total stock for Widget is low (7 units left)."
        );

        assert_eq!(alerts[1].scope, AlertScope::Warehouse(1));
        assert_eq!(
            alerts[1].message,
            "Stock for Widget in warehouse 1 is low (3 units left)."
        );
        assert_eq!(alerts[2].id, 7);
    }

    #[test]
    fn empty_line_is_critical() {
        let products = [product(1, "Widget", 10)];
        let stock = [row(1, 1, 1, 0), row(2, 1, 2, 40)];

        let alerts = generate_alerts(&products, &stock, 10, 1, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].scope, AlertScope::Warehouse(1));
        assert_eq!(alerts[0].status, AlertStatus::Critical);
    }

    #[test]
    fn product_without_stock_gets_critical_aggregate_only() {
        let products = [product(1, "Gadget", 0)];
        let alerts = generate_alerts(&products, &[], 10, 1, Utc::now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].status, AlertStatus::Critical);
        assert!(alerts[0].scope.is_aggregate());
    }

    #[test]
    fn huge_totals_are_not_low() {
        let products = [product(1, "Widget", 10)];
        let huge = 1i64 << 62;
        let stock = [row(1, 1, 1, huge), row(2, 1, 2, huge)];

        assert!(generate_alerts(&products, &stock, 10, 1, Utc::now()).is_empty());
    }

    #[test]
    fn zero_reorder_point_uses_default() {
        let products = [product(1, "Bolt", 0)];
        let stock = [row(1, 1, 1, 12)];

        assert!(generate_alerts(&products, &stock, 10, 1, Utc::now()).is_empty());
        assert_eq!(generate_alerts(&products, &stock, 20, 1, Utc::now()).len(), 2);
    }

    #[test]
    fn sweep_message_counts_alerts() {
        assert_eq!(SweepOutcome::new(Vec::new()).message, "No new low stock alerts");
        let alerts = generate_alerts(&[product(1, "Nut", 5)], &[], 10, 1, Utc::now());
        assert_eq!(SweepOutcome::new(alerts).message, "1 new alerts generated");
    }

    async fn sweeper(dir: &TempDir) -> (Arc<RecordStore>, AlertSweeper) {
        let store = Arc::new(RecordStore::open(dir.path()).await.unwrap());
        store.save(&[product(1, "Widget", 10)]).await.unwrap();
        store
            .save(&[row(1, 1, 1, 3), row(2, 1, 2, 4)])
            .await
            .unwrap();
        let (events, _rx) = EventSender::channel(16);
        (store.clone(), AlertSweeper::new(store, events, 10))
    }

    #[tokio::test]
    async fn sweep_replaces_unresolved_and_keeps_resolved() {
        let dir = TempDir::new().unwrap();
        let (_store, sweeper) = sweeper(&dir).await;

        let first = sweeper.sweep().await.unwrap();
        assert_eq!(first.len(), 3);

        sweeper.resolve(first[0].id).await.unwrap();
        let second = sweeper.sweep().await.unwrap();
        assert_eq!(second.len(), 3);
        assert!(second.iter().all(|a| a.id > 3));

        let all = sweeper.list().await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all.iter().filter(|a| a.resolved).count(), 1);
        assert_eq!(next_id(&all), 7);
    }

    #[tokio::test]
    async fn manual_alerts_look_up_product_names() {
        let dir = TempDir::new().unwrap();
        let (_store, sweeper) = sweeper(&dir).await;

        let alert = sweeper
            .create_manual(NewAlert {
                product_id: Some(1.0),
                status: Some("Info".into()),
                message: Some("Recount scheduled".into()),
            })
            .await
            .unwrap();
        assert_eq!(alert.product_name, "Widget");
        assert_eq!(alert.status, AlertStatus::Info);
        assert!(!alert.resolved);

        let orphan = sweeper
            .create_manual(NewAlert {
                product_id: Some(42.0),
                status: Some("low".into()),
                message: Some("Unknown item".into()),
            })
            .await
            .unwrap();
        assert_eq!(orphan.product_name, "");
        assert_eq!(orphan.id, alert.id + 1);

        let missing = sweeper.create_manual(NewAlert::default()).await;
        assert_matches!(missing, Err(ServiceError::MissingField(fields)) => {
            assert_eq!(fields, "productId, status, message");
        });
    }

    #[tokio::test]
    async fn resolution_can_be_reverted_and_unknown_ids_fail() {
        let dir = TempDir::new().unwrap();
        let (_store, sweeper) = sweeper(&dir).await;
        let alerts = sweeper.sweep().await.unwrap();

        let resolved = sweeper
            .apply_resolution(AlertResolution {
                id: Some(alerts[1].id as f64),
                resolved: None,
            })
            .await
            .unwrap();
        assert!(resolved.resolved);

        let reopened = sweeper.set_resolved(alerts[1].id, false).await.unwrap();
        assert!(!reopened.resolved);

        let before = sweeper.list().await.unwrap();
        assert_matches!(sweeper.resolve(999).await, Err(ServiceError::NotFound(_)));
        assert_eq!(sweeper.list().await.unwrap(), before);
    }
}
