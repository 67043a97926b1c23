use crate::common::whole_number;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Product, Warehouse};
use crate::services::ledger::saturating_total;
use crate::store::RecordStore;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn non_negative_cost(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("unit_cost");
        err.message = Some("unitCost must be 0 or more".into());
        return Err(err);
    }
    Ok(())
}

fn reorder_point_value(value: f64) -> Result<(), ValidationError> {
    match whole_number(value) {
        Some(n) if n >= 0 => Ok(()),
        _ => {
            let mut err = ValidationError::new("reorder_point");
            err.message = Some("reorderPoint must be a whole number of 0 or more".into());
            Err(err)
        }
    }
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    #[schema(example = "WID-001")]
    pub sku: String,

    #[serde(default)]
    #[validate(custom = "not_blank")]
    #[schema(example = "Widget")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "Hardware")]
    pub category: String,

    /// Number or numeric string
    #[serde(default)]
    #[validate(custom = "non_negative_cost")]
    #[schema(value_type = f64, example = 12.5)]
    pub unit_cost: Decimal,

    /// 0 or absent means the configured default applies
    #[serde(default, deserialize_with = "crate::common::deserialize_lenient_number")]
    #[validate(custom = "reorder_point_value")]
    #[schema(value_type = Option<i64>, example = 10)]
    pub reorder_point: Option<f64>,
}

impl ProductInput {
    fn into_product(self, id: i64) -> Product {
        Product {
            id,
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            unit_cost: self.unit_cost,
            reorder_point: self.reorder_point.and_then(whole_number).unwrap_or(0),
        }
    }
}

/// Body of `POST /warehouses` and `PUT /warehouses/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseInput {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    #[schema(example = "OSL-1")]
    pub code: String,

    #[serde(default)]
    #[validate(custom = "not_blank")]
    #[schema(example = "Oslo North")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "Oslo, Norway")]
    pub location: String,
}

impl WarehouseInput {
    fn into_warehouse(self, id: i64) -> Warehouse {
        Warehouse {
            id,
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            location: self.location.trim().to_string(),
        }
    }
}

/// Service for the product catalog
#[derive(Clone)]
pub struct ProductService {
    store: Arc<RecordStore>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(store: Arc<RecordStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.products.load().await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Product, ServiceError> {
        self.store
            .products
            .load()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: ProductInput) -> Result<Product, ServiceError> {
        input.validate()?;

        let mut products = self.store.products.lock().await?;
        let product = products.insert_with(|id| input.into_product(id)).clone();
        products.commit().await?;

        info!(product_id = product.id, sku = %product.sku, "Product created");
        self.event_sender.publish(Event::ProductCreated(product.id));
        Ok(product)
    }

    /// Replaces every field but the id.
    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, input: ProductInput) -> Result<Product, ServiceError> {
        input.validate()?;

        let mut products = self.store.products.lock().await?;
        let slot = products
            .find_mut(id)
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        *slot = input.into_product(id);
        let product = slot.clone();
        products.commit().await?;

        self.event_sender.publish(Event::ProductUpdated(id));
        Ok(product)
    }

    /// Deletes the product and its stock rows.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<Product, ServiceError> {
        let mut products = self.store.products.lock().await?;
        let mut stock = self.store.stock.lock().await?;

        let removed = products
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        let before = stock.len();
        stock.retain(|row| row.product_id != id);
        let removed_stock_rows = before - stock.len();

        products.commit().await?;
        if removed_stock_rows > 0 {
            stock.commit().await?;
            warn!(product_id = id, removed_stock_rows, "Stock rows removed with product");
        }

        self.event_sender.publish(Event::ProductDeleted {
            product_id: id,
            removed_stock_rows,
        });
        Ok(removed)
    }
}

/// Service for warehouses
#[derive(Clone)]
pub struct WarehouseService {
    store: Arc<RecordStore>,
    event_sender: EventSender,
}

impl WarehouseService {
    pub fn new(store: Arc<RecordStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Warehouse>, ServiceError> {
        Ok(self.store.warehouses.load().await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Warehouse, ServiceError> {
        self.store
            .warehouses
            .load()
            .await?
            .into_iter()
            .find(|w| w.id == id)
            .ok_or_else(|| ServiceError::not_found("Warehouse", id))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: WarehouseInput) -> Result<Warehouse, ServiceError> {
        input.validate()?;

        let mut warehouses = self.store.warehouses.lock().await?;
        let warehouse = warehouses.insert_with(|id| input.into_warehouse(id)).clone();
        warehouses.commit().await?;

        info!(warehouse_id = warehouse.id, code = %warehouse.code, "Warehouse created");
        self.event_sender.publish(Event::WarehouseCreated(warehouse.id));
        Ok(warehouse)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, input: WarehouseInput) -> Result<Warehouse, ServiceError> {
        input.validate()?;

        let mut warehouses = self.store.warehouses.lock().await?;
        let slot = warehouses
            .find_mut(id)
            .ok_or_else(|| ServiceError::not_found("Warehouse", id))?;
        *slot = input.into_warehouse(id);
        let warehouse = slot.clone();
        warehouses.commit().await?;

        self.event_sender.publish(Event::WarehouseUpdated(id));
        Ok(warehouse)
    }

    /// Deletes an empty warehouse. Rows left at quantity 0 go with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<Warehouse, ServiceError> {
        let mut warehouses = self.store.warehouses.lock().await?;
        let mut stock = self.store.stock.lock().await?;

        if !warehouses.contains(id) {
            return Err(ServiceError::not_found("Warehouse", id));
        }
        let held = saturating_total(
            stock
                .iter()
                .filter(|row| row.warehouse_id == id)
                .map(|row| row.quantity),
        );
        if held > 0 {
            return Err(ServiceError::ValidationError(format!(
                "Warehouse {} still holds {} units; transfer them out first",
                id, held
            )));
        }

        let removed = warehouses
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("Warehouse", id))?;
        let before = stock.len();
        stock.retain(|row| row.warehouse_id != id);
        let emptied_rows = before - stock.len();

        warehouses.commit().await?;
        if emptied_rows > 0 {
            stock.commit().await?;
        }

        self.event_sender.publish(Event::WarehouseDeleted(id));
        Ok(removed)
    }
}
