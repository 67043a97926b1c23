use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockpile API",
        version = "0.1.0",
        description = r#"
# Stockpile Inventory API

Backend for an inventory dashboard: products, warehouses, per-warehouse stock,
inter-warehouse transfers and low-stock alerts.

## Ids and quantities

Ids and quantities in request bodies may be sent as numbers or numeric strings.

## Error Handling

Every error uses the same body:

```json
{
  "error": "ValidationError",
  "message": "Quantity must be greater than 0",
  "requestId": "1f0c7c3e-1d7e-4bb2-9d38-3f6b2b1f9e0a",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "warehouses", description = "Warehouses"),
        (name = "stock", description = "Per-warehouse stock rows"),
        (name = "transfers", description = "Inter-warehouse transfers"),
        (name = "alerts", description = "Low-stock alerts"),
        (name = "dashboard", description = "Dashboard read models"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Warehouses
        crate::handlers::warehouses::list_warehouses,
        crate::handlers::warehouses::get_warehouse,
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::update_warehouse,
        crate::handlers::warehouses::delete_warehouse,

        // Stock
        crate::handlers::stock::list_stock,
        crate::handlers::stock::get_stock,
        crate::handlers::stock::create_stock,
        crate::handlers::stock::update_stock,
        crate::handlers::stock::delete_stock,

        // Transfers
        crate::handlers::transfers::list_transfers,
        crate::handlers::transfers::create_transfer,

        // Alerts
        crate::handlers::alerts::list_alerts,
        crate::handlers::alerts::create_alert,
        crate::handlers::alerts::update_alert,
        crate::handlers::alerts::check_low_stock,

        // Dashboard
        crate::handlers::dashboard::overview,
        crate::handlers::dashboard::warehouse_chart,
        crate::handlers::dashboard::low_stock,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::models::Product,
            crate::models::Warehouse,
            crate::models::StockItem,
            crate::models::Transfer,
            crate::models::AlertItem,
            crate::models::AlertStatus,

            crate::services::catalog::ProductInput,
            crate::services::catalog::WarehouseInput,
            crate::services::ledger::NewStockItem,
            crate::services::ledger::StockQuantityUpdate,
            crate::services::transfers::TransferRequest,
            crate::services::alerts::NewAlert,
            crate::services::alerts::AlertResolution,
            crate::services::alerts::SweepOutcome,
            crate::services::dashboard::Overview,
            crate::services::dashboard::StockHealth,
            crate::services::dashboard::WarehouseStock,
            crate::services::dashboard::LowStockLine,

            crate::health::HealthInfo,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("Stockpile API"));
        for path in [
            "/api/products/{id}",
            "/api/warehouses",
            "/api/stock/{id}",
            "/api/transfers",
            "/api/alerts",
            "/api/checkLowStock",
            "/api/dashboard/low-stock",
            "/health",
        ] {
            assert!(json.contains(path), "missing {}", path);
        }
    }
}
