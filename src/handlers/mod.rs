pub mod alerts;
pub mod common;
pub mod dashboard;
pub mod products;
pub mod stock;
pub mod transfers;
pub mod warehouses;

use crate::{
    config::AppConfig,
    events::EventSender,
    services::{
        AlertSweeper, DashboardService, ProductService, StockLedger, TransferEngine,
        WarehouseService,
    },
    store::RecordStore,
};
use std::sync::Arc;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub warehouses: Arc<WarehouseService>,
    pub stock: Arc<StockLedger>,
    pub transfers: Arc<TransferEngine>,
    pub alerts: Arc<AlertSweeper>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(store: Arc<RecordStore>, event_sender: EventSender, config: &AppConfig) -> Self {
        let default_reorder_point = config.default_reorder_point;

        Self {
            products: Arc::new(ProductService::new(store.clone(), event_sender.clone())),
            warehouses: Arc::new(WarehouseService::new(store.clone(), event_sender.clone())),
            stock: Arc::new(StockLedger::new(store.clone(), event_sender.clone())),
            transfers: Arc::new(TransferEngine::new(store.clone(), event_sender.clone())),
            alerts: Arc::new(AlertSweeper::new(
                store.clone(),
                event_sender,
                default_reorder_point,
            )),
            dashboard: Arc::new(DashboardService::new(store, default_reorder_point)),
        }
    }
}
