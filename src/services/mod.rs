// Stock and its movements
pub mod ledger;
pub mod transfers;

// Low-stock alerting
pub mod alerts;

// Products and warehouses
pub mod catalog;

// Read models for the dashboard UI
pub mod dashboard;

pub use alerts::AlertSweeper;
pub use catalog::{ProductService, WarehouseService};
pub use dashboard::DashboardService;
pub use ledger::StockLedger;
pub use transfers::TransferEngine;
