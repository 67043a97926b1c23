//! Persisted records. Field names are camelCase on disk and on the wire.

pub mod alert;
pub mod product;
pub mod stock_item;
pub mod transfer;
pub mod warehouse;

pub use alert::{AlertItem, AlertScope, AlertStatus};
pub use product::Product;
pub use stock_item::StockItem;
pub use transfer::Transfer;
pub use warehouse::Warehouse;
