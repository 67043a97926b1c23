use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted after a state change has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StockTransferred {
        transfer_id: i64,
        product_id: i64,
        from_warehouse_id: i64,
        to_warehouse_id: i64,
        quantity: i64,
        at: DateTime<Utc>,
    },
    StockChanged {
        stock_id: i64,
        product_id: i64,
        warehouse_id: i64,
        quantity: i64,
    },
    StockRemoved(i64),
    AlertsGenerated {
        generated: usize,
        kept_resolved: usize,
    },
    AlertCreated(i64),
    AlertResolutionChanged {
        alert_id: i64,
        resolved: bool,
    },
    ProductCreated(i64),
    ProductUpdated(i64),
    ProductDeleted {
        product_id: i64,
        removed_stock_rows: usize,
    },
    WarehouseCreated(i64),
    WarehouseUpdated(i64),
    WarehouseDeleted(i64),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Bounded channel pair; feed the receiver to [`process_events`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Sends without waiting. Events are dropped with a warning when the
    /// channel is full or the processor has stopped; the state change they
    /// describe is already persisted.
    pub fn publish(&self, event: Event) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Drains the event channel, logging each event, until every sender is gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockTransferred {
                transfer_id,
                product_id,
                from_warehouse_id,
                to_warehouse_id,
                quantity,
                ..
            } => info!(
                transfer_id,
                product_id,
                from_warehouse_id,
                to_warehouse_id,
                quantity,
                "Stock transferred"
            ),
            Event::AlertsGenerated {
                generated,
                kept_resolved,
            } => {
                if *generated > 0 {
                    warn!(generated, kept_resolved, "Low stock alerts generated");
                } else {
                    info!(kept_resolved, "Low stock sweep found nothing");
                }
            }
            Event::ProductDeleted {
                product_id,
                removed_stock_rows,
            } => info!(product_id, removed_stock_rows, "Product deleted"),
            other => info!(event = ?other, "Event received"),
        }
    }

    warn!("Event processing loop has ended");
}
