use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::services::notifications::Notifier;

/// Pending notifications produced by successful lifecycle operations. The
/// operation returns before any of these are delivered; a dispatcher task
/// drains them, so mail delivery can never block or fail the mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockingSaved {
        event_id: i64,
        reservoir_name: String,
        recipients: Vec<String>,
        is_update: bool,
    },
    InspectorAssigned {
        event_id: i64,
        reservoir_name: String,
        recipient: String,
    },
    StockingCanceled {
        event_id: i64,
    },
    StockingDeleted {
        event_id: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains lifecycle events and hands them to the notification collaborator.
/// Best-effort throughout: delivery failures are logged and swallowed.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifier: Arc<dyn Notifier>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StockingSaved {
                event_id,
                reservoir_name,
                recipients,
                is_update,
            } => {
                if let Err(e) = notifier
                    .notify_stocking_created_or_updated(
                        &recipients,
                        event_id,
                        &reservoir_name,
                        is_update,
                    )
                    .await
                {
                    warn!(
                        event_id,
                        error = %e,
                        "Failed to deliver stocking notification"
                    );
                }
            }
            Event::InspectorAssigned {
                event_id,
                reservoir_name,
                recipient,
            } => {
                if let Err(e) = notifier
                    .notify_inspector_assigned(&recipient, event_id, &reservoir_name)
                    .await
                {
                    warn!(
                        event_id,
                        error = %e,
                        "Failed to deliver inspector assignment notification"
                    );
                }
            }
            Event::StockingCanceled { event_id } => {
                info!(event_id, "Stocking event canceled");
            }
            Event::StockingDeleted { event_id } => {
                info!(event_id, "Stocking event deleted");
            }
        }
    }

    error!("Event processing loop stopped: channel closed");
}
