use serde::Deserialize;
use sqlx::{postgres::PgListener, PgPool};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{errors::StoreError, repositories::row_store::Table};

/// Channel the table triggers notify on.
pub const CHANGE_CHANNEL: &str = "content_changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
}

#[derive(Deserialize)]
struct Notification {
    table: String,
    op: ChangeOp,
}

impl ChangeEvent {
    /// Parses a trigger payload such as `{"table":"projects","op":"UPDATE"}`.
    pub fn from_payload(payload: &str) -> Result<Self, StoreError> {
        let note: Notification = serde_json::from_str(payload)
            .map_err(|e| StoreError::Rejected(format!("bad change payload: {}", e)))?;
        Ok(ChangeEvent { table: note.table.parse()?, op: note.op })
    }
}

/// Live subscription to row-change notifications.
///
/// Dropping the subscription stops the listener task, so a subscription never
/// outlives its owner.
pub struct RealtimeSubscription {
    handle: JoinHandle<()>,
}

impl RealtimeSubscription {
    pub async fn connect(pool: &PgPool, sender: mpsc::Sender<ChangeEvent>) -> Result<Self, StoreError> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        info!(channel = CHANGE_CHANNEL, "Listening for content changes");

        let handle = tokio::spawn(async move {
            loop {
                // `recv` reconnects on its own after a dropped connection.
                let notification = match listener.recv().await {
                    Ok(n) => n,
                    Err(e) => {
                        error!("Realtime listener failed: {}", e);
                        break;
                    }
                };
                match ChangeEvent::from_payload(notification.payload()) {
                    Ok(event) => {
                        if sender.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring change notification: {}", e),
                }
            }
        });

        Ok(RealtimeSubscription { handle })
    }

    /// Wraps an already running forwarder, e.g. one fed by tests.
    pub fn from_task(handle: JoinHandle<()>) -> Self {
        RealtimeSubscription { handle }
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
