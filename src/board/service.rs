// Board service - a single task owns the KitchenBoard and applies commands
// one at a time, so the order list needs no locking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BoardCounts, BoardFilter, BoardNotification, KitchenBoard};
use crate::clock::Clock;
use crate::orders::{Order, OrderError, OrderView, StatusEvent};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("Kitchen board service is not running")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub taken_at: DateTime<Utc>,
    pub counts: BoardCounts,
    pub orders: Vec<OrderView>,
}

#[derive(Debug)]
pub enum BoardCommand {
    Ingest(Order),
    ChangeStatus {
        order_id: String,
        intent: StatusEvent,
        reply: oneshot::Sender<Result<(), OrderError>>,
    },
    ToggleLine {
        order_id: String,
        line_id: String,
        reply: oneshot::Sender<Result<bool, OrderError>>,
    },
    SetNotifications(bool),
    Snapshot {
        filter: BoardFilter,
        reply: oneshot::Sender<BoardSnapshot>,
    },
}

/// Cloneable sender side of a running board
#[derive(Debug, Clone)]
pub struct BoardHandle {
    tx: mpsc::Sender<BoardCommand>,
}

impl BoardHandle {
    pub async fn send(&self, command: BoardCommand) -> Result<(), BoardError> {
        self.tx.send(command).await.map_err(|_| BoardError::Closed)
    }

    pub async fn ingest(&self, order: Order) -> Result<(), BoardError> {
        self.send(BoardCommand::Ingest(order)).await
    }

    pub async fn change_status(&self, order_id: &str, intent: StatusEvent) -> Result<(), BoardError> {
        let (reply, rx) = oneshot::channel();
        self.send(BoardCommand::ChangeStatus {
            order_id: order_id.to_string(),
            intent,
            reply,
        })
        .await?;
        rx.await.map_err(|_| BoardError::Closed)??;
        Ok(())
    }

    pub async fn toggle_line(&self, order_id: &str, line_id: &str) -> Result<bool, BoardError> {
        let (reply, rx) = oneshot::channel();
        self.send(BoardCommand::ToggleLine {
            order_id: order_id.to_string(),
            line_id: line_id.to_string(),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| BoardError::Closed)??)
    }

    pub async fn set_notifications(&self, enabled: bool) -> Result<(), BoardError> {
        self.send(BoardCommand::SetNotifications(enabled)).await
    }

    pub async fn snapshot(&self, filter: BoardFilter) -> Result<BoardSnapshot, BoardError> {
        let (reply, rx) = oneshot::channel();
        self.send(BoardCommand::Snapshot { filter, reply }).await?;
        rx.await.map_err(|_| BoardError::Closed)
    }
}

/// Start the board task. It runs until every handle is dropped and then
/// hands the board back through the join handle.
pub fn spawn_board(
    board: KitchenBoard,
    clock: Arc<dyn Clock>,
    notifications: mpsc::UnboundedSender<BoardNotification>,
    buffer: usize,
) -> (BoardHandle, JoinHandle<KitchenBoard>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let task = tokio::spawn(run_board(board, clock, rx, notifications));
    (BoardHandle { tx }, task)
}

async fn run_board(
    mut board: KitchenBoard,
    clock: Arc<dyn Clock>,
    mut rx: mpsc::Receiver<BoardCommand>,
    notifications: mpsc::UnboundedSender<BoardNotification>,
) -> KitchenBoard {
    info!("Kitchen board service started");

    let publish = |note: Option<BoardNotification>| {
        if let Some(note) = note {
            if notifications.send(note).is_err() {
                debug!("No notification listener attached");
            }
        }
    };

    while let Some(command) = rx.recv().await {
        match command {
            BoardCommand::Ingest(order) => publish(board.ingest(order)),
            BoardCommand::ChangeStatus {
                order_id,
                intent,
                reply,
            } => {
                let result = board.apply(&order_id, intent, clock.now());
                let result = match result {
                    Ok(note) => {
                        publish(note);
                        Ok(())
                    }
                    Err(e) => {
                        warn!(order_id = %order_id, error = %e, "Status change rejected");
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }
            BoardCommand::ToggleLine {
                order_id,
                line_id,
                reply,
            } => {
                let _ = reply.send(board.toggle_line(&order_id, &line_id));
            }
            BoardCommand::SetNotifications(enabled) => board.set_notifications(enabled),
            BoardCommand::Snapshot { filter, reply } => {
                let now = clock.now();
                let snapshot = BoardSnapshot {
                    taken_at: now,
                    counts: board.counts(),
                    orders: board.views(filter, now),
                };
                let _ = reply.send(snapshot);
            }
        }
    }

    info!(orders = %board.len(), "Kitchen board service stopped");
    board
}
