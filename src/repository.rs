// Data-access interface for orders, plus an in-memory implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cart::{Cart, CartError};
use crate::orders::{Order, OrderError, OrderLifecycle, OrderStatus, StatusEvent};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },
    #[error("Order already exists: {order_id}")]
    Duplicate { order_id: String },
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Published to subscribers after every stored status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub order_id: String,
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// All known orders, newest first
    async fn fetch_orders(&self) -> Result<Vec<Order>, RepositoryError>;

    async fn fetch_order(&self, order_id: &str) -> Result<Order, RepositoryError>;

    async fn submit_order(&self, order: Order) -> Result<Order, RepositoryError>;

    async fn update_status(
        &self,
        order_id: &str,
        intent: StatusEvent,
        at: DateTime<Utc>,
    ) -> Result<Order, RepositoryError>;

    fn subscribe(&self) -> broadcast::Receiver<StatusChange>;
}

pub fn new_order_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ord-{}", &id[..12])
}

/// Checks out `cart` and stores the resulting order. On any error the
/// cart keeps its lines.
pub async fn submit_cart(
    repository: &dyn OrderRepository,
    cart: &mut Cart,
    table_number: u32,
    now: DateTime<Utc>,
) -> Result<Order, RepositoryError> {
    let mut pending = cart.clone();
    let order = pending.checkout(new_order_id(), table_number, now)?;
    let stored = repository.submit_order(order).await?;
    *cart = pending;
    Ok(stored)
}

#[derive(Debug)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
    changes: broadcast::Sender<StatusChange>,
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            orders: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn publish(&self, order: &Order, at: DateTime<Utc>) {
        let change = StatusChange {
            order_id: order.id.clone(),
            status: order.status,
            at,
        };
        if self.changes.send(change).is_err() {
            debug!(order_id = %order.id, "No status subscribers");
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn fetch_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Order, RepositoryError> {
        self.orders
            .read()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                order_id: order_id.to_string(),
            })
    }

    async fn submit_order(&self, order: Order) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(RepositoryError::Duplicate { order_id: order.id });
        }
        info!(order_id = %order.id, table = %order.table_number, "Order submitted");
        orders.insert(order.id.clone(), order.clone());
        drop(orders);
        self.publish(&order, order.created_at);
        Ok(order)
    }

    async fn update_status(
        &self,
        order_id: &str,
        intent: StatusEvent,
        at: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(order_id).ok_or_else(|| RepositoryError::NotFound {
            order_id: order_id.to_string(),
        })?;

        let previous = stored.status;
        let mut lifecycle = OrderLifecycle::new(stored.clone());
        match intent {
            StatusEvent::Advance(target) => lifecycle.advance(target, at)?,
            StatusEvent::Force(target) => lifecycle.force_status(target, at),
        }
        *stored = lifecycle.into_order();
        let updated = stored.clone();
        drop(orders);

        if updated.status == previous {
            debug!(order_id = %updated.id, status = %previous, "Status unchanged, nothing published");
        } else {
            self.publish(&updated, at);
        }
        Ok(updated)
    }

    fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.changes.subscribe()
    }
}
