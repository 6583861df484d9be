// Kitchen display board - owns the active order list for one kitchen

pub mod service;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::orders::{
    Order, OrderError, OrderLifecycle, OrderStatus, OrderView, StatusEvent, UrgencyThresholds,
    ViewKind,
};

pub use service::{spawn_board, BoardCommand, BoardError, BoardHandle};

/// Which orders the kitchen wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardFilter {
    /// Everything not yet delivered, paid or cancelled
    #[default]
    Active,
    Status(OrderStatus),
}

impl BoardFilter {
    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            BoardFilter::Active => !status.is_closed(),
            BoardFilter::Status(s) => s == status,
        }
    }
}

/// Events the board raises for the presentation layer (chimes, toasts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BoardNotification {
    NewOrder { order_id: String, table_number: u32 },
    OrderReady { order_id: String, table_number: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoardCounts {
    pub pending: usize,
    pub preparing: usize,
    pub ready: usize,
}

/// Column layout of the KDS
pub const COLUMNS: [OrderStatus; 4] = [
    OrderStatus::Created,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
];

#[derive(Debug)]
pub struct KitchenBoard {
    orders: Vec<OrderLifecycle>,
    thresholds: UrgencyThresholds,
    notifications_enabled: bool,
}

impl Default for KitchenBoard {
    fn default() -> Self {
        Self::new(UrgencyThresholds::default())
    }
}

impl KitchenBoard {
    pub fn new(thresholds: UrgencyThresholds) -> Self {
        Self {
            orders: Vec::new(),
            thresholds,
            notifications_enabled: true,
        }
    }

    pub fn thresholds(&self) -> &UrgencyThresholds {
        &self.thresholds
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    pub fn set_notifications(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
    }

    /// Puts an order at the top of the board. An order already on the board
    /// with the same id is replaced in place.
    pub fn ingest(&mut self, order: Order) -> Option<BoardNotification> {
        let notification = BoardNotification::NewOrder {
            order_id: order.id.clone(),
            table_number: order.table_number,
        };

        if let Some(existing) = self.orders.iter_mut().find(|l| l.id() == order.id) {
            debug!(order_id = %order.id, "Replacing order already on board");
            *existing = OrderLifecycle::new(order);
            return None;
        }

        info!(order_id = %order.id, table = %order.table_number, "New order on board");
        self.orders.insert(0, OrderLifecycle::new(order));
        self.notify(notification)
    }

    pub fn get(&self, order_id: &str) -> Option<&OrderLifecycle> {
        self.orders.iter().find(|l| l.id() == order_id)
    }

    fn get_mut(&mut self, order_id: &str) -> Result<&mut OrderLifecycle, OrderError> {
        self.orders
            .iter_mut()
            .find(|l| l.id() == order_id)
            .ok_or_else(|| OrderError::UnknownOrder {
                order_id: order_id.to_string(),
            })
    }

    /// Applies a status intent to one order
    pub fn apply(
        &mut self,
        order_id: &str,
        intent: StatusEvent,
        now: DateTime<Utc>,
    ) -> Result<Option<BoardNotification>, OrderError> {
        let lifecycle = self.get_mut(order_id)?;
        match intent {
            StatusEvent::Advance(target) => lifecycle.advance(target, now)?,
            StatusEvent::Force(target) => lifecycle.force_status(target, now),
        }

        let order = lifecycle.order();
        if order.status != OrderStatus::Ready {
            return Ok(None);
        }
        let notification = BoardNotification::OrderReady {
            order_id: order.id.clone(),
            table_number: order.table_number,
        };
        Ok(self.notify(notification))
    }

    pub fn toggle_line(&mut self, order_id: &str, line_id: &str) -> Result<bool, OrderError> {
        self.get_mut(order_id)?.toggle_line(line_id)
    }

    pub fn filtered(&self, filter: BoardFilter) -> Vec<&Order> {
        self.orders
            .iter()
            .map(OrderLifecycle::order)
            .filter(|o| filter.matches(o.status))
            .collect()
    }

    /// Orders grouped into the KDS columns, newest first within a column
    pub fn columns(&self) -> Vec<(OrderStatus, Vec<&Order>)> {
        COLUMNS
            .iter()
            .map(|status| (*status, self.filtered(BoardFilter::Status(*status))))
            .collect()
    }

    pub fn counts(&self) -> BoardCounts {
        let count = |status| {
            self.orders
                .iter()
                .filter(|l| l.status() == status)
                .count()
        };
        BoardCounts {
            pending: count(OrderStatus::Created),
            preparing: count(OrderStatus::Preparing),
            ready: count(OrderStatus::Ready),
        }
    }

    pub fn views(&self, filter: BoardFilter, now: DateTime<Utc>) -> Vec<OrderView> {
        self.filtered(filter)
            .into_iter()
            .map(|o| OrderView::build(o, now, ViewKind::Kitchen, &self.thresholds))
            .collect()
    }

    fn notify(&self, notification: BoardNotification) -> Option<BoardNotification> {
        self.notifications_enabled.then_some(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderLine;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap()
    }

    fn order(id: &str, table: u32, status: OrderStatus) -> Order {
        let mut order = Order::new(id, table, vec![OrderLine::new(format!("{id}-1"), "Provoleta", 1)], t0());
        order.status = status;
        order
    }

    #[test]
    fn test_new_orders_go_on_top() {
        let mut board = KitchenBoard::default();
        board.ingest(order("ord-1", 5, OrderStatus::Created));
        let note = board.ingest(order("ord-2", 3, OrderStatus::Created));

        assert_eq!(
            note,
            Some(BoardNotification::NewOrder {
                order_id: "ord-2".into(),
                table_number: 3
            })
        );
        let ids: Vec<_> = board.filtered(BoardFilter::Active).iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec!["ord-2", "ord-1"]);
    }

    #[test]
    fn test_active_filter_hides_closed_orders() {
        let mut board = KitchenBoard::default();
        board.ingest(order("ord-1", 1, OrderStatus::Preparing));
        board.ingest(order("ord-2", 2, OrderStatus::Delivered));
        board.ingest(order("ord-3", 3, OrderStatus::Cancelled));

        assert_eq!(board.filtered(BoardFilter::Active).len(), 1);
        assert_eq!(board.filtered(BoardFilter::Status(OrderStatus::Delivered)).len(), 1);
    }

    #[test]
    fn test_ready_raises_notification_unless_muted() {
        let mut board = KitchenBoard::default();
        board.ingest(order("ord-1", 8, OrderStatus::Preparing));
        board.ingest(order("ord-2", 9, OrderStatus::Preparing));

        let note = board
            .apply("ord-1", StatusEvent::Advance(OrderStatus::Ready), t0())
            .unwrap();
        assert!(matches!(note, Some(BoardNotification::OrderReady { table_number: 8, .. })));

        board.set_notifications(false);
        let note = board
            .apply("ord-2", StatusEvent::Advance(OrderStatus::Ready), t0())
            .unwrap();
        assert_eq!(note, None);
    }

    #[test]
    fn test_unknown_order_is_rejected() {
        let mut board = KitchenBoard::default();
        let err = board
            .apply("ord-404", StatusEvent::Advance(OrderStatus::Confirmed), t0())
            .unwrap_err();
        assert_eq!(err, OrderError::UnknownOrder { order_id: "ord-404".into() });

        let err = board.toggle_line("ord-404", "x").unwrap_err();
        assert!(matches!(err, OrderError::UnknownOrder { .. }));
    }

    #[test]
    fn test_counts_and_columns() {
        let mut board = KitchenBoard::default();
        board.ingest(order("ord-1", 1, OrderStatus::Created));
        board.ingest(order("ord-2", 2, OrderStatus::Preparing));
        board.ingest(order("ord-3", 3, OrderStatus::Preparing));
        board.ingest(order("ord-4", 4, OrderStatus::Ready));

        assert_eq!(
            board.counts(),
            BoardCounts {
                pending: 1,
                preparing: 2,
                ready: 1
            }
        );
        let columns = board.columns();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[2].0, OrderStatus::Preparing);
        assert_eq!(columns[2].1.len(), 2);
        assert!(columns[1].1.is_empty());
    }

    #[test]
    fn test_views_carry_urgency() {
        let mut board = KitchenBoard::default();
        board.ingest(order("ord-1", 1, OrderStatus::Preparing));
        board.ingest(order("ord-2", 2, OrderStatus::Created));

        let views = board.views(BoardFilter::Active, t0() + Duration::minutes(16));
        let preparing = views.iter().find(|v| v.order_id == "ord-1").unwrap();
        let created = views.iter().find(|v| v.order_id == "ord-2").unwrap();

        assert!(preparing.is_critical());
        assert!(!created.is_critical() && !created.is_urgent());
    }

    #[test]
    fn test_duplicate_ingest_replaces_without_notification() {
        let mut board = KitchenBoard::default();
        board.ingest(order("ord-1", 5, OrderStatus::Created));
        board.ingest(order("ord-2", 6, OrderStatus::Created));

        let mut resent = order("ord-1", 7, OrderStatus::Confirmed);
        resent.notes = Some("table moved".into());
        assert_eq!(board.ingest(resent), None);

        assert_eq!(board.len(), 2);
        let replaced = board.get("ord-1").unwrap();
        assert_eq!(replaced.status(), OrderStatus::Confirmed);
        assert_eq!(replaced.order().table_number, 7);

        // keeps its place instead of jumping to the top
        let ids: Vec<_> = board.filtered(BoardFilter::Active).iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec!["ord-2", "ord-1"]);

        // the replacement's machine follows its status
        board
            .apply("ord-1", StatusEvent::Advance(OrderStatus::Preparing), t0())
            .unwrap();
        assert_eq!(board.get("ord-1").unwrap().status(), OrderStatus::Preparing);
    }
}
