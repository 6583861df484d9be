// Derived view state for the kitchen card and the customer tracker.
// Labels and icons live in one table keyed by the canonical status.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::lifecycle::{elapsed_seconds, format_elapsed, progress_percentage, urgency, UrgencyThresholds};
use super::types::{Order, OrderStatus, Urgency};

/// Which audience a view is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Kitchen,
    Customer,
}

struct StatusPresentation {
    kitchen_label: &'static str,
    customer_label: &'static str,
    icon: &'static str,
    customer_message: &'static str,
}

fn presentation(status: OrderStatus) -> StatusPresentation {
    match status {
        OrderStatus::Created => StatusPresentation {
            kitchen_label: "New",
            customer_label: "Received",
            icon: "📝",
            customer_message: "Your order was received and is in the queue",
        },
        OrderStatus::Confirmed => StatusPresentation {
            kitchen_label: "Confirmed",
            customer_label: "Confirmed",
            icon: "✅",
            customer_message: "The restaurant confirmed your order",
        },
        OrderStatus::Preparing => StatusPresentation {
            kitchen_label: "Preparing",
            customer_label: "In preparation",
            icon: "👨‍🍳",
            customer_message: "The chef is preparing your order!",
        },
        OrderStatus::Ready => StatusPresentation {
            kitchen_label: "Ready",
            customer_label: "Ready!",
            icon: "🔔",
            customer_message: "Your order is ready and on its way",
        },
        OrderStatus::Delivered => StatusPresentation {
            kitchen_label: "Delivered",
            customer_label: "Delivered",
            icon: "✨",
            customer_message: "Enjoy your meal!",
        },
        OrderStatus::Paid => StatusPresentation {
            kitchen_label: "Paid",
            customer_label: "Paid",
            icon: "🧾",
            customer_message: "Thanks for visiting",
        },
        OrderStatus::Cancelled => StatusPresentation {
            kitchen_label: "Cancelled",
            customer_label: "Cancelled",
            icon: "❌",
            customer_message: "This order was cancelled",
        },
    }
}

impl ViewKind {
    pub fn label(self, status: OrderStatus) -> &'static str {
        let p = presentation(status);
        match self {
            ViewKind::Kitchen => p.kitchen_label,
            ViewKind::Customer => p.customer_label,
        }
    }

    pub fn icon(self, status: OrderStatus) -> &'static str {
        presentation(status).icon
    }
}

/// Customer-facing sentence for a status
pub fn status_message(status: OrderStatus) -> &'static str {
    presentation(status).customer_message
}

/// Label of the kitchen button that moves an order one step forward
pub fn next_action_label(status: OrderStatus) -> Option<&'static str> {
    match status {
        OrderStatus::Created => Some("Confirm"),
        OrderStatus::Confirmed => Some("Start preparing"),
        OrderStatus::Preparing => Some("Mark ready"),
        OrderStatus::Ready => Some("Mark delivered"),
        _ => None,
    }
}

/// Everything a presentation layer needs to draw one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub order_id: String,
    pub short_id: String,
    pub table_number: u32,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub status_icon: &'static str,
    pub urgency: Urgency,
    pub progress_percent: Option<u8>,
    pub elapsed_display: String,
    pub next_action_label: Option<&'static str>,
    pub printable: bool,
}

impl OrderView {
    pub fn build(
        order: &Order,
        now: DateTime<Utc>,
        kind: ViewKind,
        thresholds: &UrgencyThresholds,
    ) -> Self {
        Self {
            order_id: order.id.clone(),
            short_id: order.short_id(),
            table_number: order.table_number,
            status: order.status,
            status_label: kind.label(order.status),
            status_icon: kind.icon(order.status),
            urgency: urgency(order, now, thresholds),
            progress_percent: progress_percentage(order.status),
            elapsed_display: format_elapsed(elapsed_seconds(order, now)),
            next_action_label: next_action_label(order.status),
            printable: !matches!(order.status, OrderStatus::Cancelled | OrderStatus::Paid),
        }
    }

    pub fn is_urgent(&self) -> bool {
        self.urgency == Urgency::Urgent
    }

    pub fn is_critical(&self) -> bool {
        self.urgency == Urgency::Critical
    }
}
