// Core types for the order lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical order status shared by the kitchen and customer views.
///
/// The customer view calls `Created` "received"; the difference is only a
/// label, see [`crate::orders::view::ViewKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "received")]
    Created,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Paid,
    Cancelled,
}

/// Linear progression shown by the customer tracker
pub const PROGRESSION: [OrderStatus; 5] = [
    OrderStatus::Created,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Delivered,
];

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Created,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Paid,
        OrderStatus::Cancelled,
    ];

    /// No validated transition leaves a terminal status
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Orders the kitchen no longer needs to see
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Paid | OrderStatus::Cancelled
        )
    }

    /// Position in [`PROGRESSION`], `None` for statuses outside it
    pub fn step_index(self) -> Option<usize> {
        PROGRESSION.iter().position(|s| *s == self)
    }

    /// The single forward step allowed from this status
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Created => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => Some(OrderStatus::Paid),
            OrderStatus::Paid | OrderStatus::Cancelled => None,
        }
    }

    /// Transition table for validated moves: one step forward, or
    /// cancellation from any non-terminal status
    pub fn can_advance_to(self, target: OrderStatus) -> bool {
        if target == OrderStatus::Cancelled {
            return !self.is_terminal();
        }
        self.next() == Some(target)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "received" => Ok(OrderStatus::Created),
            other => OrderStatus::ALL
                .into_iter()
                .find(|status| status.as_str() == other)
                .ok_or_else(|| format!("unknown order status: {s}")),
        }
    }
}

/// Kitchen escalation level for orders in preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Urgent,
    Critical,
}

/// One dish entry within an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub dish_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub notes: Option<String>,
    /// Price of one unit including modifier adjustments
    #[serde(default)]
    pub unit_price: i64,
    /// Kitchen checklist flag, independent of the order status
    #[serde(default)]
    pub completed: bool,
}

impl OrderLine {
    pub fn new(id: impl Into<String>, dish_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            dish_name: dish_name.into(),
            quantity,
            modifiers: Vec::new(),
            notes: None,
            unit_price: 0,
            completed: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<String>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_unit_price(mut self, unit_price: i64) -> Self {
        self.unit_price = unit_price;
        self
    }

    /// `None` when the product does not fit in an `i64`
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

/// Status plus the instant it was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

/// A table's order as seen by the kitchen and the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub table_number: u32,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
    /// Expected wait in minutes; the tracker falls back to its configured
    /// default when absent
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
}

impl Order {
    /// New order in `Created`, with the creation recorded in its history
    pub fn new(
        id: impl Into<String>,
        table_number: u32,
        lines: Vec<OrderLine>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            table_number,
            lines,
            status: OrderStatus::Created,
            created_at,
            notes: None,
            estimated_minutes: None,
            status_history: vec![StatusHistoryEntry {
                status: OrderStatus::Created,
                timestamp: created_at,
            }],
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }

    /// `None` on overflow
    pub fn total(&self) -> Option<i64> {
        self.lines
            .iter()
            .try_fold(0i64, |acc, line| acc.checked_add(line.line_total()?))
    }

    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn line(&self, line_id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Last six characters of the id, upper-cased, as printed on tickets
    pub fn short_id(&self) -> String {
        let chars: Vec<char> = self.id.chars().collect();
        let start = chars.len().saturating_sub(6);
        chars[start..].iter().collect::<String>().to_uppercase()
    }

    /// When `status` was most recently entered, if ever
    pub fn entered_at(&self, status: OrderStatus) -> Option<DateTime<Utc>> {
        self.status_history
            .iter()
            .rev()
            .find(|h| h.status == status)
            .map(|h| h.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        assert!(Created.can_advance_to(Confirmed));
        assert!(Ready.can_advance_to(Delivered));
        assert!(Delivered.can_advance_to(Paid));
        assert!(!Created.can_advance_to(Preparing));
        assert!(!Delivered.can_advance_to(Confirmed));
        assert!(!Preparing.can_advance_to(Preparing));

        for status in [Created, Confirmed, Preparing, Ready, Delivered] {
            assert!(status.can_advance_to(Cancelled), "{status} should cancel");
        }
        assert!(!Paid.can_advance_to(Cancelled));
        assert!(!Cancelled.can_advance_to(Cancelled));
    }

    #[test]
    fn test_received_alias_deserializes_to_created() {
        let status: OrderStatus = serde_json::from_str("\"received\"").unwrap();
        assert_eq!(status, OrderStatus::Created);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"created\"");

        assert_eq!("Received".parse::<OrderStatus>(), Ok(OrderStatus::Created));
        assert_eq!("preparing".parse::<OrderStatus>(), Ok(OrderStatus::Preparing));
        assert!("cooking".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_total_and_short_id() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap();
        let order = Order::new(
            "ord-abc123",
            5,
            vec![
                OrderLine::new("item-1", "Provoleta", 1).with_unit_price(3300),
                OrderLine::new("item-2", "Bife de Chorizo", 2).with_unit_price(6250),
            ],
            at,
        );

        assert_eq!(order.total(), Some(15800));
        assert_eq!(order.total_items(), 3);
        assert_eq!(order.short_id(), "ABC123");
        assert_eq!(order.entered_at(OrderStatus::Created), Some(at));
    }

    #[test]
    fn test_order_totals_do_not_overflow() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap();
        let order = Order::new(
            "ord-big",
            5,
            vec![
                OrderLine::new("item-1", "Agua", u32::MAX).with_unit_price(1),
                OrderLine::new("item-2", "Agua", 1).with_unit_price(1),
            ],
            at,
        );
        assert_eq!(order.total_items(), u64::from(u32::MAX) + 1);
        assert_eq!(order.total(), Some(i64::from(u32::MAX) + 1));

        let order = Order::new(
            "ord-huge",
            5,
            vec![OrderLine::new("item-1", "Whole cow", 2).with_unit_price(i64::MAX)],
            at,
        );
        assert_eq!(order.lines[0].line_total(), None);
        assert_eq!(order.total(), None);
    }
}
