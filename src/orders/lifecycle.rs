use chrono::{DateTime, Duration, Utc};
use statig::prelude::*;
use tracing::{info, warn};

use super::errors::OrderError;
use super::status_flow::{status_of, StatusEvent, StatusFlow};
use super::types::{Order, OrderStatus, StatusHistoryEntry, Urgency, PROGRESSION};

/// Elapsed-time limits for the kitchen escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyThresholds {
    pub urgent_after: Duration,
    pub critical_after: Duration,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            urgent_after: Duration::minutes(10),
            critical_after: Duration::minutes(15),
        }
    }
}

impl UrgencyThresholds {
    pub fn from_minutes(urgent: u32, critical: u32) -> Self {
        Self {
            urgent_after: Duration::minutes(i64::from(urgent)),
            critical_after: Duration::minutes(i64::from(critical)),
        }
    }
}

/// Whole seconds since the order was created. A `now` earlier than the
/// creation time is clock skew and reads as zero.
pub fn elapsed_seconds(order: &Order, now: DateTime<Utc>) -> u64 {
    let diff = now.signed_duration_since(order.created_at).num_seconds();
    if diff < 0 {
        warn!(
            order_id = %order.id,
            skew_seconds = %-diff,
            "Clock skew: now is before order creation, clamping elapsed to zero"
        );
        return 0;
    }
    diff as u64
}

/// Escalation only applies while the kitchen is preparing the order
pub fn urgency(order: &Order, now: DateTime<Utc>, thresholds: &UrgencyThresholds) -> Urgency {
    if order.status != OrderStatus::Preparing {
        return Urgency::Normal;
    }
    let elapsed = elapsed_seconds(order, now) as i64;
    if elapsed >= thresholds.critical_after.num_seconds() {
        Urgency::Critical
    } else if elapsed >= thresholds.urgent_after.num_seconds() {
        Urgency::Urgent
    } else {
        Urgency::Normal
    }
}

/// Percentage along the tracker progression. `Paid` is past delivery and
/// reads as complete; `Cancelled` has no position.
pub fn progress_percentage(status: OrderStatus) -> Option<u8> {
    if status == OrderStatus::Paid {
        return Some(100);
    }
    let index = status.step_index()?;
    let last = PROGRESSION.len() - 1;
    Some(((index * 100) / last) as u8)
}

/// Formats elapsed seconds as `MM:SS`; minutes keep counting past 99
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// One order plus the state machine that owns its status
pub struct OrderLifecycle {
    order: Order,
    machine: StateMachine<StatusFlow>,
}

impl std::fmt::Debug for OrderLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderLifecycle")
            .field("order", &self.order)
            .field("machine_status", &status_of(self.machine.state()))
            .finish()
    }
}

impl OrderLifecycle {
    pub fn new(order: Order) -> Self {
        let machine = StatusFlow::start(order.id.clone(), order.status);
        Self { order, machine }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn into_order(self) -> Order {
        self.order
    }

    pub fn id(&self) -> &str {
        &self.order.id
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }

    /// Validated transition. Rejected moves leave status and history as
    /// they were.
    pub fn advance(&mut self, target: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
        let from = self.order.status;
        self.machine.handle(&StatusEvent::Advance(target));
        let to = status_of(self.machine.state());

        if to == from {
            warn!(
                order_id = %self.order.id,
                from = %from,
                to = %target,
                "Rejected order status transition"
            );
            return Err(OrderError::InvalidTransition {
                order_id: self.order.id.clone(),
                from,
                to: target,
            });
        }

        self.record(to, now);
        info!(order_id = %self.order.id, from = %from, to = %to, "Order status advanced");
        Ok(())
    }

    /// Staff override: applies any status. Setting the current status again
    /// is a no-op and adds no history.
    pub fn force_status(&mut self, target: OrderStatus, now: DateTime<Utc>) {
        let from = self.order.status;
        if from == target {
            return;
        }
        self.machine.handle(&StatusEvent::Force(target));
        self.record(status_of(self.machine.state()), now);
    }

    /// Flips the kitchen checklist flag of one line and returns the new value
    pub fn toggle_line(&mut self, line_id: &str) -> Result<bool, OrderError> {
        let order_id = self.order.id.clone();
        let line = self
            .order
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| OrderError::UnknownLine {
                order_id,
                line_id: line_id.to_string(),
            })?;
        line.completed = !line.completed;
        Ok(line.completed)
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        elapsed_seconds(&self.order, now)
    }

    pub fn urgency(&self, now: DateTime<Utc>, thresholds: &UrgencyThresholds) -> Urgency {
        urgency(&self.order, now, thresholds)
    }

    pub fn progress_percentage(&self) -> Option<u8> {
        progress_percentage(self.order.status)
    }

    fn record(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.order.status = status;
        self.order.status_history.push(StatusHistoryEntry {
            status,
            timestamp: now,
        });
    }
}
