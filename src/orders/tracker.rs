// Customer-facing order tracker

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::lifecycle::{elapsed_seconds, progress_percentage};
use super::types::{Order, OrderStatus, PROGRESSION};
use super::view::{status_message, ViewKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub timestamp: Option<DateTime<Utc>>,
    pub completed: bool,
    pub active: bool,
}

/// Per-dish status shown to the customer, derived from the order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Preparing,
    Ready,
}

impl ItemStatus {
    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Preparing => "Preparing",
            ItemStatus::Ready => "Ready",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerView {
    pub order_id: String,
    pub table_number: u32,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub status_icon: &'static str,
    pub message: &'static str,
    pub steps: Vec<TrackingStep>,
    pub progress_percent: Option<u8>,
    /// Hidden once the order is closed
    pub estimated_minutes: Option<i64>,
    /// Hidden once the order is closed
    pub time_progress: Option<f64>,
    pub can_cancel: bool,
    pub cancelled: bool,
    pub item_status: ItemStatus,
}

fn step_description(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Created => "Order received",
        OrderStatus::Confirmed => "Order confirmed",
        OrderStatus::Preparing => "Being prepared",
        OrderStatus::Ready => "Ready to serve",
        OrderStatus::Delivered => "Served at your table",
        OrderStatus::Paid | OrderStatus::Cancelled => "",
    }
}

/// Customers may cancel until the kitchen starts preparing
pub fn can_cancel(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Created | OrderStatus::Confirmed)
}

pub fn item_status(status: OrderStatus) -> ItemStatus {
    match status {
        OrderStatus::Ready => ItemStatus::Ready,
        OrderStatus::Preparing => ItemStatus::Preparing,
        _ => ItemStatus::Pending,
    }
}

/// The order's own estimate, or `fallback` when it carries none
pub fn estimated_wait(order: &Order, fallback: Duration) -> Duration {
    order
        .estimated_minutes
        .map(|minutes| Duration::minutes(i64::from(minutes)))
        .unwrap_or(fallback)
}

/// Share of the estimated wait already spent, capped at 100. `None` once
/// the order is delivered, paid or cancelled, or without a positive estimate.
pub fn time_progress(order: &Order, now: DateTime<Utc>, estimated: Duration) -> Option<f64> {
    let estimated = estimated.num_seconds();
    if order.status.is_closed() || estimated <= 0 {
        return None;
    }
    let elapsed = elapsed_seconds(order, now) as f64;
    Some((elapsed / estimated as f64 * 100.0).min(100.0))
}

/// Steps of the progression with timestamps back-filled from history
pub fn tracking_steps(order: &Order) -> Vec<TrackingStep> {
    // paid is past the last step, so every step reads as completed
    let current = match order.status {
        OrderStatus::Paid => Some(PROGRESSION.len()),
        status => status.step_index(),
    };

    PROGRESSION
        .iter()
        .enumerate()
        .map(|(index, status)| TrackingStep {
            status: *status,
            label: ViewKind::Customer.label(*status),
            icon: ViewKind::Customer.icon(*status),
            description: step_description(*status),
            timestamp: order.entered_at(*status),
            completed: current.is_some_and(|c| index < c),
            active: current == Some(index),
        })
        .collect()
}

impl TrackerView {
    /// `default_estimate` applies to orders without their own estimate
    pub fn build(order: &Order, now: DateTime<Utc>, default_estimate: Duration) -> Self {
        let estimated = estimated_wait(order, default_estimate);
        let time_progress = time_progress(order, now, estimated);
        Self {
            order_id: order.id.clone(),
            table_number: order.table_number,
            status: order.status,
            status_label: ViewKind::Customer.label(order.status),
            status_icon: ViewKind::Customer.icon(order.status),
            message: status_message(order.status),
            steps: tracking_steps(order),
            progress_percent: progress_percentage(order.status),
            estimated_minutes: time_progress.map(|_| estimated.num_minutes()),
            time_progress,
            can_cancel: can_cancel(order.status),
            cancelled: order.status == OrderStatus::Cancelled,
            item_status: item_status(order.status),
        }
    }
}
