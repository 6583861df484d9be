// Order lifecycle: canonical status, validated transitions and derived
// display state for the kitchen and the customer tracker.

pub mod errors;
pub mod lifecycle;
pub mod status_flow;
pub mod tracker;
pub mod types;
pub mod view;

pub use errors::OrderError;
pub use lifecycle::{
    elapsed_seconds, format_elapsed, progress_percentage, urgency, OrderLifecycle,
    UrgencyThresholds,
};
pub use status_flow::{StatusEvent, StatusFlow};
pub use tracker::{ItemStatus, TrackerView, TrackingStep};
pub use types::{Order, OrderLine, OrderStatus, StatusHistoryEntry, Urgency, PROGRESSION};
pub use view::{next_action_label, OrderView, ViewKind};
