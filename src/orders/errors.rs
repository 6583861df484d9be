use thiserror::Error;

use super::types::OrderStatus;

/// Rejections from order operations. State is never modified when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Invalid transition for order {order_id}: {from} -> {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error("Unknown order: {order_id}")]
    UnknownOrder { order_id: String },
    #[error("Unknown line {line_id} in order {order_id}")]
    UnknownLine { order_id: String, line_id: String },
}
