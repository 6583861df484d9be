// GastroGo - order lifecycle core for restaurant ordering, kitchen display
// and customer tracking

pub mod board;
pub mod cart;
pub mod clock;
pub mod config;
pub mod feed;
pub mod menu;
pub mod orders;
pub mod repository;
pub mod telemetry;

// Re-export key types for easy access
pub use board::{
    spawn_board, BoardCounts, BoardError, BoardFilter, BoardHandle, BoardNotification,
    KitchenBoard,
};
pub use cart::{Cart, CartError, CartLine, CartTotals, SelectedModifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{config, GastrogoConfig};
pub use feed::{pump, FeedEvent, OrderEventSource, ScriptedFeed, SimulatedFeed, SimulatedFeedConfig};
pub use menu::{Category, Dish, Menu, ModifierGroup, ModifierOption};
pub use orders::{
    Order, OrderError, OrderLifecycle, OrderLine, OrderStatus, OrderView, StatusEvent,
    TrackerView, Urgency, UrgencyThresholds, ViewKind,
};
pub use repository::{InMemoryOrderRepository, OrderRepository, RepositoryError, StatusChange};
pub use telemetry::{generate_correlation_id, init_telemetry};
