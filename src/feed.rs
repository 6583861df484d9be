// Event sources feeding the kitchen board

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::board::{BoardError, BoardHandle};
use crate::clock::Clock;
use crate::orders::{Order, OrderLine, StatusEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    NewOrder(Order),
    StatusChange { order_id: String, intent: StatusEvent },
    ToggleLine { order_id: String, line_id: String },
}

/// Anything that produces board events: a simulator, a replay, or a real
/// transport. `None` means the source is exhausted.
#[async_trait]
pub trait OrderEventSource: Send {
    async fn next_event(&mut self) -> Option<FeedEvent>;
}

/// Replays a fixed list of events
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    events: VecDeque<FeedEvent>,
}

impl ScriptedFeed {
    pub fn new(events: impl IntoIterator<Item = FeedEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

#[async_trait]
impl OrderEventSource for ScriptedFeed {
    async fn next_event(&mut self) -> Option<FeedEvent> {
        self.events.pop_front()
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedFeedConfig {
    pub tick: Duration,
    pub new_order_probability: f64,
    pub seed: Option<u64>,
    /// Stop after this many ticks; `None` runs forever
    pub max_ticks: Option<u64>,
    pub dish_names: Vec<String>,
    pub max_table: u32,
}

impl Default for SimulatedFeedConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(10),
            new_order_probability: 0.1,
            seed: None,
            max_ticks: None,
            dish_names: ["Provoleta", "Empanadas", "Bife de Chorizo", "Ñoquis"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_table: 15,
        }
    }
}

/// Parses a new-order probability, accepting only finite values in `[0, 1]`
pub fn parse_probability(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid probability {raw:?}: {e}"))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("probability must be a number within [0, 1], got {raw}"));
    }
    Ok(value)
}

/// Injects a random new order on a tick with the configured probability
pub struct SimulatedFeed {
    config: SimulatedFeedConfig,
    rng: StdRng,
    clock: Arc<dyn Clock>,
    interval: Option<Interval>,
    ticks: u64,
}

impl std::fmt::Debug for SimulatedFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedFeed")
            .field("config", &self.config)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl SimulatedFeed {
    pub fn new(mut config: SimulatedFeedConfig, clock: Arc<dyn Clock>) -> Self {
        if !config.new_order_probability.is_finite() {
            warn!(
                probability = %config.new_order_probability,
                "Non-finite new-order probability, feed will inject nothing"
            );
            config.new_order_probability = 0.0;
        }
        config.new_order_probability = config.new_order_probability.clamp(0.0, 1.0);

        let seed = config.seed.unwrap_or_else(rand::random);
        debug!(seed = %seed, "Simulated feed seeded");
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            clock,
            interval: None,
            ticks: 0,
        }
    }

    /// One tick's draw, without waiting
    pub fn roll(&mut self) -> Option<Order> {
        if !self.rng.random_bool(self.config.new_order_probability) {
            return None;
        }
        Some(self.random_order())
    }

    fn random_order(&mut self) -> Order {
        let id = format!("ord-{:08x}", self.rng.random::<u32>());
        let table = self.rng.random_range(1..=self.config.max_table.max(1));
        let dish = match self.config.dish_names.len() {
            0 => "Plato del día".to_string(),
            n => self.config.dish_names[self.rng.random_range(0..n)].clone(),
        };
        let quantity = self.rng.random_range(1..=3);
        let line = OrderLine::new(format!("{id}-1"), dish, quantity);
        Order::new(id, table, vec![line], self.clock.now())
    }

    fn exhausted(&self) -> bool {
        self.config.max_ticks.is_some_and(|max| self.ticks >= max)
    }
}

#[async_trait]
impl OrderEventSource for SimulatedFeed {
    async fn next_event(&mut self) -> Option<FeedEvent> {
        let tick = self.config.tick;
        loop {
            if self.exhausted() {
                return None;
            }
            self.interval
                .get_or_insert_with(|| {
                    let mut interval = interval_at(Instant::now() + tick, tick);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    interval
                })
                .tick()
                .await;
            self.ticks += 1;
            if let Some(order) = self.roll() {
                return Some(FeedEvent::NewOrder(order));
            }
        }
    }
}

/// Forwards every event from `source` into the board. Rejected status
/// changes are logged and skipped; a stopped board ends the pump.
pub async fn pump<S>(source: &mut S, board: &BoardHandle) -> Result<usize, BoardError>
where
    S: OrderEventSource + ?Sized,
{
    let mut forwarded = 0;
    while let Some(event) = source.next_event().await {
        let result = match event {
            FeedEvent::NewOrder(order) => board.ingest(order).await,
            FeedEvent::StatusChange { order_id, intent } => {
                board.change_status(&order_id, intent).await
            }
            FeedEvent::ToggleLine { order_id, line_id } => {
                board.toggle_line(&order_id, &line_id).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => forwarded += 1,
            Err(BoardError::Closed) => return Err(BoardError::Closed),
            Err(e) => warn!(error = %e, "Feed event rejected by board"),
        }
    }
    info!(forwarded = %forwarded, "Event source exhausted");
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn feed(probability: f64, seed: u64) -> SimulatedFeed {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap());
        SimulatedFeed::new(
            SimulatedFeedConfig {
                new_order_probability: probability,
                seed: Some(seed),
                ..Default::default()
            },
            Arc::new(clock),
        )
    }

    #[test]
    fn test_same_seed_same_orders() {
        let mut a = feed(0.5, 42);
        let mut b = feed(0.5, 42);
        for _ in 0..20 {
            assert_eq!(a.roll(), b.roll());
        }
    }

    #[test]
    fn test_probability_bounds() {
        let mut never = feed(0.0, 1);
        let mut always = feed(1.0, 1);
        for _ in 0..10 {
            assert!(never.roll().is_none());
            let order = always.roll().unwrap();
            assert!((1..=15).contains(&order.table_number));
            assert!((1..=3).contains(&order.lines[0].quantity));
        }
    }

    #[test]
    fn test_non_finite_probability_never_injects() {
        for probability in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut source = feed(probability, 3);
            for _ in 0..10 {
                assert!(source.roll().is_none());
            }
        }
        assert!(feed(7.5, 3).roll().is_some());
    }

    #[test]
    fn test_parse_probability() {
        assert_eq!(parse_probability("0.25"), Ok(0.25));
        assert_eq!(parse_probability("1"), Ok(1.0));
        assert!(parse_probability("NaN").is_err());
        assert!(parse_probability("inf").is_err());
        assert!(parse_probability("1.5").is_err());
        assert!(parse_probability("-0.1").is_err());
        assert!(parse_probability("often").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_feed_stops_after_max_ticks() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap());
        let mut feed = SimulatedFeed::new(
            SimulatedFeedConfig {
                new_order_probability: 1.0,
                seed: Some(7),
                max_ticks: Some(3),
                ..Default::default()
            },
            Arc::new(clock),
        );

        let mut produced = 0;
        while let Some(FeedEvent::NewOrder(_)) = feed.next_event().await {
            produced += 1;
        }
        assert_eq!(produced, 3);
    }
}
