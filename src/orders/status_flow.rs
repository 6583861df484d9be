// Status state machine for a single order
//
// Every status is a state under the `order` superstate. Validated advances
// are accepted only by the state they leave; anything else is absorbed as
// `Handled`, so the caller detects a rejection by the state not changing.
// Forced moves bubble up to the superstate and are applied from anywhere.

use statig::prelude::*;

use super::types::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// Validated move along the transition table
    Advance(OrderStatus),
    /// Staff override, accepted from any status
    Force(OrderStatus),
}

#[derive(Debug, Default)]
pub struct StatusFlow {
    pub order_id: String,
}

impl StatusFlow {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }

    /// Build a running machine positioned at `initial`
    pub fn start(order_id: impl Into<String>, initial: OrderStatus) -> StateMachine<StatusFlow> {
        let mut machine = StatusFlow::new(order_id).state_machine();
        if initial != OrderStatus::Created {
            machine.handle(&StatusEvent::Force(initial));
        }
        machine
    }
}

#[state_machine(initial = "State::created()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl StatusFlow {
    #[superstate]
    fn order(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Force(target) => {
                tracing::warn!(order_id = %self.order_id, to = %target, "Order status forced");
                Transition(state_for(*target))
            }
            StatusEvent::Advance(target) => {
                tracing::debug!(order_id = %self.order_id, to = %target, "Advance not allowed here");
                Handled
            }
        }
    }

    #[state(superstate = "order")]
    fn created(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Advance(OrderStatus::Confirmed) => Transition(State::confirmed()),
            StatusEvent::Advance(OrderStatus::Cancelled) => Transition(State::cancelled()),
            _ => Super,
        }
    }

    #[state(superstate = "order")]
    fn confirmed(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Advance(OrderStatus::Preparing) => Transition(State::preparing()),
            StatusEvent::Advance(OrderStatus::Cancelled) => Transition(State::cancelled()),
            _ => Super,
        }
    }

    #[state(superstate = "order")]
    fn preparing(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Advance(OrderStatus::Ready) => Transition(State::ready()),
            StatusEvent::Advance(OrderStatus::Cancelled) => Transition(State::cancelled()),
            _ => Super,
        }
    }

    #[state(superstate = "order")]
    fn ready(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Advance(OrderStatus::Delivered) => Transition(State::delivered()),
            StatusEvent::Advance(OrderStatus::Cancelled) => Transition(State::cancelled()),
            _ => Super,
        }
    }

    #[state(superstate = "order")]
    fn delivered(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Advance(OrderStatus::Paid) => Transition(State::paid()),
            StatusEvent::Advance(OrderStatus::Cancelled) => Transition(State::cancelled()),
            _ => Super,
        }
    }

    #[state(superstate = "order")]
    fn paid(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Force(_) => Super,
            StatusEvent::Advance(_) => Handled,
        }
    }

    #[state(superstate = "order")]
    fn cancelled(&mut self, event: &StatusEvent) -> Outcome<State> {
        match event {
            StatusEvent::Force(_) => Super,
            StatusEvent::Advance(_) => Handled,
        }
    }
}

fn state_for(status: OrderStatus) -> State {
    match status {
        OrderStatus::Created => State::created(),
        OrderStatus::Confirmed => State::confirmed(),
        OrderStatus::Preparing => State::preparing(),
        OrderStatus::Ready => State::ready(),
        OrderStatus::Delivered => State::delivered(),
        OrderStatus::Paid => State::paid(),
        OrderStatus::Cancelled => State::cancelled(),
    }
}

/// Status a machine state stands for
pub fn status_of(state: &State) -> OrderStatus {
    match state {
        State::Created { .. } => OrderStatus::Created,
        State::Confirmed { .. } => OrderStatus::Confirmed,
        State::Preparing { .. } => OrderStatus::Preparing,
        State::Ready { .. } => OrderStatus::Ready,
        State::Delivered { .. } => OrderStatus::Delivered,
        State::Paid { .. } => OrderStatus::Paid,
        State::Cancelled { .. } => OrderStatus::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(machine: &StateMachine<StatusFlow>) -> OrderStatus {
        status_of(machine.state())
    }

    #[test]
    fn test_status_flow_happy_path() {
        let mut machine = StatusFlow::start("ord-1", OrderStatus::Created);
        assert_eq!(current(&machine), OrderStatus::Created);

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Paid,
        ] {
            machine.handle(&StatusEvent::Advance(next));
            assert_eq!(current(&machine), next);
        }
    }

    #[test]
    fn test_status_flow_ignores_skips_and_reversals() {
        let mut machine = StatusFlow::start("ord-1", OrderStatus::Created);

        machine.handle(&StatusEvent::Advance(OrderStatus::Ready));
        assert_eq!(current(&machine), OrderStatus::Created);

        let mut machine = StatusFlow::start("ord-2", OrderStatus::Delivered);
        machine.handle(&StatusEvent::Advance(OrderStatus::Confirmed));
        assert_eq!(current(&machine), OrderStatus::Delivered);
    }

    #[test]
    fn test_terminal_states_only_accept_force() {
        let mut machine = StatusFlow::start("ord-1", OrderStatus::Cancelled);

        machine.handle(&StatusEvent::Advance(OrderStatus::Confirmed));
        assert_eq!(current(&machine), OrderStatus::Cancelled);

        machine.handle(&StatusEvent::Force(OrderStatus::Preparing));
        assert_eq!(current(&machine), OrderStatus::Preparing);
    }

    #[test]
    fn test_matches_transition_table() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let mut machine = StatusFlow::start("ord-t", from);
                machine.handle(&StatusEvent::Advance(to));
                let moved = current(&machine) == to && from != to;
                assert_eq!(moved, from.can_advance_to(to), "{from} -> {to}");
            }
        }
    }
}
