//! Append-only world event stream.
//!
//! Every state change produces an immutable event. Total order is
//! `(tick ascending, insertion sequence ascending)`; the sequence number
//! is assigned on append. Events are the replay record for the frontend
//! and the god loop's window into recent history.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use genesis_types::{EntityId, Event, EventId, EventResult, EventType, Vec3};

/// The append-only event store.
#[derive(Debug, Default)]
pub struct EventLog {
    events: RwLock<Vec<Event>>,
    next_seq: AtomicU64,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assigning its insertion sequence number.
    ///
    /// Returns the stored event. Appends never fail; the log is the one
    /// place failures elsewhere are still recorded.
    pub fn append(&self, mut event: Event) -> Event {
        event.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events.push(event.clone());
        event
    }

    /// Build and append an event in one call.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        tick: u64,
        actor: EntityId,
        event_type: EventType,
        action: &str,
        params: serde_json::Value,
        result: EventResult,
        reason: &str,
        position: Vec3,
        importance: f64,
    ) -> Event {
        self.append(Event {
            id: EventId::new(),
            tick,
            seq: 0,
            actor,
            event_type,
            action: action.to_owned(),
            params,
            result,
            reason: reason.to_owned(),
            position,
            importance,
        })
    }

    /// The most recent `limit` events in `(tick, seq)` order.
    pub fn recent(&self, limit: usize) -> Vec<Event> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let start = events.len().saturating_sub(limit);
        events.get(start..).map(<[Event]>::to_vec).unwrap_or_default()
    }

    /// Events with `from_tick <= tick <= to_tick`.
    pub fn in_range(&self, from_tick: u64, to_tick: u64) -> Vec<Event> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events
            .iter()
            .filter(|e| e.tick >= from_tick && e.tick <= to_tick)
            .cloned()
            .collect()
    }

    /// The most recent `limit` events of one type.
    pub fn by_type(&self, event_type: EventType, limit: usize) -> Vec<Event> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<Event> = events
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        let start = matched.len().saturating_sub(limit);
        matched.drain(..start);
        matched
    }

    /// The most recent `limit` events caused by one actor.
    pub fn by_actor(&self, actor: EntityId, limit: usize) -> Vec<Event> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<Event> = events
            .iter()
            .filter(|e| e.actor == actor)
            .cloned()
            .collect();
        let start = matched.len().saturating_sub(limit);
        matched.drain(..start);
        matched
    }

    /// Total number of events in the log.
    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genesis_types::EventResult;

    fn record_simple(log: &EventLog, tick: u64, actor: EntityId) -> Event {
        log.record(
            tick,
            actor,
            EventType::Action,
            "observe",
            serde_json::json!({}),
            EventResult::Accepted,
            "test",
            Vec3::default(),
            0.3,
        )
    }

    #[test]
    fn append_assigns_monotonic_seq() {
        let log = EventLog::new();
        let actor = EntityId::new();
        let a = record_simple(&log, 1, actor);
        let b = record_simple(&log, 1, actor);
        let c = record_simple(&log, 2, actor);
        assert!(a.seq < b.seq);
        assert!(b.seq < c.seq);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let log = EventLog::new();
        let actor = EntityId::new();
        for tick in 0..10 {
            record_simple(&log, tick, actor);
        }
        let tail = log.recent(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.first().map(|e| e.tick), Some(7));
        assert_eq!(tail.last().map(|e| e.tick), Some(9));
    }

    #[test]
    fn range_and_type_queries() {
        let log = EventLog::new();
        let actor = EntityId::new();
        record_simple(&log, 5, actor);
        record_simple(&log, 15, actor);
        log.record(
            20,
            actor,
            EventType::Speech,
            "speak",
            serde_json::json!({"text": "hello"}),
            EventResult::Accepted,
            "social",
            Vec3::default(),
            0.3,
        );

        assert_eq!(log.in_range(0, 10).len(), 1);
        assert_eq!(log.in_range(5, 20).len(), 3);
        assert_eq!(log.by_type(EventType::Speech, 10).len(), 1);
        assert_eq!(log.by_actor(actor, 2).len(), 2);
    }
}
