//! Topic-based event bus implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{BrainEvent, MovementEvent, SkillEvent};

/// Topics for event routing
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    /// Decision loop mode and target changes
    Brain,
    /// Movement task lifecycle
    Movement,
    /// Autouse registrations and casts
    Skills,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Brain(BrainEvent),
    Movement(MovementEvent),
    Skills(SkillEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Brain(_) => Topic::Brain,
            Event::Movement(_) => Topic::Movement,
            Event::Skills(_) => Topic::Skills,
        }
    }
}

impl From<BrainEvent> for Event {
    fn from(event: BrainEvent) -> Self {
        Event::Brain(event)
    }
}

impl From<MovementEvent> for Event {
    fn from(event: MovementEvent) -> Self {
        Event::Movement(event)
    }
}

impl From<SkillEvent> for Event {
    fn from(event: SkillEvent) -> Self {
        Event::Skills(event)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never fails: with no subscriber the
/// event is dropped.
#[derive(Clone)]
pub struct EventBus {
    brain: broadcast::Sender<Event>,
    movement: broadcast::Sender<Event>,
    skills: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            brain: broadcast::channel(capacity).0,
            movement: broadcast::channel(capacity).0,
            skills: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Brain => &self.brain,
            Topic::Movement => &self.movement,
            Topic::Skills => &self.skills,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();
        if self.channel(topic).send(event).is_err() {
            tracing::trace!(%topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::new();
        let mut brain = bus.subscribe(Topic::Brain);
        let mut skills = bus.subscribe(Topic::Skills);

        bus.publish(BrainEvent::Resumed);

        assert_eq!(brain.recv().await.ok(), Some(Event::Brain(BrainEvent::Resumed)));
        assert!(skills.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::with_capacity(4);
        bus.publish(BrainEvent::Resumed);
    }

    #[test]
    fn subscribe_multiple_covers_every_topic() {
        let bus = EventBus::default();
        let topics: Vec<Topic> = Topic::iter().collect();
        let receivers = bus.subscribe_multiple(&topics);
        assert_eq!(receivers.len(), 3);
        assert_eq!(Topic::Movement.to_string(), "movement");
    }
}
