//! Topic-based event bus implementation.

use std::collections::HashMap;

use game_core::Notice;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{RewardEvent, RunEvent, WalletEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Wallet connection, network and balance
    Wallet,
    /// Stake, countdown, obstacles and run conclusion
    Run,
    /// Reward settlement
    Reward,
    /// Player-facing status lines
    Notice,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Wallet(WalletEvent),
    Run(RunEvent),
    Reward(RewardEvent),
    Notice(Notice),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Wallet(_) => Topic::Wallet,
            Event::Run(_) => Topic::Run,
            Event::Reward(_) => Topic::Reward,
            Event::Notice(_) => Topic::Notice,
        }
    }
}

/// Topic-based event bus
///
/// Each topic owns a broadcast channel created up front, so publishing and
/// subscribing never wait on a lock. Lagging subscribers lose the oldest
/// events of their topic only.
#[derive(Clone)]
pub struct EventBus {
    wallet: broadcast::Sender<Event>,
    run: broadcast::Sender<Event>,
    reward: broadcast::Sender<Event>,
    notice: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            wallet: broadcast::channel(capacity).0,
            run: broadcast::channel(capacity).0,
            reward: broadcast::channel(capacity).0,
            notice: broadcast::channel(capacity).0,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    pub fn notice(&self, notice: Notice) {
        tracing::debug!(%notice, "notice");
        self.publish(Event::Notice(notice));
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
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

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Wallet => &self.wallet,
            Topic::Run => &self.run,
            Topic::Reward => &self.reward,
            Topic::Notice => &self.notice,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut run_rx = bus.subscribe(Topic::Run);
        let mut notice_rx = bus.subscribe(Topic::Notice);

        bus.notice(Notice::RunLost);
        bus.publish(Event::Run(RunEvent::Started));

        assert_eq!(run_rx.recv().await.unwrap(), Event::Run(RunEvent::Started));
        assert_eq!(
            notice_rx.recv().await.unwrap(),
            Event::Notice(Notice::RunLost)
        );
        assert!(run_rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::with_capacity(4);
        bus.publish(Event::Wallet(WalletEvent::Disconnected));
    }
}
