//! Per-connection subscription manager.
//!
//! Tracks which topics a WebSocket client is subscribed to and filters
//! events server-side. A connection only ever sees events of the user it
//! was opened for.

use std::collections::HashSet;

use crate::domain::{EventTopic, RewardsEvent, UserId};

/// Manages the topic subscriptions of a single WebSocket connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    owner: UserId,
    /// Subscribed topics. If `subscribe_all` is true, this set is ignored.
    topics: HashSet<EventTopic>,
    /// Whether the client subscribes to every topic (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates an empty subscription set for `owner`.
    #[must_use]
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            topics: HashSet::new(),
            subscribe_all: false,
        }
    }

    /// Adds topics by name. `"*"` enables the wildcard. Returns the names
    /// that were not recognized.
    pub fn subscribe(&mut self, names: &[String]) -> Vec<String> {
        let mut unknown = Vec::new();
        for name in names {
            if name == "*" {
                self.subscribe_all = true;
            } else if let Some(topic) = EventTopic::parse(name) {
                self.topics.insert(topic);
            } else {
                unknown.push(name.clone());
            }
        }
        unknown
    }

    /// Removes topics by name. `"*"` clears the wildcard.
    pub fn unsubscribe(&mut self, names: &[String]) {
        for name in names {
            if name == "*" {
                self.subscribe_all = false;
            } else if let Some(topic) = EventTopic::parse(name) {
                self.topics.remove(&topic);
            }
        }
    }

    /// Returns `true` if the event belongs to the owner and to a subscribed
    /// topic.
    #[must_use]
    pub fn matches(&self, event: &RewardsEvent) -> bool {
        event.user_id() == self.owner
            && (self.subscribe_all || self.topics.contains(&event.topic()))
    }

    /// Returns the number of explicitly subscribed topics.
    #[must_use]
    pub fn count(&self) -> usize {
        self.topics.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
