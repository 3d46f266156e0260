//! Grouping of classified events by client.

use std::collections::BTreeMap;

use chrono::Duration;

use crate::event::ClassifiedEvent;
use crate::registry::ClientRegistry;
use crate::types::ClientId;

/// Classified events per client, in input order.
///
/// Every registered client has an entry, even when it received no events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientEventMap {
    events: BTreeMap<ClientId, Vec<ClassifiedEvent>>,
}

impl ClientEventMap {
    /// Creates a map with an empty list for every client in the registry.
    pub fn for_registry(registry: &ClientRegistry) -> Self {
        let events = registry
            .iter()
            .map(|client| (client.clone(), Vec::new()))
            .collect();
        Self { events }
    }

    /// Appends an event to its client's list.
    pub fn push(&mut self, event: ClassifiedEvent) {
        self.events
            .entry(event.client.clone())
            .or_default()
            .push(event);
    }

    pub fn get(&self, client: &ClientId) -> Option<&[ClassifiedEvent]> {
        self.events.get(client).map(Vec::as_slice)
    }

    /// All clients with their events, in client name order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &[ClassifiedEvent])> {
        self.events
            .iter()
            .map(|(client, events)| (client, events.as_slice()))
    }

    /// Clients that received at least one event.
    pub fn non_empty(&self) -> impl Iterator<Item = (&ClientId, &[ClassifiedEvent])> {
        self.iter().filter(|(_, events)| !events.is_empty())
    }

    /// Number of clients tracked, including empty ones.
    pub fn client_count(&self) -> usize {
        self.events.len()
    }

    /// Total number of classified events across all clients.
    pub fn event_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    /// Sum of event durations for one client.
    pub fn total_duration(&self, client: &ClientId) -> Duration {
        self.get(client)
            .unwrap_or_default()
            .iter()
            .fold(Duration::zero(), |total, event| total + event.duration)
    }
}
