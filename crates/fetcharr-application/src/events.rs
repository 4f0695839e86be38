// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::{Arc, Mutex};

use fetcharr_domain::DomainEvent;
use serde::Serialize;
use tracing::debug;

/// Event publisher abstraction
pub trait EventPublisher: Send + Sync {
    fn publish<T>(&self, event: &DomainEvent<T>)
    where
        T: Serialize + Send + Sync + 'static;
}

/// One captured event with its payload already serialized.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub name: &'static str,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub payload: serde_json::Value,
}

/// A minimal in-memory event bus. The host process drains it into whatever
/// notification fan-out it runs; tests assert directly against the captured
/// events.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    inner: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("event bus lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all captured events, in publish order.
    pub fn names(&self) -> Vec<&'static str> {
        self.inner
            .lock()
            .expect("event bus lock poisoned")
            .iter()
            .map(|event| event.name)
            .collect()
    }

    /// Retrieve and clear all captured events
    pub fn drain(&self) -> Vec<CapturedEvent> {
        let mut guard = self.inner.lock().expect("event bus lock poisoned");
        std::mem::take(&mut *guard)
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish<T>(&self, event: &DomainEvent<T>)
    where
        T: Serialize + Send + Sync + 'static,
    {
        let payload = serde_json::to_value(&event.payload).unwrap_or_default();
        debug!(target: "events", name = event.name, "publishing event");

        self.inner
            .lock()
            .expect("event bus lock poisoned")
            .push(CapturedEvent {
                name: event.name,
                occurred_at: event.occurred_at,
                payload,
            });
    }
}
