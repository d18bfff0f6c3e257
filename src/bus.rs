// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between the interlocking core and a message broker.
//!
//! The broker itself is an external collaborator — this crate never speaks
//! MQTT on the wire. `Bus` is the narrow trait the core publishes through;
//! the only implementation shipped is [`InProcessBus`], a loopback recorder
//! used by the demo binary and by tests. A real deployment plugs in an
//! adapter over an actual broker client without the core needing to change.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::pubsub::BoxFuture;

/// Publishes topic/payload pairs to a broker. Implementations must not block;
/// publishing is fire-and-forget from the caller's perspective.
///
/// Takes `self: Arc<Self>` rather than `&self` so implementations can move
/// their own handle into the returned future instead of borrowing it.
pub trait Bus: Send + Sync + 'static {
    fn publish(self: Arc<Self>, topic: String, payload: String) -> BoxFuture;
}

/// A broker-less loopback bus: publishes are recorded, never delivered
/// anywhere, matching the fact that the panel UI and trackside hardware
/// that would consume these messages are themselves out of scope.
#[derive(Default)]
pub struct InProcessBus {
    published: RwLock<Vec<(String, String)>>,
}

impl InProcessBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All messages published so far, oldest first. Intended for test assertions.
    pub async fn published(&self) -> Vec<(String, String)> {
        self.published.read().await.clone()
    }

    /// The most recent payload published to `topic`, if any.
    pub async fn last(&self, topic: &str) -> Option<String> {
        self.published.read().await.iter().rev().find(|(t, _)| t == topic).map(|(_, v)| v.clone())
    }
}

impl Bus for InProcessBus {
    fn publish(self: Arc<Self>, topic: String, payload: String) -> BoxFuture {
        Box::pin(async move {
            tracing::debug!(%topic, %payload, "publish");
            self.published.write().await.push((topic, payload));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_publishes_in_order() {
        let bus = InProcessBus::default();
        bus.published.write().await.push(("a".into(), "1".into()));
        bus.published.write().await.push(("b".into(), "2".into()));
        assert_eq!(
            bus.published().await,
            vec![("a".to_owned(), "1".to_owned()), ("b".to_owned(), "2".to_owned())]
        );
        assert_eq!(bus.last("a").await, Some("1".to_owned()));
    }
}
