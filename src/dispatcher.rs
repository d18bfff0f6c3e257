// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan messages in from the broker, out to per-topic subscribers.
//!
//! `subscribe` installs a [`PubSub`] per topic on first use; `dispatch_one`
//! is the synchronous (well, `async fn`, but independent of any running
//! receive loop) entry point used directly by tests and by elements
//! injecting trackside/panel messages; `dispatch` drains an incoming
//! channel until told to stop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::bus::Bus;
use crate::pubsub::PubSub;

/// One incoming (topic, payload) message, as would arrive off the wire.
pub type Message = (String, String);

/// Subscribes per-topic callbacks and dispatches incoming messages to them.
pub struct Dispatcher {
    subscribers: RwLock<HashMap<String, Arc<PubSub<String>>>>,
    bus: Arc<dyn Bus>,
}

impl Dispatcher {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { subscribers: RwLock::new(HashMap::new()), bus }
    }

    /// Subscribe a callback function to a topic, installing a [`PubSub`] for
    /// that topic on first use.
    pub async fn subscribe<F, Fut>(&self, topic: impl Into<String>, name: impl Into<String>, f: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let topic = topic.into();
        let pubsub = {
            let mut subs = self.subscribers.write().await;
            Arc::clone(subs.entry(topic).or_insert_with(|| Arc::new(PubSub::new())))
        };
        pubsub.subscribe(name, f).await;
    }

    /// Dispatch one message to all subscribers of its topic. A no-op if no
    /// one has subscribed to that exact topic; unknown topics fall through
    /// silently (§7).
    pub async fn dispatch_one(&self, topic: &str, payload: impl Into<String>) {
        let pubsub = self.subscribers.read().await.get(topic).cloned();
        if let Some(pubsub) = pubsub {
            pubsub.publish(payload.into()).await;
        }
    }

    /// Publish a message to the broker. Fire-and-forget: the caller does not
    /// wait for broker acknowledgment.
    pub async fn publish(&self, topic: impl Into<String>, payload: impl Into<String>) {
        Arc::clone(&self.bus).publish(topic.into(), payload.into()).await;
    }

    /// The set of topics anyone has subscribed to so far, used to perform the
    /// bulk subscribe-to-broker handshake at startup (QoS 2, per §4.1/§6).
    pub async fn topics(&self) -> Vec<String> {
        self.subscribers.read().await.keys().cloned().collect()
    }

    /// Drain `incoming` until the channel closes, dispatching every message
    /// as it arrives. Used by a real broker-backed deployment; demos and
    /// tests call [`Dispatcher::dispatch_one`] directly instead.
    pub async fn dispatch(&self, mut incoming: mpsc::UnboundedReceiver<Message>) {
        let topics = self.topics().await;
        tracing::info!(?topics, "subscribing to broker (QoS 2)");
        while let Some((topic, payload)) = incoming.recv().await {
            self.dispatch_one(&topic, payload).await;
        }
    }
}
