// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal named-callback fan-out primitive.
//!
//! `subscribe` appends a callback, `publish` invokes every registered
//! callback in registration order and awaits each one before moving to the
//! next, so a subscriber's reaction to one publish is guaranteed to
//! complete before the next publish on the same topic begins. No
//! back-pressure, no dedup, no removal.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;

/// A boxed, owned future, used as the return type of a type-erased async callback.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

type Callback<T> = Arc<dyn Fn(T) -> BoxFuture + Send + Sync>;

/// Fan-out point for a single logical event stream carrying values of type `T`.
pub struct PubSub<T> {
    subscribers: RwLock<Vec<(String, Callback<T>)>>,
}

impl<T> Default for PubSub<T> {
    fn default() -> Self {
        Self { subscribers: RwLock::new(Vec::new()) }
    }
}

impl<T> PubSub<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback to be called on every subsequent `publish`.
    pub async fn subscribe<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: Callback<T> = Arc::new(move |value| Box::pin(f(value)));
        self.subscribers.write().await.push((name.into(), boxed));
    }

    /// Call every registered subscriber in registration order, awaiting each
    /// in turn before invoking the next.
    pub async fn publish(&self, value: T) {
        // Snapshot under the lock, then release it before running callbacks so a
        // callback that subscribes or publishes elsewhere cannot deadlock on us.
        let subs: Vec<(String, Callback<T>)> = self.subscribers.read().await.clone();
        for (name, callback) in subs {
            tracing::debug!(subscriber = %name, "pubsub dispatch");
            callback(value.clone()).await;
        }
    }

    /// Number of registered subscribers, for tests.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn publishes_in_registration_order() {
        let bus: PubSub<i32> = PubSub::new();
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = Arc::clone(&order);
            bus.subscribe(format!("sub{id}"), move |v: i32| {
                let order = Arc::clone(&order);
                async move { order.lock().await.push((id, v)) }
            })
            .await;
        }

        bus.publish(7).await;
        let seen = order.lock().await.clone();
        assert_eq!(seen, vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_publish() {
        let bus: PubSub<bool> = PubSub::new();
        let hits = Arc::new(AtomicU32::new(0));
        let hits2 = Arc::clone(&hits);
        bus.subscribe("counter", move |_| {
            let hits2 = Arc::clone(&hits2);
            async move {
                hits2.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        bus.publish(true).await;
        bus.publish(false).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
