// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The function buttons used in chord with element buttons. An outer
//! button has no panel feedback of its own — `publish` is
//! a no-op and `update` always fails, because the only state that matters
//! is `pushed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::counter::Counter;
use super::{parse_bool, Wiring};
use crate::error::TowerError;

pub struct OuterButton {
    pub name: Arc<str>,
    wiring: Wiring,
    pushed: AtomicBool,
    counter: RwLock<Option<Arc<Counter>>>,
}

impl OuterButton {
    pub fn new(wiring: Wiring, name: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            pushed: AtomicBool::new(false),
            counter: RwLock::new(None),
        })
    }

    /// Subscribe `self` to its panel button topic. Split from `new` so the
    /// callback can hold a strong `Arc` to this element without resorting
    /// to `Arc::new_cyclic`.
    pub async fn install(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let topic = self.wiring.button_topic(&self.name);
        self.wiring
            .dispatcher
            .subscribe(topic, format!("OuterButton<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.pushed.store(parse_bool(&payload), Ordering::SeqCst);
                }
            })
            .await;
    }

    pub async fn is_pushed(&self) -> bool {
        self.pushed.load(Ordering::SeqCst)
    }

    /// Attach a counter bound to this button's own name, returning the
    /// same instance so a [`crate::tower::Tower`] can register it in its
    /// own registry too — counters are addressable panel elements, not
    /// just an internal detail of the button that drives them.
    pub async fn add_counter(self: &Arc<Self>) -> Arc<Counter> {
        let counter = Counter::new(self.wiring.clone(), Arc::clone(&self.name));
        *self.counter.write().await = Some(Arc::clone(&counter));
        counter
    }

    /// Increment the attached counter, if any.
    pub async fn count(&self) {
        if let Some(counter) = self.counter.read().await.as_ref() {
            counter.increment().await;
        }
    }

    /// Outer buttons never publish panel feedback.
    pub async fn publish(&self) {}

    /// Outer buttons have no updatable properties.
    pub fn update(&self) -> Result<(), TowerError> {
        Err(TowerError::NotUpdatable { kind: "outerbutton", name: self.name.to_string() })
    }

    pub async fn reset(&self) {
        self.pushed.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessBus;
    use crate::dispatcher::Dispatcher;

    fn wiring() -> Wiring {
        Wiring {
            dispatcher: Arc::new(Dispatcher::new(InProcessBus::new())),
            station: Arc::from("t"),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    #[tokio::test]
    async fn on_button_sets_pushed() {
        let w = wiring();
        let dispatcher = Arc::clone(&w.dispatcher);
        let button = OuterButton::new(w, "WGT");
        button.install().await;

        dispatcher.dispatch_one("frischen/t/panel/button/WGT", "1").await;
        assert!(button.is_pushed().await);

        dispatcher.dispatch_one("frischen/t/panel/button/WGT", "0").await;
        assert!(!button.is_pushed().await);
    }

    #[tokio::test]
    async fn update_always_fails() {
        let button = OuterButton::new(wiring(), "BlGT");
        assert!(button.update().is_err());
    }

    #[tokio::test]
    async fn counter_starts_absent() {
        let button = OuterButton::new(wiring(), "SGT");
        button.count().await; // no-op, no counter attached
    }
}
