// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A segment of track. Pure state beyond the element base:
//! `occupied` from trackside, `locked` set and cleared by a [`crate::route::Route`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{bit, parse_bool, Wiring};

pub struct Track {
    pub name: Arc<str>,
    wiring: Wiring,
    occupied: AtomicBool,
    locked: AtomicBool,
}

impl Track {
    pub fn new(wiring: Wiring, name: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            occupied: AtomicBool::new(false),
            locked: AtomicBool::new(false),
        })
    }

    /// Tracks have no button-triggered behavior of their own (only a
    /// [`crate::route::Route`] locks/unlocks them), so unlike Turnout and
    /// Signal this does not subscribe to a button topic at all.
    pub async fn install(self: &Arc<Self>) {
        let track_topic = self.wiring.trackside_topic("track", &self.name);
        let this = Arc::clone(self);
        self.wiring
            .dispatcher
            .subscribe(track_topic, format!("Track<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.set_occupied(parse_bool(&payload)).await;
                }
            })
            .await;
    }

    fn topic(&self) -> String {
        self.wiring.panel_topic("track", &self.name)
    }

    async fn publish(&self) {
        let value = format!(
            "{},{}",
            bit(self.occupied.load(Ordering::SeqCst)),
            bit(self.locked.load(Ordering::SeqCst))
        );
        self.wiring.publish(self.topic(), value).await;
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::SeqCst)
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub async fn set_occupied(&self, occupied: bool) {
        self.occupied.store(occupied, Ordering::SeqCst);
        self.publish().await;
    }

    /// Set by a [`crate::route::Route`] while staging a path.
    pub async fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
        self.publish().await;
    }

    pub async fn reset(&self) {
        self.occupied.store(false, Ordering::SeqCst);
        self.locked.store(false, Ordering::SeqCst);
        self.publish().await;
    }
}
