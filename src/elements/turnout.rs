// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A movable track element. Motion is eager-commit: the target `position`
//! and `moving=true` are published immediately, and only `moving` clears
//! after `moving_delay` — mirroring relay behavior where the command
//! latches before the points physically finish moving. A production
//! variant would instead wait for a trackside position confirmation
//! message before committing; this is the documented extension point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::{bit, parse_bool, OuterButtons, Wiring};

pub struct Turnout {
    pub name: Arc<str>,
    wiring: Wiring,
    outer: OuterButtons,
    occupied: AtomicBool,
    position: AtomicBool,
    moving: AtomicBool,
    locked: AtomicBool,
    blocked: AtomicBool,
    moving_delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Default delay between a commanded position change and `moving` clearing.
pub const DEFAULT_MOVING_DELAY: Duration = Duration::from_secs(6);

impl Turnout {
    pub fn new(wiring: Wiring, outer: OuterButtons, name: impl Into<Arc<str>>) -> Arc<Self> {
        Self::with_moving_delay(wiring, outer, name, DEFAULT_MOVING_DELAY)
    }

    pub fn with_moving_delay(
        wiring: Wiring,
        outer: OuterButtons,
        name: impl Into<Arc<str>>,
        moving_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            outer,
            occupied: AtomicBool::new(false),
            position: AtomicBool::new(false),
            moving: AtomicBool::new(false),
            locked: AtomicBool::new(false),
            blocked: AtomicBool::new(false),
            moving_delay,
            pending: Mutex::new(None),
        })
    }

    pub async fn install(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let button_topic = self.wiring.button_topic(&self.name);
        self.wiring
            .dispatcher
            .subscribe(button_topic, format!("Turnout<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.on_button(parse_bool(&payload)).await;
                }
            })
            .await;

        let this = Arc::clone(self);
        let track_topic = self.wiring.trackside_topic("track", &self.name);
        self.wiring
            .dispatcher
            .subscribe(track_topic, format!("Turnout<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.set_occupied(parse_bool(&payload)).await;
                }
            })
            .await;
    }

    fn topic(&self) -> String {
        self.wiring.panel_topic("turnout", &self.name)
    }

    async fn publish(&self) {
        let value = format!(
            "{},{},{},{},{}",
            bit(self.occupied.load(Ordering::SeqCst)),
            bit(self.position.load(Ordering::SeqCst)),
            bit(self.moving.load(Ordering::SeqCst)),
            bit(self.locked.load(Ordering::SeqCst)),
            bit(self.blocked.load(Ordering::SeqCst)),
        );
        self.wiring.publish(self.topic(), value).await;
    }

    pub fn position(&self) -> bool {
        self.position.load(Ordering::SeqCst)
    }

    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::SeqCst)
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::SeqCst)
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    pub async fn set_occupied(&self, occupied: bool) {
        self.occupied.store(occupied, Ordering::SeqCst);
        self.publish().await;
    }

    /// Set (and publish) by a [`crate::route::Route`] while staging or
    /// tearing down a path. Bypasses the panel gating of `on_button`.
    pub async fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
        self.publish().await;
    }

    async fn on_button(self: &Arc<Self>, pushed: bool) {
        if pushed
            && self.outer.is_outer_button("WGT").await
            && !self.locked.load(Ordering::SeqCst)
            && !self.blocked.load(Ordering::SeqCst)
            && !self.occupied.load(Ordering::SeqCst)
        {
            self.start_change(None).await;
        }
    }

    /// Start a commanded move. `position = None` means "toggle": target the
    /// negation of the current position. Cancels any
    /// in-flight change first, then returns a receiver that resolves once
    /// the new change (not a cancelled one) has fully committed — a
    /// [`crate::route::Route`] awaits several of these together.
    pub async fn start_change(self: &Arc<Self>, position: Option<bool>) -> oneshot::Receiver<()> {
        let target = position.unwrap_or(!self.position.load(Ordering::SeqCst));
        let mut pending = self.pending.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let (done_tx, done_rx) = oneshot::channel();
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.change(target).await;
            let _ = done_tx.send(());
        });
        *pending = Some(handle);
        done_rx
    }

    async fn change(&self, target: bool) {
        if target == self.position.load(Ordering::SeqCst) {
            return;
        }
        self.position.store(target, Ordering::SeqCst);
        self.moving.store(true, Ordering::SeqCst);
        self.publish().await;

        tokio::time::sleep(self.moving_delay).await;

        self.moving.store(false, Ordering::SeqCst);
        self.publish().await;
    }

    pub async fn reset(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
        self.occupied.store(false, Ordering::SeqCst);
        self.position.store(false, Ordering::SeqCst);
        self.moving.store(false, Ordering::SeqCst);
        self.locked.store(false, Ordering::SeqCst);
        self.blocked.store(false, Ordering::SeqCst);
        self.publish().await;
    }
}
