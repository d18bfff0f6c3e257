// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The line block apparatus at the end of a block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{bit, parse_bool, resolve_topic, OuterButtons, Wiring};

pub struct BlockEnd {
    pub name: Arc<str>,
    wiring: Wiring,
    outer: OuterButtons,
    occupied: AtomicBool,
    blocked: AtomicBool,
    /// True until the train has physically cleared the block; forbids
    /// lowering `blocked` while set.
    clearance_lock: AtomicBool,
}

impl BlockEnd {
    pub fn new(wiring: Wiring, outer: OuterButtons, name: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            outer,
            occupied: AtomicBool::new(false),
            blocked: AtomicBool::new(false),
            clearance_lock: AtomicBool::new(true),
        })
    }

    /// `blockstart_topic` carries the opposite tower's block messages;
    /// `clearance_lock_release_topic` is the trackside segment just past
    /// the block signal. Both may be a bare channel name
    /// (resolved against the trackside topic prefix) or a full topic.
    pub async fn install(
        self: &Arc<Self>,
        blockstart_topic: &str,
        clearance_lock_release_topic: &str,
    ) {
        let this = Arc::clone(self);
        let button_topic = self.wiring.button_topic(&self.name);
        self.wiring
            .dispatcher
            .subscribe(button_topic, format!("BlockEnd<{}>", self.name), move |payload| {
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
            .subscribe(track_topic, format!("BlockEnd<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.set_occupied(parse_bool(&payload)).await;
                }
            })
            .await;

        let this = Arc::clone(self);
        let blockstart_topic = resolve_topic(&self.wiring, "block", blockstart_topic);
        self.wiring
            .dispatcher
            .subscribe(blockstart_topic, format!("BlockEnd<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.on_block_start(parse_bool(&payload)).await;
                }
            })
            .await;

        let this = Arc::clone(self);
        let release_topic = resolve_topic(&self.wiring, "track", clearance_lock_release_topic);
        self.wiring
            .dispatcher
            .subscribe(release_topic, format!("BlockEnd<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.on_clearance_lock_release(parse_bool(&payload)).await;
                }
            })
            .await;
    }

    fn topic(&self) -> String {
        self.wiring.panel_topic("blockend", &self.name)
    }

    async fn publish(&self) {
        let value = format!(
            "{},{},{}",
            bit(self.occupied.load(Ordering::SeqCst)),
            bit(self.blocked.load(Ordering::SeqCst)),
            bit(self.clearance_lock.load(Ordering::SeqCst)),
        );
        self.wiring.publish(self.topic(), value).await;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    pub fn clearance_lock(&self) -> bool {
        self.clearance_lock.load(Ordering::SeqCst)
    }

    async fn set_occupied(&self, occupied: bool) {
        self.occupied.store(occupied, Ordering::SeqCst);
        self.publish().await;
    }

    /// The opposite tower has locked the block.
    async fn on_block_start(&self, blocked: bool) {
        if blocked {
            self.blocked.store(true, Ordering::SeqCst);
            self.publish().await;
        }
    }

    /// Released once the train has physically left the segment past the
    /// block signal.
    async fn on_clearance_lock_release(&self, segment_occupied: bool) {
        if !segment_occupied && self.clearance_lock.load(Ordering::SeqCst) {
            self.clearance_lock.store(false, Ordering::SeqCst);
            self.publish().await;
        }
    }

    async fn on_button(&self, pushed: bool) {
        if pushed
            && self.outer.is_outer_button("BlGT").await
            && !self.clearance_lock.load(Ordering::SeqCst)
        {
            self.blocked.store(false, Ordering::SeqCst);
            self.clearance_lock.store(true, Ordering::SeqCst);
            self.publish().await;
        }
    }

    pub async fn reset(&self) {
        self.occupied.store(false, Ordering::SeqCst);
        self.blocked.store(false, Ordering::SeqCst);
        self.clearance_lock.store(true, Ordering::SeqCst);
        self.publish().await;
    }
}
