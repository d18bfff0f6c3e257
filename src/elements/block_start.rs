// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The line block apparatus at the beginning of a block.
//! Locked while the train occupies the segment just past the start
//! signal, unlocked once the remote block end reports clear.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{bit, parse_bool, resolve_topic, Wiring};

pub struct BlockStart {
    pub name: Arc<str>,
    wiring: Wiring,
    occupied: AtomicBool,
    blocked: AtomicBool,
}

impl BlockStart {
    pub fn new(wiring: Wiring, name: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            occupied: AtomicBool::new(false),
            blocked: AtomicBool::new(false),
        })
    }

    /// `blockend_topic` is the remote end's unblock message;
    /// `blocking_track_topic` is the local track segment just past the
    /// start signal. Either may be a bare channel name.
    pub async fn install(self: &Arc<Self>, blockend_topic: &str, blocking_track_topic: &str) {
        let this = Arc::clone(self);
        let track_topic = self.wiring.trackside_topic("track", &self.name);
        self.wiring
            .dispatcher
            .subscribe(track_topic, format!("BlockStart<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.set_occupied(parse_bool(&payload)).await;
                }
            })
            .await;

        let this = Arc::clone(self);
        let blockend_topic = resolve_topic(&self.wiring, "block", blockend_topic);
        self.wiring
            .dispatcher
            .subscribe(blockend_topic, format!("BlockStart<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.on_blockend(parse_bool(&payload)).await;
                }
            })
            .await;

        let this = Arc::clone(self);
        let blocking_track_topic =
            resolve_topic(&self.wiring, "track", blocking_track_topic);
        self.wiring
            .dispatcher
            .subscribe(
                blocking_track_topic,
                format!("BlockStart<{}>", self.name),
                move |payload| {
                    let this = Arc::clone(&this);
                    async move {
                        this.on_blocking_track(parse_bool(&payload)).await;
                    }
                },
            )
            .await;
    }

    fn topic(&self) -> String {
        self.wiring.panel_topic("blockstart", &self.name)
    }

    async fn publish(&self) {
        let value = format!(
            "{},{}",
            bit(self.occupied.load(Ordering::SeqCst)),
            bit(self.blocked.load(Ordering::SeqCst)),
        );
        self.wiring.publish(self.topic(), value).await;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    async fn set_occupied(&self, occupied: bool) {
        self.occupied.store(occupied, Ordering::SeqCst);
        self.publish().await;
    }

    /// The remote block end has unblocked.
    async fn on_blockend(&self, blocked: bool) {
        if !blocked {
            self.blocked.store(false, Ordering::SeqCst);
            self.publish().await;
        }
    }

    /// The track just past the start signal has gone from occupied to clear.
    async fn on_blocking_track(&self, segment_occupied: bool) {
        if !segment_occupied {
            self.blocked.store(true, Ordering::SeqCst);
            self.publish().await;
        }
    }

    pub async fn reset(&self) {
        self.occupied.store(false, Ordering::SeqCst);
        self.blocked.store(false, Ordering::SeqCst);
        self.publish().await;
    }
}
