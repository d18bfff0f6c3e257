// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sets a safe path from an entrance signal to a destination signal.
//! Coordinates across turnouts, flank protections, and tracks that the
//! chord recognizer and the block apparatus never touch directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::elements::signal::{Aspect, Signal};
use crate::elements::track::Track;
use crate::elements::turnout::Turnout;
use crate::elements::{parse_bool, resolve_topic, Wiring};

/// An entry in a route's track list: either a plain [`Track`] or the body
/// of a [`Turnout`] that also appears in `turnouts` — a turnout's own body
/// is part of the route's track section, not just its switching.
#[derive(Clone)]
pub enum RouteTrack {
    Track(Arc<Track>),
    Turnout(Arc<Turnout>),
}

impl RouteTrack {
    fn is_occupied(&self) -> bool {
        match self {
            Self::Track(t) => t.is_occupied(),
            Self::Turnout(t) => t.is_occupied(),
        }
    }

    async fn set_locked(&self, locked: bool) {
        match self {
            Self::Track(t) => t.set_locked(locked).await,
            Self::Turnout(t) => t.set_locked(locked).await,
        }
    }
}

/// Default delay between staged publishes within `change()`.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(200);

pub struct Route {
    pub name: String,
    wiring: Wiring,
    s1: Arc<Signal>,
    s2: Arc<Signal>,
    turnouts: RwLock<Vec<(Arc<Turnout>, bool)>>,
    flank_protections: RwLock<Vec<(Arc<Turnout>, bool)>>,
    tracks: RwLock<Vec<RouteTrack>>,
    locked: AtomicBool,
    step_delay: Duration,
}

impl Route {
    /// `{s1.name},{s2.name}`.
    pub fn name_for(s1: &Signal, s2: &Signal) -> String {
        format!("{},{}", s1.name, s2.name)
    }

    pub fn new(wiring: Wiring, s1: Arc<Signal>, s2: Arc<Signal>) -> Arc<Self> {
        Self::with_step_delay(wiring, s1, s2, DEFAULT_STEP_DELAY)
    }

    pub fn with_step_delay(
        wiring: Wiring,
        s1: Arc<Signal>,
        s2: Arc<Signal>,
        step_delay: Duration,
    ) -> Arc<Self> {
        let name = Self::name_for(&s1, &s2);
        Arc::new(Self {
            name,
            wiring,
            s1,
            s2,
            turnouts: RwLock::new(Vec::new()),
            flank_protections: RwLock::new(Vec::new()),
            tracks: RwLock::new(Vec::new()),
            locked: AtomicBool::new(false),
            step_delay,
        })
    }

    /// Subscribe to a trackside topic whose `0` edge (segment just cleared)
    /// unlocks this route. Optional: the bundled demo topology never wires
    /// one, so it is an extra wiring step rather than a required field.
    pub async fn install_release(self: &Arc<Self>, release_topic: &str) {
        let this = Arc::clone(self);
        let topic = resolve_topic(&self.wiring, "track", release_topic);
        self.wiring
            .dispatcher
            .subscribe(topic, format!("Route<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    if !parse_bool(&payload) {
                        this.unlock().await;
                    }
                }
            })
            .await;
    }

    pub fn entrance_name(&self) -> &str {
        &self.s1.name
    }

    pub fn destination_name(&self) -> &str {
        &self.s2.name
    }

    pub async fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// A turnout's body counts as both a `(turnout, position)` entry to
    /// move/lock and a track entry to prove/lock.
    pub async fn add_turnout(self: &Arc<Self>, turnout: Arc<Turnout>, position: bool) -> Arc<Self> {
        self.turnouts.write().await.push((Arc::clone(&turnout), position));
        self.tracks.write().await.push(RouteTrack::Turnout(turnout));
        Arc::clone(self)
    }

    pub async fn add_flank_protection(
        self: &Arc<Self>,
        turnout: Arc<Turnout>,
        position: bool,
    ) -> Arc<Self> {
        self.flank_protections.write().await.push((turnout, position));
        Arc::clone(self)
    }

    pub async fn add_track(self: &Arc<Self>, track: Arc<Track>) -> Arc<Self> {
        self.tracks.write().await.push(RouteTrack::Track(track));
        Arc::clone(self)
    }

    /// Spawn `change()` in the background and return immediately. Not
    /// cancellable by design: once started it runs to a terminal state.
    pub fn start(self: &Arc<Self>) {
        tracing::debug!(route = %self.name, "started");
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.change().await;
        });
    }

    async fn all_turnouts(&self) -> Vec<(Arc<Turnout>, bool)> {
        let mut all = self.turnouts.read().await.clone();
        all.extend(self.flank_protections.read().await.iter().cloned());
        all
    }

    /// Runs the full prove -> move -> re-prove -> lock-turnouts ->
    /// prove-tracks -> lock-tracks -> clear-signal pipeline. Aborts are
    /// silent: any lock already committed in this attempt stays set —
    /// releasing it is left to an explicit unlock.
    async fn change(self: &Arc<Self>) {
        let turnouts = self.all_turnouts().await;

        for (turnout, _position) in &turnouts {
            if turnout.is_locked() {
                tracing::debug!(route = %self.name, turnout = %turnout.name, "already locked, aborting");
                return;
            }
            if turnout.is_occupied() {
                tracing::debug!(route = %self.name, turnout = %turnout.name, "occupied, aborting");
                return;
            }
        }

        let mut pending = Vec::with_capacity(turnouts.len());
        for (turnout, position) in &turnouts {
            pending.push(turnout.start_change(Some(*position)).await);
            tokio::time::sleep(self.step_delay).await;
        }
        futures_util::future::join_all(pending).await;

        for (turnout, _position) in &turnouts {
            if turnout.is_occupied() {
                tracing::debug!(route = %self.name, turnout = %turnout.name, "occupied after move, aborting");
                return;
            }
        }

        for (turnout, _position) in &turnouts {
            turnout.set_locked(true).await;
            tokio::time::sleep(self.step_delay).await;
        }

        let tracks = self.tracks.read().await.clone();
        for track in &tracks {
            if track.is_occupied() {
                tracing::debug!(route = %self.name, "a track is occupied, aborting");
                return;
            }
        }
        for track in &tracks {
            track.set_locked(true).await;
            tokio::time::sleep(self.step_delay).await;
        }

        self.s1.start_home(Aspect::Hp1).await;
        self.locked.store(true, Ordering::SeqCst);
    }

    /// Drop the entrance signal to Hp0 and release every lock this route
    /// holds. Triggered by the FHT chord (via `Signal`) or
    /// by a `0` edge on `release_topic`.
    pub async fn unlock(&self) {
        self.s1.start_home(Aspect::Hp0).await;
        for (turnout, _position) in self.turnouts.read().await.iter() {
            turnout.set_locked(false).await;
        }
        for (turnout, _position) in self.flank_protections.read().await.iter() {
            turnout.set_locked(false).await;
        }
        for track in self.tracks.read().await.iter() {
            track.set_locked(false).await;
        }
        self.locked.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Route<{}>", self.name)
    }
}
