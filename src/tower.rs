// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns every element registry for one station and drives the run loop.
//! Construction wires the fixed set of outer buttons; everything else is
//! added through the `add_*`/lookup methods below, which a topology
//! builder (see [`crate::topology`]) calls to assemble a station.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::bus::Bus;
use crate::dispatcher::{Dispatcher, Message};
use crate::elements::block_end::BlockEnd;
use crate::elements::block_start::BlockStart;
use crate::elements::counter::Counter;
use crate::elements::distant_signal::DistantSignal;
use crate::elements::outer_button::OuterButton;
use crate::elements::signal::Signal;
use crate::elements::track::Track;
use crate::elements::turnout::Turnout;
use crate::elements::{ElementManager, OuterButtons, Wiring, OUTER_BUTTONS_WITH_COUNTER, OUTER_BUTTON_NAMES};
use crate::error::{Result, TowerError};
use crate::route::Route;

/// Per-element timing overrides a topology builder may want to shorten
/// for tests (defaults: 6s turnout motion, 15s Zs1 alt, 0.2s route
/// staging).
#[derive(Clone, Copy)]
pub struct Timing {
    pub turnout_moving_delay: Duration,
    pub signal_alt_delay: Duration,
    pub route_step_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            turnout_moving_delay: crate::elements::turnout::DEFAULT_MOVING_DELAY,
            signal_alt_delay: crate::elements::signal::DEFAULT_ALT_DELAY,
            route_step_delay: crate::route::DEFAULT_STEP_DELAY,
        }
    }
}

pub struct Tower {
    pub name: Arc<str>,
    wiring: Wiring,
    dispatcher: Arc<Dispatcher>,
    connected: Arc<AtomicBool>,
    timing: Timing,
    outer: OuterButtons,
    outer_list: Vec<Arc<OuterButton>>,
    block_ends: ElementManager<BlockEnd>,
    block_starts: ElementManager<BlockStart>,
    counters: ElementManager<Counter>,
    turnouts: ElementManager<Turnout>,
    tracks: ElementManager<Track>,
    signals: ElementManager<Signal>,
    distant_signals: ElementManager<DistantSignal>,
    routes: ElementManager<Route>,
}

impl Tower {
    pub async fn new(name: impl Into<Arc<str>>, bus: Arc<dyn Bus>) -> Arc<Self> {
        Self::with_timing(name, bus, Timing::default()).await
    }

    pub async fn with_timing(name: impl Into<Arc<str>>, bus: Arc<dyn Bus>, timing: Timing) -> Arc<Self> {
        let connected = Arc::new(AtomicBool::new(false));
        let dispatcher = Arc::new(Dispatcher::new(bus));
        let wiring = Wiring { dispatcher: Arc::clone(&dispatcher), station: name.into(), connected: Arc::clone(&connected) };

        let counters: ElementManager<Counter> = ElementManager::new();
        let mut outer_map = std::collections::HashMap::new();
        let mut outer_list = Vec::with_capacity(OUTER_BUTTON_NAMES.len());
        for name in OUTER_BUTTON_NAMES {
            let button = OuterButton::new(wiring.clone(), name);
            button.install().await;
            if OUTER_BUTTONS_WITH_COUNTER.contains(&name) {
                let counter = button.add_counter().await;
                if let Err(e) = counters.register("counter", name, counter).await {
                    tracing::warn!(button = name, error = %e, "outer button counter already registered");
                }
            }
            outer_list.push(Arc::clone(&button));
            outer_map.insert(name, button);
        }
        let outer = OuterButtons::new(outer_map);

        Arc::new(Self {
            name: Arc::clone(&wiring.station),
            wiring,
            dispatcher,
            connected,
            timing,
            outer,
            outer_list,
            block_ends: ElementManager::new(),
            block_starts: ElementManager::new(),
            counters,
            turnouts: ElementManager::new(),
            tracks: ElementManager::new(),
            signals: ElementManager::new(),
            distant_signals: ElementManager::new(),
            routes: ElementManager::new(),
        })
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// The "exactly one" chord gate.
    pub async fn is_outer_button(&self, name: &str) -> bool {
        self.outer.is_outer_button(name).await
    }

    // -- Construction: add_* methods register a new element and wire it -----

    pub async fn add_turnout(&self, name: impl Into<Arc<str>>) -> Result<Arc<Turnout>> {
        let name = name.into();
        let turnout = Turnout::with_moving_delay(
            self.wiring.clone(),
            self.outer.clone(),
            Arc::clone(&name),
            self.timing.turnout_moving_delay,
        );
        self.turnouts.register("turnout", name.to_string(), Arc::clone(&turnout)).await?;
        turnout.install().await;
        Ok(turnout)
    }

    pub async fn add_track(&self, name: impl Into<Arc<str>>) -> Result<Arc<Track>> {
        let name = name.into();
        let track = Track::new(self.wiring.clone(), Arc::clone(&name));
        self.tracks.register("track", name.to_string(), Arc::clone(&track)).await?;
        track.install().await;
        Ok(track)
    }

    /// A bare, unconfigured home signal; the caller chains
    /// `.add_home()`/`.add_shunting()`/`.add_alt()`.
    pub async fn add_signal(&self, name: impl Into<Arc<str>>) -> Result<Arc<Signal>> {
        let name = name.into();
        let signal = Signal::with_alt_delay(
            self.wiring.clone(),
            self.outer.clone(),
            self.signals.clone(),
            self.routes.clone(),
            Arc::clone(&name),
            self.timing.signal_alt_delay,
        );
        self.signals.register("signal", name.to_string(), Arc::clone(&signal)).await?;
        signal.install().await;
        Ok(signal)
    }

    /// Mirrors one named home signal,
    /// optionally extinguished while `mounted_at` shows Hp0.
    pub async fn add_distant_signal(
        &self,
        name: impl Into<Arc<str>>,
        home: &str,
        mounted_at: Option<&str>,
    ) -> Result<Arc<DistantSignal>> {
        let name = name.into();
        let home_signal = self.signal(home).await?;
        let mounted = match mounted_at {
            Some(n) => Some(self.signal(n).await?),
            None => None,
        };
        let distant = DistantSignal::new(self.wiring.clone(), Arc::clone(&name), home_signal, mounted);
        self.distant_signals.register("distantsignal", name.to_string(), Arc::clone(&distant)).await?;
        distant.install().await;
        Ok(distant)
    }

    /// Mirrors `straight` while
    /// `turnout` is straight (`position()==false`), else `diverging`.
    pub async fn add_distant_signal_switched(
        &self,
        name: impl Into<Arc<str>>,
        turnout: &str,
        straight: &str,
        diverging: &str,
        mounted_at: Option<&str>,
    ) -> Result<Arc<DistantSignal>> {
        let name = name.into();
        let turnout = self.turnout(turnout).await?;
        let straight = self.signal(straight).await?;
        let diverging = self.signal(diverging).await?;
        let mounted = match mounted_at {
            Some(n) => Some(self.signal(n).await?),
            None => None,
        };
        let distant = DistantSignal::new_switched(
            self.wiring.clone(),
            Arc::clone(&name),
            turnout,
            straight,
            diverging,
            mounted,
        );
        self.distant_signals.register("distantsignal", name.to_string(), Arc::clone(&distant)).await?;
        distant.install().await;
        Ok(distant)
    }

    pub async fn add_block_end(
        &self,
        name: impl Into<Arc<str>>,
        blockstart_topic: &str,
        clearance_lock_release_topic: &str,
    ) -> Result<Arc<BlockEnd>> {
        let name = name.into();
        let block_end = BlockEnd::new(self.wiring.clone(), self.outer.clone(), Arc::clone(&name));
        self.block_ends.register("blockend", name.to_string(), Arc::clone(&block_end)).await?;
        block_end.install(blockstart_topic, clearance_lock_release_topic).await;
        Ok(block_end)
    }

    pub async fn add_block_start(
        &self,
        name: impl Into<Arc<str>>,
        blockend_topic: &str,
        blocking_track_topic: &str,
    ) -> Result<Arc<BlockStart>> {
        let name = name.into();
        let block_start = BlockStart::new(self.wiring.clone(), Arc::clone(&name));
        self.block_starts.register("blockstart", name.to_string(), Arc::clone(&block_start)).await?;
        block_start.install(blockend_topic, blocking_track_topic).await;
        Ok(block_start)
    }

    /// Looks `s1`/`s2` up by name and registers the new, empty route under
    /// `"{s1},{s2}"`; the caller chains
    /// `route.add_turnout()`/`add_flank_protection()`/`add_track()` to
    /// describe the path.
    pub async fn add_route(&self, s1: &str, s2: &str) -> Result<Arc<Route>> {
        let s1 = self.signal(s1).await?;
        let s2 = self.signal(s2).await?;
        let route = Route::with_step_delay(self.wiring.clone(), s1, s2, self.timing.route_step_delay);
        self.routes.register("route", route.name.clone(), Arc::clone(&route)).await?;
        Ok(route)
    }

    // -- Lookups, for topology wiring and for tests --------------------------

    pub async fn turnout(&self, name: &str) -> Result<Arc<Turnout>> {
        self.turnouts.get(name).await.ok_or_else(|| TowerError::MissingReferent {
            referrer: "Tower".to_owned(),
            name: name.to_owned(),
        })
    }

    pub async fn track(&self, name: &str) -> Result<Arc<Track>> {
        self.tracks.get(name).await.ok_or_else(|| TowerError::MissingReferent {
            referrer: "Tower".to_owned(),
            name: name.to_owned(),
        })
    }

    pub async fn signal(&self, name: &str) -> Result<Arc<Signal>> {
        self.signals.get(name).await.ok_or_else(|| TowerError::MissingReferent {
            referrer: "Tower".to_owned(),
            name: name.to_owned(),
        })
    }

    pub async fn block_end(&self, name: &str) -> Result<Arc<BlockEnd>> {
        self.block_ends.get(name).await.ok_or_else(|| TowerError::MissingReferent {
            referrer: "Tower".to_owned(),
            name: name.to_owned(),
        })
    }

    pub async fn block_start(&self, name: &str) -> Result<Arc<BlockStart>> {
        self.block_starts.get(name).await.ok_or_else(|| TowerError::MissingReferent {
            referrer: "Tower".to_owned(),
            name: name.to_owned(),
        })
    }

    pub async fn route(&self, s1: &str, s2: &str) -> Option<Arc<Route>> {
        if let Some(route) = self.routes.get(&format!("{s1},{s2}")).await {
            return Some(route);
        }
        self.routes.get(&format!("{s2},{s1}")).await
    }

    /// Reset every managed element to its initial value and publish.
    pub async fn reset_all(&self) {
        for button in &self.outer_list {
            button.reset().await;
        }
        for counter in self.counters.all().await {
            counter.reset().await;
        }
        for block_end in self.block_ends.all().await {
            block_end.reset().await;
        }
        for block_start in self.block_starts.all().await {
            block_start.reset().await;
        }
        for turnout in self.turnouts.all().await {
            turnout.reset().await;
        }
        for track in self.tracks.all().await {
            track.reset().await;
        }
        for signal in self.signals.all().await {
            signal.reset().await;
        }
        for distant in self.distant_signals.all().await {
            distant.reset().await;
        }
        // Routes carry no resettable state of their own beyond `locked`,
        // which only ever changes through `start()`/`unlock()`, so resetting
        // a route is a no-op.
    }

    /// Connect, reset every element, and dispatch messages from `incoming`
    /// until it closes. The broker connection itself is never
    /// implemented here; `incoming` stands in for whatever bridges a real
    /// broker client into `(topic, payload)` pairs.
    pub async fn run(&self, incoming: mpsc::UnboundedReceiver<Message>) {
        self.connected.store(true, Ordering::SeqCst);
        self.reset_all().await;
        self.dispatcher.dispatch(incoming).await;
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Display for Tower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tower<{}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessBus;

    #[tokio::test]
    async fn seed_scenario_1_turnout_reset_publishes_all_zero() {
        let bus = InProcessBus::new();
        let tower = Tower::new("t", bus.clone()).await;
        tower.add_turnout("W1").await.unwrap();
        tower.reset_all().await;
        assert_eq!(bus.last("frischen/t/panel/turnout/W1").await, Some("0,0,0,0,0".to_owned()));
    }

    #[tokio::test]
    async fn seed_scenario_2_wgt_chord_moves_turnout() {
        let bus = InProcessBus::new();
        let tower = Tower::with_timing(
            "t",
            bus.clone(),
            Timing {
                turnout_moving_delay: Duration::from_millis(5),
                ..Timing::default()
            },
        )
        .await;
        tower.add_turnout("W1").await.unwrap();
        tower.reset_all().await;

        let dispatcher = Arc::clone(&tower.dispatcher);
        dispatcher.dispatch_one("frischen/t/panel/button/WGT", "1").await;
        dispatcher.dispatch_one("frischen/t/panel/button/W1", "1").await;
        assert_eq!(bus.last("frischen/t/panel/turnout/W1").await, Some("0,1,1,0,0".to_owned()));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(bus.last("frischen/t/panel/turnout/W1").await, Some("0,1,0,0,0".to_owned()));
    }

    #[tokio::test]
    async fn seed_scenario_3_distant_signal_mirrors_home() {
        let bus = InProcessBus::new();
        let tower = Tower::new("t", bus.clone()).await;
        let home = tower.add_signal("H").await.unwrap();
        home.add_home().await;
        tower.add_distant_signal("h", "H", None).await.unwrap();
        tower.reset_all().await;

        home.start_home(crate::elements::signal::Aspect::Hp2).await;
        assert_eq!(bus.last("frischen/t/panel/signal/H").await, Some("Hp2".to_owned()));
        assert_eq!(bus.last("frischen/t/panel/signal/h").await, Some("Vr2".to_owned()));
    }

    #[tokio::test]
    async fn seed_scenario_4_mounted_distant_signal_goes_dash_at_hp0() {
        let bus = InProcessBus::new();
        let tower = Tower::new("t", bus.clone()).await;
        let h = tower.add_signal("H").await.unwrap();
        h.add_home().await;
        let g = tower.add_signal("G").await.unwrap();
        g.add_home().await;
        tower.add_distant_signal("h", "H", Some("G")).await.unwrap();
        tower.reset_all().await;

        // G stays at Hp0 (its initial/reset value).
        h.start_home(crate::elements::signal::Aspect::Hp1).await;
        assert_eq!(bus.last("frischen/t/panel/signal/h").await, Some("-".to_owned()));
    }

    #[tokio::test]
    async fn seed_scenario_5_and_6_route_arms_then_fht_releases() {
        let bus = InProcessBus::new();
        let tower = Tower::with_timing(
            "t",
            bus.clone(),
            Timing {
                turnout_moving_delay: Duration::from_millis(1),
                route_step_delay: Duration::from_millis(1),
                ..Timing::default()
            },
        )
        .await;

        tower.add_turnout("W1").await.unwrap();
        tower.add_turnout("W2").await.unwrap();
        tower.add_track("1-1").await.unwrap();
        let p1 = tower.add_signal("P1").await.unwrap();
        p1.add_home().await;
        let dest = tower.add_signal("p1p3").await.unwrap();
        dest.add_home().await;
        tower.reset_all().await;

        let route = tower.add_route("P1", "p1p3").await.unwrap();
        let w1 = tower.turnout("W1").await.unwrap();
        let w2 = tower.turnout("W2").await.unwrap();
        let track = tower.track("1-1").await.unwrap();
        route.add_turnout(Arc::clone(&w1), false).await;
        route.add_flank_protection(Arc::clone(&w2), false).await;
        route.add_track(Arc::clone(&track)).await;

        let dispatcher = Arc::clone(&tower.dispatcher);
        dispatcher.dispatch_one("frischen/t/panel/button/P1", "1").await;
        dispatcher.dispatch_one("frischen/t/panel/button/p1p3", "1").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(route.is_locked().await);
        assert_eq!(bus.last("frischen/t/panel/signal/P1").await, Some("Hp1".to_owned()));

        dispatcher.dispatch_one("frischen/t/panel/button/FHT", "1").await;
        dispatcher.dispatch_one("frischen/t/panel/button/P1", "1").await;

        assert!(!route.is_locked().await);
        assert_eq!(bus.last("frischen/t/panel/signal/P1").await, Some("Hp0".to_owned()));
        assert!(!w1.is_locked());
        assert!(!w2.is_locked());
        assert!(!track.is_locked());
        assert_eq!(bus.last("frischen/t/panel/counter/FHT").await, Some("1".to_owned()));
    }
}
