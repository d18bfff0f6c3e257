// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A home signal — the signal that actually stops or
//! clears a train at a station entrance, as opposed to its distant
//! counterpart in [`super::distant_signal`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::{parse_bool, ElementManager, OuterButtons, Wiring};
use crate::pubsub::PubSub;
use crate::route::Route;

/// The finite set of aspects a home signal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    Hp0,
    Hp1,
    Hp2,
    Sh1,
    Zs1,
}

impl Aspect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hp0 => "Hp0",
            Self::Hp1 => "Hp1",
            Self::Hp2 => "Hp2",
            Self::Sh1 => "Sh1",
            Self::Zs1 => "Zs1",
        }
    }

    /// Whether this aspect permits a train to proceed, the condition a
    /// locked route's entrance signal must satisfy.
    pub fn is_proceed(self) -> bool {
        matches!(self, Self::Hp1 | Self::Hp2)
    }
}

/// Default auto-revert delay for the Zs1 (alternate/substitute) aspect.
pub const DEFAULT_ALT_DELAY: Duration = Duration::from_secs(15);

pub struct Signal {
    pub name: Arc<str>,
    wiring: Wiring,
    outer: OuterButtons,
    signals: ElementManager<Signal>,
    routes: ElementManager<Route>,
    pushed: AtomicBool,
    aspect: RwLock<Aspect>,
    enabled: RwLock<std::collections::HashSet<Aspect>>,
    alt_delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Fires with the new aspect on every change; [`super::distant_signal::DistantSignal`]
    /// subscribes here to mirror the aspect through its selector.
    pub(crate) on_update: PubSub<Aspect>,
}

impl Signal {
    pub fn new(
        wiring: Wiring,
        outer: OuterButtons,
        signals: ElementManager<Signal>,
        routes: ElementManager<Route>,
        name: impl Into<Arc<str>>,
    ) -> Arc<Self> {
        Self::with_alt_delay(wiring, outer, signals, routes, name, DEFAULT_ALT_DELAY)
    }

    pub fn with_alt_delay(
        wiring: Wiring,
        outer: OuterButtons,
        signals: ElementManager<Signal>,
        routes: ElementManager<Route>,
        name: impl Into<Arc<str>>,
        alt_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            outer,
            signals,
            routes,
            pushed: AtomicBool::new(false),
            aspect: RwLock::new(Aspect::Hp0),
            enabled: RwLock::new(std::collections::HashSet::new()),
            alt_delay,
            pending: Mutex::new(None),
            on_update: PubSub::new(),
        })
    }

    pub async fn install(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let topic = self.wiring.button_topic(&self.name);
        self.wiring
            .dispatcher
            .subscribe(topic, format!("Signal<{}>", self.name), move |payload| {
                let this = Arc::clone(&this);
                async move {
                    this.on_button(parse_bool(&payload)).await;
                }
            })
            .await;
    }

    // -- Chainable aspect-set builders:
    // `.add_home()/.add_shunting()/.add_alt()`. -----------

    pub async fn add_home(self: &Arc<Self>) -> Arc<Self> {
        self.enabled.write().await.extend([Aspect::Hp0, Aspect::Hp1, Aspect::Hp2]);
        Arc::clone(self)
    }

    pub async fn add_shunting(self: &Arc<Self>) -> Arc<Self> {
        self.enabled.write().await.insert(Aspect::Sh1);
        Arc::clone(self)
    }

    pub async fn add_alt(self: &Arc<Self>) -> Arc<Self> {
        self.enabled.write().await.insert(Aspect::Zs1);
        Arc::clone(self)
    }

    fn topic(&self) -> String {
        self.wiring.panel_topic("signal", &self.name)
    }

    async fn publish(&self) {
        let aspect = *self.aspect.read().await;
        self.wiring.publish(self.topic(), aspect.as_str()).await;
        self.on_update.publish(aspect).await;
    }

    pub async fn aspect(&self) -> Aspect {
        *self.aspect.read().await
    }

    pub async fn is_pushed(&self) -> bool {
        self.pushed.load(Ordering::SeqCst)
    }

    async fn cancel_pending(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }

    async fn set_aspect(&self, aspect: Aspect) {
        *self.aspect.write().await = aspect;
        self.publish().await;
    }

    /// Route-controlled aspect change; bypasses the shunting/halt/alt
    /// gating below.
    pub async fn start_home(&self, aspect: Aspect) {
        self.set_aspect(aspect).await;
    }

    async fn start_change_shunting(&self) {
        if !self.enabled.read().await.contains(&Aspect::Sh1) {
            return;
        }
        if *self.aspect.read().await == Aspect::Hp0 {
            self.set_aspect(Aspect::Sh1).await;
        }
    }

    async fn start_halt(&self) {
        self.cancel_pending().await;
        if *self.aspect.read().await != Aspect::Hp0 {
            self.set_aspect(Aspect::Hp0).await;
        }
    }

    async fn start_alt(self: &Arc<Self>) {
        let eligible = {
            let enabled = self.enabled.read().await;
            let aspect = self.aspect.read().await;
            enabled.contains(&Aspect::Zs1) && *aspect == Aspect::Hp0
        };
        if !eligible {
            tracing::debug!(signal = %self.name, "not activating Zs1");
            return;
        }
        self.cancel_pending().await;
        self.outer.count("ErsGT").await;
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.set_aspect(Aspect::Zs1).await;
            tokio::time::sleep(this.alt_delay).await;
            this.set_aspect(Aspect::Hp0).await;
        });
        *self.pending.lock().await = Some(handle);
    }

    async fn start_fht(self: &Arc<Self>) {
        for route in self.routes.all().await {
            if route.entrance_name() == self.name.as_ref() && route.is_locked().await {
                self.outer.count("FHT").await;
                route.unlock().await;
                return;
            }
        }
    }

    async fn try_start_route(&self) {
        let mut pushed = Vec::new();
        for signal in self.signals.all().await {
            if signal.is_pushed().await {
                pushed.push(signal.name.to_string());
            }
        }
        if pushed.len() != 2 {
            return;
        }
        if let Some(route) = self.routes.get(&format!("{},{}", pushed[0], pushed[1])).await {
            route.start();
            return;
        }
        if let Some(route) = self.routes.get(&format!("{},{}", pushed[1], pushed[0])).await {
            route.start();
        }
    }

    async fn on_button(self: &Arc<Self>, pushed: bool) {
        self.pushed.store(pushed, Ordering::SeqCst);
        if !pushed {
            return;
        }
        if self.outer.is_outer_button("SGT").await {
            self.start_change_shunting().await;
            return;
        }
        if self.outer.is_outer_button("HaGT").await {
            self.start_halt().await;
            return;
        }
        if self.outer.is_outer_button("ErsGT").await {
            self.start_alt().await;
            return;
        }
        if self.outer.is_outer_button("FHT").await {
            self.start_fht().await;
            return;
        }
        self.try_start_route().await;
    }

    pub async fn reset(&self) {
        self.cancel_pending().await;
        *self.aspect.write().await = Aspect::Hp0;
        self.pushed.store(false, Ordering::SeqCst);
        self.publish().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InProcessBus;
    use crate::dispatcher::Dispatcher;
    use crate::elements::OuterButton;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool as StdAtomicBool;

    fn wiring(bus: Arc<InProcessBus>) -> Wiring {
        Wiring {
            dispatcher: Arc::new(Dispatcher::new(bus)),
            station: Arc::from("t"),
            connected: Arc::new(StdAtomicBool::new(true)),
        }
    }

    async fn outer_with(names: &[&'static str]) -> (Wiring, Arc<InProcessBus>, OuterButtons) {
        let bus = InProcessBus::new();
        let w = wiring(bus.clone());
        let mut map: HashMap<&'static str, Arc<OuterButton>> = HashMap::new();
        for name in names {
            let button = OuterButton::new(w.clone(), *name);
            button.install().await;
            map.insert(name, button);
        }
        (w, bus, OuterButtons::new(map))
    }

    #[tokio::test]
    async fn halt_after_home_returns_to_hp0() {
        let (w, bus, outer) = outer_with(&["HaGT"]).await;
        let signals = ElementManager::new();
        let routes = ElementManager::new();
        let signal = Signal::new(w, outer, signals, routes, "H");
        signal.add_home().await;

        signal.start_home(Aspect::Hp1).await;
        assert_eq!(bus.last("frischen/t/panel/signal/H").await, Some("Hp1".to_owned()));

        signal.start_halt().await;
        assert_eq!(bus.last("frischen/t/panel/signal/H").await, Some("Hp0".to_owned()));
    }

    #[tokio::test]
    async fn ersgt_without_zs1_is_a_no_op_and_does_not_count() {
        let (w, bus, outer) = outer_with(&["ErsGT"]).await;
        let signals = ElementManager::new();
        let routes = ElementManager::new();
        let signal = Signal::new(w, outer.clone(), signals, routes, "H");
        signal.add_home().await; // no add_alt(): Zs1 not enabled

        let dispatcher = Arc::clone(&signal.wiring.dispatcher);
        signal.install().await;
        dispatcher.dispatch_one("frischen/t/panel/button/ErsGT", "1").await;
        dispatcher.dispatch_one("frischen/t/panel/button/H", "1").await;

        assert_eq!(signal.aspect().await, Aspect::Hp0);
        assert_eq!(bus.last("frischen/t/panel/counter/ErsGT").await, None);
    }

    #[tokio::test]
    async fn ersgt_with_zs1_reverts_after_alt_delay() {
        let (w, bus, outer) = outer_with(&["ErsGT"]).await;
        if let Some(outer_button) = outer.get("ErsGT") {
            outer_button.add_counter().await;
        }
        let signals = ElementManager::new();
        let routes = ElementManager::new();
        let signal = Signal::with_alt_delay(
            w,
            outer,
            signals,
            routes,
            "H",
            Duration::from_millis(5),
        );
        signal.add_home().await;
        signal.add_alt().await;
        let dispatcher = Arc::clone(&signal.wiring.dispatcher);
        signal.install().await;

        dispatcher.dispatch_one("frischen/t/panel/button/ErsGT", "1").await;
        dispatcher.dispatch_one("frischen/t/panel/button/H", "1").await;

        assert_eq!(bus.last("frischen/t/panel/signal/H").await, Some("Zs1".to_owned()));
        assert_eq!(bus.last("frischen/t/panel/counter/ErsGT").await, Some("1".to_owned()));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(bus.last("frischen/t/panel/signal/H").await, Some("Hp0".to_owned()));
    }
}
