// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A distant signal, previewing the aspect of one or two home signals.
//! Published under `panel/signal/<name>`, not `panel/distantsignal/<name>`
//! — from the panel's perspective it is just another signal face.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::signal::{Aspect, Signal};
use super::turnout::Turnout;
use super::Wiring;

/// Which home signal currently drives a distant signal. Kept as a small
/// declarative record rather than a pair of closures that each
/// independently inspect a shared turnout — that shape leaves it ambiguous
/// which signal's update "wins" when both fire; a single callback
/// consulting this selector removes the ambiguity instead of racing.
enum Selector {
    Fixed(Arc<Signal>),
    ByTurnout { turnout: Arc<Turnout>, straight: Arc<Signal>, diverging: Arc<Signal> },
}

#[derive(Clone, Copy)]
enum Source {
    Fixed,
    Straight,
    Diverging,
}

fn translate(aspect: Aspect) -> String {
    match aspect {
        Aspect::Hp0 => "Vr0".to_owned(),
        Aspect::Hp1 => "Vr1".to_owned(),
        Aspect::Hp2 => "Vr2".to_owned(),
        // No Vr counterpart for Sh1/Zs1; leave the home signal's own aspect
        // string untouched in that case.
        other => other.as_str().to_owned(),
    }
}

pub struct DistantSignal {
    pub name: Arc<str>,
    wiring: Wiring,
    selector: Selector,
    /// Extinguished (publishes the literal `-`) whenever this home signal
    /// shows Hp0.
    mounted_at: Option<Arc<Signal>>,
    aspect: RwLock<String>,
}

impl DistantSignal {
    pub fn new(
        wiring: Wiring,
        name: impl Into<Arc<str>>,
        home: Arc<Signal>,
        mounted_at: Option<Arc<Signal>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            selector: Selector::Fixed(home),
            mounted_at,
            aspect: RwLock::new("Vr0".to_owned()),
        })
    }

    pub fn new_switched(
        wiring: Wiring,
        name: impl Into<Arc<str>>,
        turnout: Arc<Turnout>,
        straight: Arc<Signal>,
        diverging: Arc<Signal>,
        mounted_at: Option<Arc<Signal>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            wiring,
            selector: Selector::ByTurnout { turnout, straight, diverging },
            mounted_at,
            aspect: RwLock::new("Vr0".to_owned()),
        })
    }

    pub async fn install(self: &Arc<Self>) {
        match &self.selector {
            Selector::Fixed(home) => {
                let this = Arc::clone(self);
                home.on_update
                    .subscribe(format!("DistantSignal<{}>", self.name), move |aspect| {
                        let this = Arc::clone(&this);
                        async move {
                            this.handle_update(Source::Fixed, aspect).await;
                        }
                    })
                    .await;
            }
            Selector::ByTurnout { straight, diverging, .. } => {
                let this = Arc::clone(self);
                straight
                    .on_update
                    .subscribe(format!("DistantSignal<{}>/straight", self.name), move |aspect| {
                        let this = Arc::clone(&this);
                        async move {
                            this.handle_update(Source::Straight, aspect).await;
                        }
                    })
                    .await;
                let this = Arc::clone(self);
                diverging
                    .on_update
                    .subscribe(format!("DistantSignal<{}>/diverging", self.name), move |aspect| {
                        let this = Arc::clone(&this);
                        async move {
                            this.handle_update(Source::Diverging, aspect).await;
                        }
                    })
                    .await;
            }
        }

        if let Some(mounted) = &self.mounted_at {
            let this = Arc::clone(self);
            mounted
                .on_update
                .subscribe(format!("DistantSignal<{}>/mounted", self.name), move |_aspect| {
                    let this = Arc::clone(&this);
                    async move {
                        this.publish().await;
                    }
                })
                .await;
        }
    }

    async fn handle_update(&self, source: Source, aspect: Aspect) {
        let act = match (&self.selector, source) {
            (Selector::Fixed(_), Source::Fixed) => true,
            (Selector::ByTurnout { turnout, .. }, Source::Straight) => !turnout.position(),
            (Selector::ByTurnout { turnout, .. }, Source::Diverging) => turnout.position(),
            _ => false,
        };
        if act {
            self.start_distant(aspect).await;
        }
    }

    async fn start_distant(&self, aspect: Aspect) {
        *self.aspect.write().await = translate(aspect);
        self.publish().await;
    }

    fn topic(&self) -> String {
        self.wiring.panel_topic("signal", &self.name)
    }

    async fn publish(&self) {
        if let Some(mounted) = &self.mounted_at {
            if mounted.aspect().await == Aspect::Hp0 {
                self.wiring.publish(self.topic(), "-").await;
                return;
            }
        }
        let aspect = self.aspect.read().await.clone();
        self.wiring.publish(self.topic(), aspect).await;
    }

    pub async fn value(&self) -> String {
        self.aspect.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.aspect.write().await = "Vr0".to_owned();
        self.publish().await;
    }
}
