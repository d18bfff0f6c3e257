// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The element model: the base wiring every concrete element shares, plus
//! the per-kind registries a [`crate::tower::Tower`] owns.
//!
//! Each kind below is a concrete struct with named fields, and `kind` is a
//! `&'static str` constant rather than a reflected class name. What every
//! element shares is the wiring: it subscribes itself to a panel button
//! topic at construction and republishes its full value to a panel topic
//! whenever a property changes.

pub mod block_end;
pub mod block_start;
pub mod counter;
pub mod distant_signal;
pub mod outer_button;
pub mod signal;
pub mod track;
pub mod turnout;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::dispatcher::Dispatcher;

pub use block_end::BlockEnd;
pub use block_start::BlockStart;
pub use counter::Counter;
pub use outer_button::OuterButton;
pub use signal::Signal;
pub use track::Track;
pub use turnout::Turnout;

/// Render a boolean the way the panel value encoding does: `"1"`/`"0"`,
/// never `"true"`/`"false"`.
pub fn bit(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Parse a panel/trackside payload: `1, t, T, true, True, y,
/// yes` are true, everything else (including garbage) is false.
pub fn parse_bool(payload: &str) -> bool {
    matches!(payload, "1" | "t" | "T" | "true" | "True" | "y" | "yes")
}

/// Block apparatus constructors accept either a bare
/// trackside channel name (resolved against `kind`) or a full topic string
/// (containing a `/`).
pub fn resolve_topic(wiring: &Wiring, kind: &str, topic_or_channel: &str) -> String {
    if topic_or_channel.contains('/') {
        topic_or_channel.to_owned()
    } else {
        wiring.trackside_topic(kind, topic_or_channel)
    }
}

/// Per-kind, name-keyed registry, owned by a `Tower` instance rather than
/// living as a process-wide global. A cheap
/// `Clone` handle onto one shared table, the same way [`Wiring`] and
/// [`OuterButtons`] are — `Tower` and every `Signal` it builds need to see
/// the same `signals`/`routes` registry for the chord recognizer to work
/// at all.
pub struct ElementManager<T> {
    objects: Arc<RwLock<HashMap<String, Arc<T>>>>,
}

impl<T> Clone for ElementManager<T> {
    fn clone(&self) -> Self {
        Self { objects: Arc::clone(&self.objects) }
    }
}

impl<T> Default for ElementManager<T> {
    fn default() -> Self {
        Self { objects: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl<T> ElementManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element under its name. Returns an error if a
    /// same-kind element with that name already exists.
    pub async fn register(
        &self,
        kind: &'static str,
        name: impl Into<String>,
        element: Arc<T>,
    ) -> Result<(), crate::error::TowerError> {
        let name = name.into();
        let mut objects = self.objects.write().await;
        if objects.contains_key(&name) {
            return Err(crate::error::TowerError::DuplicateName { kind, name });
        }
        objects.insert(name, element);
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Option<Arc<T>> {
        self.objects.read().await.get(name).cloned()
    }

    pub async fn all(&self) -> Vec<Arc<T>> {
        self.objects.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

/// The wiring shared by every element: how to reach the dispatcher, the
/// station's topic prefix, and whether the tower is currently connected
/// (publishes become no-ops once it isn't).
#[derive(Clone)]
pub struct Wiring {
    pub dispatcher: Arc<Dispatcher>,
    pub station: Arc<str>,
    pub connected: Arc<AtomicBool>,
}

impl Wiring {
    pub fn panel_topic(&self, kind: &str, name: &str) -> String {
        format!("frischen/{}/panel/{}/{}", self.station, kind, name)
    }

    pub fn trackside_topic(&self, kind: &str, name: &str) -> String {
        format!("frischen/{}/trackside/{}/{}", self.station, kind, name)
    }

    pub fn button_topic(&self, name: &str) -> String {
        format!("frischen/{}/panel/button/{}", self.station, name)
    }

    /// Fire-and-forget publish that becomes a no-op once the tower has
    /// lost its connection to the broker.
    pub async fn publish(&self, topic: impl Into<String>, payload: impl Into<String>) {
        if !self.connected.load(Ordering::SeqCst) {
            return;
        }
        self.dispatcher.publish(topic, payload).await;
    }
}

/// The eight fixed outer (function) buttons, resolvable by name for the
/// chord recognizer and for `Counter::increment` calls triggered by
/// element-side command handlers (Signal's FHT/ErsGT chords).
#[derive(Clone)]
pub struct OuterButtons {
    buttons: Arc<HashMap<&'static str, Arc<OuterButton>>>,
}

/// The canonical set, in registration order.
pub const OUTER_BUTTON_NAMES: [&str; 8] =
    ["AsT", "BlGT", "ErsGT", "FHT", "HaGT", "SGT", "WGT", "WHT"];

/// Outer buttons that own a counter.
pub const OUTER_BUTTONS_WITH_COUNTER: [&str; 4] = ["AsT", "ErsGT", "FHT", "WHT"];

impl OuterButtons {
    pub fn new(buttons: HashMap<&'static str, Arc<OuterButton>>) -> Self {
        Self { buttons: Arc::new(buttons) }
    }

    pub fn get(&self, name: &str) -> Option<Arc<OuterButton>> {
        self.buttons.values().find(|b| b.name.as_ref() == name).cloned()
    }

    /// True iff exactly this outer button is pushed and no other outer
    /// button is pushed (the "exactly one" chord gate).
    pub async fn is_outer_button(&self, name: &str) -> bool {
        let Some(target) = self.buttons.get(name) else {
            return false;
        };
        if !target.is_pushed().await {
            return false;
        }
        for (other_name, button) in self.buttons.iter() {
            if *other_name != name && button.is_pushed().await {
                return false;
            }
        }
        true
    }

    /// Increment the named outer button's counter, if it has one. A no-op
    /// (logged) if the button has no attached counter or does not exist.
    pub async fn count(&self, name: &str) {
        match self.get(name) {
            Some(button) => button.count().await,
            None => tracing::warn!(button = name, "count() on unknown outer button"),
        }
    }
}
