// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frischen: the core of a SpDrL20-style relay interlocking.
//!
//! Mediates between a signalman's panel and trackside equipment: the
//! element model, the chord-button command recognizer, the route-setting
//! state machine, distant-signal propagation, and the block apparatus, all
//! wired through an async pub/sub bus. The broker, the panel UI, and the
//! trackside hardware are external collaborators; this crate's only
//! contract with them is the panel/trackside topic and payload schema.

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod elements;
pub mod error;
pub mod pubsub;
pub mod route;
pub mod topology;
pub mod tower;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::bus::Bus;
use crate::config::TowerConfig;
use crate::dispatcher::Message;
use crate::tower::{Timing, Tower};

/// Build the bundled Etal demo topology on a fresh [`Tower`] and run it
/// until `incoming` closes. `bus` is the broker-facing seam; `incoming`
/// stands in for whatever bridges a real broker's received messages into
/// `(topic, payload)` pairs, since the broker itself is never implemented
/// here — only the topic contract it carries.
pub async fn run(
    config: TowerConfig,
    bus: Arc<dyn Bus>,
    incoming: mpsc::UnboundedReceiver<Message>,
) -> anyhow::Result<Arc<Tower>> {
    let timing = Timing {
        turnout_moving_delay: config.turnout_moving_delay(),
        signal_alt_delay: config.signal_alt_delay(),
        route_step_delay: config.route_step_delay(),
    };
    let tower = Tower::with_timing(config.name.clone(), bus, timing).await;
    topology::build_etal(&tower).await?;

    tracing::info!(station = %config.name, "tower assembled, running");
    tower.run(incoming).await;
    Ok(tower)
}
