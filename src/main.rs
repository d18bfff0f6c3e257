// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use frischen_core::bus::InProcessBus;
use frischen_core::config::TowerConfig;

#[tokio::main]
async fn main() {
    let config = TowerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bus = InProcessBus::new();
    let (tx, rx) = mpsc::unbounded_channel();

    // No real MQTT client ships with this crate. `--demo` drives the bundled Etal topology
    // through a scripted sequence of panel button presses over the loopback
    // bus and exits; without it, the tower idles on `incoming`, standing in
    // for "connected to a broker that never sends anything" until a real
    // bridge is wired up in front of it.
    // `tx` is kept bound in `main`'s own scope either way, so in the
    // non-demo branch it simply stays open for the run's whole lifetime:
    // the dispatch loop below blocks on `incoming.recv()` rather than
    // seeing a closed channel and exiting immediately.
    if config.demo {
        tokio::spawn(run_demo(tx));
    } else {
        info!("no --demo flag and no broker adapter wired in; idling");
    }

    if let Err(e) = frischen_core::run(config, bus, rx).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

/// Press a handful of panel buttons against the Etal demo topology so the
/// tower's console log shows a turnout move and a route arming, then drop
/// `tx` so the dispatch loop in [`frischen_core::run`] exits cleanly.
async fn run_demo(tx: mpsc::UnboundedSender<(String, String)>) {
    let press = |button: &str| {
        let topic = format!("frischen/etal/panel/button/{button}");
        (topic, "1".to_owned())
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    info!("demo: moving W1 via the WGT chord");
    let _ = tx.send(press("WGT"));
    let _ = tx.send(press("W1"));

    tokio::time::sleep(Duration::from_secs(7)).await;
    info!("demo: arming route P1 -> p1p3");
    let _ = tx.send(press("P1"));
    let _ = tx.send(press("p1p3"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    info!("demo: releasing route via FHT");
    let _ = tx.send(press("FHT"));
    let _ = tx.send(press("P1"));

    tokio::time::sleep(Duration::from_millis(200)).await;
}
