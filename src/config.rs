// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI/environment configuration for the tower binary.

use std::time::Duration;

/// Configuration for one running `Tower`.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "frischen-tower", about = "SpDrL20 relay interlocking core")]
pub struct TowerConfig {
    /// Station name, used as the `<station>` segment of every topic.
    #[arg(long, default_value = "etal", env = "FRISCHEN_STATION")]
    pub name: String,

    /// Broker host to connect to.
    #[arg(long, default_value = "localhost", env = "FRISCHEN_BROKER_HOST")]
    pub broker_host: String,

    /// Broker port to connect to.
    #[arg(long, default_value_t = 1883, env = "FRISCHEN_BROKER_PORT")]
    pub broker_port: u16,

    /// Turnout motion delay in milliseconds, between a commanded position
    /// change and `moving` clearing.
    #[arg(long, default_value_t = 6_000, env = "FRISCHEN_TURNOUT_MOVING_MS")]
    pub turnout_moving_delay_ms: u64,

    /// Signal Zs1 (alternate/substitute) auto-revert delay in milliseconds.
    #[arg(long, default_value_t = 15_000, env = "FRISCHEN_SIGNAL_ALT_MS")]
    pub signal_alt_delay_ms: u64,

    /// Delay between staged steps (turnout moves, locks) within route setting, in milliseconds.
    #[arg(long, default_value_t = 200, env = "FRISCHEN_ROUTE_STEP_MS")]
    pub route_step_delay_ms: u64,

    /// Run the bundled Etal station demo scenario and exit instead of idling.
    #[arg(long, default_value_t = false, env = "FRISCHEN_DEMO")]
    pub demo: bool,
}

impl TowerConfig {
    pub fn turnout_moving_delay(&self) -> Duration {
        Duration::from_millis(self.turnout_moving_delay_ms)
    }

    pub fn signal_alt_delay(&self) -> Duration {
        Duration::from_millis(self.signal_alt_delay_ms)
    }

    pub fn route_step_delay(&self) -> Duration {
        Duration::from_millis(self.route_step_delay_ms)
    }

    /// Broker address in `host:port` form.
    pub fn broker_addr(&self) -> String {
        format!("{}:{}", self.broker_host, self.broker_port)
    }
}
