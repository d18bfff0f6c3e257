// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counts relevant panel operations.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::Wiring;

/// `properties = ["count"]`. Published as a plain decimal, not a bit.
pub struct Counter {
    pub name: Arc<str>,
    wiring: Wiring,
    count: RwLock<u64>,
}

impl Counter {
    pub fn new(wiring: Wiring, name: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self { name: name.into(), wiring, count: RwLock::new(0) })
    }

    fn topic(&self) -> String {
        self.wiring.panel_topic("counter", &self.name)
    }

    async fn publish(&self) {
        let count = *self.count.read().await;
        self.wiring.publish(self.topic(), count.to_string()).await;
    }

    pub async fn count(&self) -> u64 {
        *self.count.read().await
    }

    /// Register a substitute-procedure operation.
    pub async fn increment(&self) {
        {
            let mut count = self.count.write().await;
            *count += 1;
        }
        self.publish().await;
    }

    pub async fn reset(&self) {
        *self.count.write().await = 0;
        self.publish().await;
    }
}
