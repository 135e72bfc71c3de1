// SPDX-License-Identifier: GPL-3.0-only

//! Startup and periodic reconciliation
//!
//! Discovery seeds the datastore; it never overwrites what the controller
//! maintains. Rediscovering a known disk leaves its record alone, so a
//! user-set mountpoint or state survives every pass.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use lifecycle_contracts::{Datastore, LifecycleError};
use lifecycle_sys::DiskDiscoverer;
use lifecycle_types::DiskState;

use crate::error::map_sys_error;

pub struct Reconciler {
    discoverer: DiskDiscoverer,
    datastore: Arc<dyn Datastore>,
}

impl Reconciler {
    pub fn new(discoverer: DiskDiscoverer, datastore: Arc<dyn Datastore>) -> Self {
        Self {
            discoverer,
            datastore,
        }
    }

    /// Run one reconciliation pass. Returns the number of records created.
    ///
    /// Per-entry failures are logged and skipped; only total discovery
    /// failure aborts the pass.
    pub async fn reconcile(&self) -> Result<usize, LifecycleError> {
        let drafts = self
            .discoverer
            .discover()
            .await
            .map_err(|e| map_sys_error("discovery", "-", e))?;

        let mut created = 0;
        for draft in drafts {
            let name = draft.name.clone();
            match self.datastore.get_by_name(&name).await {
                Ok(Some(_)) => {
                    // Known disk: mountpoint and state are owned by the
                    // controller, so rediscovery must not touch them.
                    continue;
                }
                Ok(None) => {
                    match self.datastore.create(draft, DiskState::Discovered).await {
                        Ok(disk) => {
                            info!("reconciler created disk '{}' ({})", disk.name, disk.id);
                            created += 1;
                        }
                        Err(e) => warn!("reconciler could not create '{name}': {e}"),
                    }
                }
                Err(e) => warn!("reconciler could not look up '{name}': {e}"),
            }
        }

        Ok(created)
    }

    /// Reconcile on a fixed interval until the task is cancelled.
    pub async fn run_periodic(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; the startup pass already ran.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match self.reconcile().await {
                Ok(created) if created > 0 => {
                    info!("periodic reconcile created {created} records");
                }
                Ok(_) => {}
                Err(e) => warn!("periodic reconcile failed: {e}"),
            }
        }
    }
}
