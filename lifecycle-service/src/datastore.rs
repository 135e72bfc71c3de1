// SPDX-License-Identifier: GPL-3.0-only

//! In-memory datastore
//!
//! The contract treats persistence as an external collaborator; this
//! implementation backs the standalone binary and the test suites. A SQL
//! implementation would sit behind the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use lifecycle_contracts::{Datastore, LifecycleError};
use lifecycle_types::{Disk, DiskDraft, DiskState};

#[derive(Default)]
pub struct MemoryDatastore {
    records: RwLock<HashMap<Uuid, Disk>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn create(&self, draft: DiskDraft, state: DiskState) -> Result<Disk, LifecycleError> {
        let mut records = self.records.write().await;

        if records.values().any(|disk| disk.name == draft.name) {
            return Err(LifecycleError::Conflict(format!(
                "disk with name '{}' already exists",
                draft.name
            )));
        }

        let disk = Disk {
            id: Uuid::new_v4(),
            name: draft.name,
            size_mb: draft.size_mb,
            filesystem: draft.filesystem,
            mountpoint: draft.mountpoint,
            state,
            created_at: Utc::now(),
        };
        records.insert(disk.id, disk.clone());
        Ok(disk)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Disk>, LifecycleError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Disk>, LifecycleError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|disk| disk.name == name)
            .cloned())
    }

    async fn update(&self, disk: &Disk) -> Result<(), LifecycleError> {
        let mut records = self.records.write().await;
        match records.get_mut(&disk.id) {
            Some(stored) => {
                *stored = disk.clone();
                Ok(())
            }
            None => Err(LifecycleError::NotFound(format!(
                "disk with id '{}' not found",
                disk.id
            ))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), LifecycleError> {
        match self.records.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(LifecycleError::NotFound(format!(
                "disk with id '{id}' not found"
            ))),
        }
    }

    async fn list_all(&self) -> Result<Vec<Disk>, LifecycleError> {
        let mut disks: Vec<Disk> = self.records.read().await.values().cloned().collect();
        disks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(disks)
    }
}
