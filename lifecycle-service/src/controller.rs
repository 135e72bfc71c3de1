// SPDX-License-Identifier: GPL-3.0-only

//! Disk lifecycle state machine
//!
//! Every mutating operation runs the same shape: authorize, take the
//! per-name lock, re-read the record from the datastore, validate the
//! precondition, dispatch the OS command, and only then write the resulting
//! state. A failed command leaves the record untouched, and failures carry a
//! freshly re-read listing so callers never render stale state.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use lifecycle_contracts::{Authorizer, Datastore, LifecycleError};
use lifecycle_sys::{CommandExecutor, Platform};
use lifecycle_types::{Disk, DiskDraft, DiskState, OperationOutcome, Principal};

use crate::error::map_sys_error;

/// A failed operation, carrying the current disk listing re-read from the
/// datastore at failure time.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct OperationError {
    pub error: LifecycleError,
    pub disks: Vec<Disk>,
}

type OpResult = Result<OperationOutcome, OperationError>;

pub struct DiskLifecycleController {
    datastore: Arc<dyn Datastore>,
    authorizer: Arc<dyn Authorizer>,
    runner: Arc<dyn CommandExecutor>,
    platform: Arc<dyn Platform>,
    // One logical mutex per disk name, so transitions on the same device
    // cannot interleave their OS actions. Different names run concurrently.
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DiskLifecycleController {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        authorizer: Arc<dyn Authorizer>,
        runner: Arc<dyn CommandExecutor>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            datastore,
            authorizer,
            runner,
            platform,
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn authorize(&self, principal: &Principal) -> Result<(), LifecycleError> {
        match self.authorizer.check(principal).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(LifecycleError::Unauthorized(format!(
                "principal '{principal}' is not allowed to manage disks"
            ))),
            Err(e) => Err(e),
        }
    }

    async fn name_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.name_locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Current full listing, used for both success and failure responses.
    async fn listing(&self) -> Vec<Disk> {
        match self.datastore.list_all().await {
            Ok(disks) => disks,
            Err(e) => {
                warn!("could not read disk listing for response: {e}");
                Vec::new()
            }
        }
    }

    async fn fail(&self, error: LifecycleError) -> OperationError {
        OperationError {
            error,
            disks: self.listing().await,
        }
    }

    async fn outcome(&self, message: String) -> OperationOutcome {
        OperationOutcome::new(message, self.listing().await)
    }

    async fn require_record(&self, id: Uuid) -> Result<Disk, LifecycleError> {
        self.datastore
            .get_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("disk with id '{id}' not found")))
    }

    pub async fn list(&self) -> Result<Vec<Disk>, LifecycleError> {
        self.datastore.list_all().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Disk, LifecycleError> {
        self.require_record(id).await
    }

    /// Register a disk explicitly, outside of discovery.
    pub async fn register(&self, principal: &Principal, draft: DiskDraft) -> OpResult {
        if let Err(e) = self.authorize(principal).await {
            return Err(self.fail(e).await);
        }

        let lock = self.name_lock(&draft.name).await;
        let _guard = lock.lock().await;

        let name = draft.name.clone();
        match self.datastore.create(draft, DiskState::Discovered).await {
            Ok(disk) => {
                info!("registered disk '{}' ({})", disk.name, disk.id);
                Ok(self.outcome(format!("Disk '{}' registered", disk.name)).await)
            }
            Err(e) => {
                warn!("register '{name}' failed: {e}");
                Err(self.fail(e).await)
            }
        }
    }

    /// Update descriptive metadata (size, filesystem). Lifecycle fields
    /// (`state`, `mountpoint`) stay controller-owned and are not touched.
    pub async fn update(&self, principal: &Principal, id: Uuid, draft: DiskDraft) -> OpResult {
        if let Err(e) = self.authorize(principal).await {
            return Err(self.fail(e).await);
        }

        let current = match self.require_record(id).await {
            Ok(disk) => disk,
            Err(e) => return Err(self.fail(e).await),
        };

        let lock = self.name_lock(&current.name).await;
        let _guard = lock.lock().await;

        let mut disk = match self.require_record(id).await {
            Ok(disk) => disk,
            Err(e) => return Err(self.fail(e).await),
        };
        disk.size_mb = draft.size_mb;
        disk.filesystem = draft.filesystem;

        if let Err(e) = self.datastore.update(&disk).await {
            return Err(self.fail(e).await);
        }
        Ok(self.outcome(format!("Disk '{}' updated", disk.name)).await)
    }

    pub async fn format(&self, principal: &Principal, id: Uuid) -> OpResult {
        self.transition(principal, id, "format", |controller, disk| {
            let spec = controller.platform.format_command(disk)?;
            Ok((spec, Transition::SetState(DiskState::Formatted)))
        })
        .await
    }

    pub async fn mount(&self, principal: &Principal, id: Uuid, mountpoint: &str) -> OpResult {
        let target = mountpoint.to_string();
        self.transition(principal, id, "mount", move |controller, disk| {
            if disk.state == DiskState::Mounted {
                return Err(TransitionError::Precondition(LifecycleError::Conflict(
                    format!("disk '{}' is already mounted", disk.name),
                )));
            }
            let spec = controller.platform.mount_command(disk, &target)?;
            Ok((spec, Transition::Mount(target)))
        })
        .await
    }

    pub async fn unmount(&self, principal: &Principal, id: Uuid) -> OpResult {
        self.transition(principal, id, "unmount", |controller, disk| {
            if disk.state != DiskState::Mounted {
                return Err(TransitionError::Precondition(LifecycleError::Conflict(
                    format!("disk '{}' is not mounted", disk.name),
                )));
            }
            let spec = controller.platform.unmount_command(disk)?;
            Ok((spec, Transition::Unmount))
        })
        .await
    }

    pub async fn wipe(&self, principal: &Principal, id: Uuid) -> OpResult {
        self.transition(principal, id, "wipe", |controller, disk| {
            let spec = controller.platform.wipe_command(disk)?;
            Ok((spec, Transition::SetState(DiskState::Wiped)))
        })
        .await
    }

    /// Remove the persisted record. The unmount policy in this system never
    /// deletes records implicitly; this is the only way a record goes away.
    pub async fn remove(&self, principal: &Principal, id: Uuid) -> OpResult {
        if let Err(e) = self.authorize(principal).await {
            return Err(self.fail(e).await);
        }

        let disk = match self.require_record(id).await {
            Ok(disk) => disk,
            Err(e) => return Err(self.fail(e).await),
        };

        let lock = self.name_lock(&disk.name).await;
        let _guard = lock.lock().await;

        if let Err(e) = self.datastore.delete(disk.id).await {
            return Err(self.fail(e).await);
        }
        info!("removed disk '{}' ({})", disk.name, disk.id);
        Ok(self.outcome(format!("Disk '{}' removed", disk.name)).await)
    }

    /// Shared shape of the command-dispatching operations: authorize, lock,
    /// re-read, validate + build the command, run it, persist the new state.
    async fn transition<F>(
        &self,
        principal: &Principal,
        id: Uuid,
        action: &str,
        build: F,
    ) -> OpResult
    where
        F: FnOnce(&Self, &Disk) -> Result<(lifecycle_types::CommandSpec, Transition), TransitionError>,
    {
        if let Err(e) = self.authorize(principal).await {
            return Err(self.fail(e).await);
        }

        // Pre-read only to learn the name for the lock; the authoritative
        // read happens inside the lock.
        let preread = match self.require_record(id).await {
            Ok(disk) => disk,
            Err(e) => return Err(self.fail(e).await),
        };

        let lock = self.name_lock(&preread.name).await;
        let _guard = lock.lock().await;

        let mut disk = match self.require_record(id).await {
            Ok(disk) => disk,
            Err(e) => return Err(self.fail(e).await),
        };

        let (spec, apply) = match build(self, &disk) {
            Ok(built) => built,
            Err(TransitionError::Precondition(e)) => return Err(self.fail(e).await),
            Err(TransitionError::Sys(e)) => {
                return Err(self.fail(map_sys_error(action, &disk.name, e)).await);
            }
        };

        if let Err(e) = self.runner.run(&spec).await {
            let mapped = map_sys_error(action, &disk.name, e);
            warn!("{action} '{}' failed: {mapped}", disk.name);
            // Record deliberately untouched; re-invoking the action is safe.
            return Err(self.fail(mapped).await);
        }

        match apply {
            Transition::SetState(state) => disk.state = state,
            Transition::Mount(mountpoint) => {
                disk.state = DiskState::Mounted;
                disk.mountpoint = mountpoint;
            }
            Transition::Unmount => {
                disk.state = DiskState::Unmounted;
                disk.mountpoint.clear();
            }
        }

        if let Err(e) = self.datastore.update(&disk).await {
            return Err(self.fail(e).await);
        }

        info!("{action} '{}' succeeded, state is now {}", disk.name, disk.state);
        Ok(self
            .outcome(format!("Disk '{}' {action} complete ({})", disk.name, disk.state))
            .await)
    }
}

/// How a successful command changes the record.
enum Transition {
    SetState(DiskState),
    Mount(String),
    Unmount,
}

/// Why a transition could not even dispatch its command.
enum TransitionError {
    Precondition(LifecycleError),
    Sys(lifecycle_sys::SysError),
}

impl From<lifecycle_sys::SysError> for TransitionError {
    fn from(e: lifecycle_sys::SysError) -> Self {
        Self::Sys(e)
    }
}
