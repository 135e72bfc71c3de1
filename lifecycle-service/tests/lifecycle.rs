// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end lifecycle tests with a scripted command runner
//!
//! No real OS commands run here: the fake runner records every dispatched
//! spec and answers from a script, so the tests pin down exactly which
//! commands the controller issues and how stored state reacts.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lifecycle_contracts::{Authorizer, Datastore, LifecycleError};
use lifecycle_service::{AllowAll, DiskLifecycleController, MemoryDatastore, Reconciler};
use lifecycle_sys::{
    CommandExecutor, DiskDiscoverer, LinuxPlatform, SysError, WindowsPlatform,
};
use lifecycle_types::{CommandResult, CommandSpec, DiskDraft, DiskState, Principal};

/// One scripted answer for the fake runner.
enum Response {
    Success { exit_code: i32 },
    Fail { exit_code: i32, stderr: &'static str },
    Timeout,
}

struct FakeRunner {
    script: Mutex<VecDeque<Response>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    fn new(script: Vec<Response>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Succeeds every command with exit code 0.
    fn always_ok() -> Arc<Self> {
        Self::new(Vec::new())
    }

    async fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl CommandExecutor for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, SysError> {
        self.calls.lock().await.push(spec.clone());
        let response = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Response::Success { exit_code: 0 });
        match response {
            Response::Success { exit_code } => Ok(CommandResult {
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr: String::new(),
                succeeded: true,
                duration: Duration::from_millis(1),
            }),
            Response::Fail { exit_code, stderr } => Err(SysError::CommandFailed {
                program: spec.program().to_string(),
                exit_code: Some(exit_code),
                stderr: stderr.to_string(),
            }),
            Response::Timeout => Err(SysError::CommandTimeout {
                program: spec.program().to_string(),
                timeout_secs: 60,
            }),
        }
    }
}

struct DenyAll;

#[async_trait]
impl Authorizer for DenyAll {
    async fn check(&self, _principal: &Principal) -> Result<bool, LifecycleError> {
        Ok(false)
    }
}

fn controller(
    datastore: Arc<MemoryDatastore>,
    runner: Arc<FakeRunner>,
) -> DiskLifecycleController {
    DiskLifecycleController::new(datastore, Arc::new(AllowAll), runner, Arc::new(LinuxPlatform))
}

fn principal() -> Principal {
    Principal::new("operator")
}

#[tokio::test]
async fn duplicate_registration_conflicts_and_keeps_one_record() {
    let datastore = Arc::new(MemoryDatastore::new());
    let controller = controller(datastore.clone(), FakeRunner::always_ok());

    controller
        .register(&principal(), DiskDraft::new("sdb", 1024, "ext4"))
        .await
        .expect("first registration succeeds");

    let failure = controller
        .register(&principal(), DiskDraft::new("sdb", 2048, "ext4"))
        .await
        .expect_err("second registration conflicts");
    assert!(matches!(failure.error, LifecycleError::Conflict(_)));

    let stored = datastore.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].size_mb, 1024);
    // The failure response carries the current listing.
    assert_eq!(failure.disks, stored);
}

#[tokio::test]
async fn mount_treats_sentinel_exit_code_as_success() {
    let datastore = Arc::new(MemoryDatastore::new());
    let runner = FakeRunner::new(vec![Response::Success { exit_code: 64 }]);
    let controller = controller(datastore.clone(), runner.clone());

    let disk = datastore
        .create(DiskDraft::new("sdb", 1024, "ext4"), DiskState::Discovered)
        .await
        .unwrap();

    controller
        .mount(&principal(), disk.id, "/mnt/data")
        .await
        .expect("exit 64 means already mounted, which is success");

    let stored = datastore.get_by_id(disk.id).await.unwrap().unwrap();
    assert_eq!(stored.state, DiskState::Mounted);
    assert_eq!(stored.mountpoint, "/mnt/data");

    let calls = runner.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].accept_already_done);
}

#[tokio::test]
async fn failed_format_leaves_the_record_untouched() {
    let datastore = Arc::new(MemoryDatastore::new());
    let runner = FakeRunner::new(vec![Response::Fail {
        exit_code: 1,
        stderr: "mkfs.ext4: device is busy",
    }]);
    let controller = controller(datastore.clone(), runner);

    let disk = datastore
        .create(DiskDraft::new("sdb", 1024, "ext4"), DiskState::Discovered)
        .await
        .unwrap();

    let failure = controller
        .format(&principal(), disk.id)
        .await
        .expect_err("format must fail");
    match &failure.error {
        LifecycleError::CommandFailed {
            action,
            disk: disk_name,
            exit_code,
            detail,
        } => {
            assert_eq!(action, "format");
            assert_eq!(disk_name, "sdb");
            assert_eq!(*exit_code, Some(1));
            assert_eq!(detail, "mkfs.ext4: device is busy");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    assert!(failure.error.is_retryable());

    let stored = datastore.get_by_id(disk.id).await.unwrap().unwrap();
    assert_eq!(stored.state, DiskState::Discovered);
}

#[tokio::test]
async fn timeout_is_a_failed_execution() {
    let datastore = Arc::new(MemoryDatastore::new());
    let runner = FakeRunner::new(vec![Response::Timeout]);
    let controller = controller(datastore.clone(), runner);

    let disk = datastore
        .create(DiskDraft::new("sdb", 1024, "ext4"), DiskState::Discovered)
        .await
        .unwrap();

    let failure = controller.wipe(&principal(), disk.id).await.unwrap_err();
    assert!(matches!(
        failure.error,
        LifecycleError::CommandTimeout { .. }
    ));
    assert_eq!(
        datastore.get_by_id(disk.id).await.unwrap().unwrap().state,
        DiskState::Discovered
    );
}

#[tokio::test]
async fn unauthorized_calls_dispatch_no_commands() {
    let datastore = Arc::new(MemoryDatastore::new());
    let runner = FakeRunner::always_ok();
    let controller = DiskLifecycleController::new(
        datastore.clone(),
        Arc::new(DenyAll),
        runner.clone(),
        Arc::new(LinuxPlatform),
    );

    let disk = datastore
        .create(DiskDraft::new("sdb", 1024, "ext4"), DiskState::Discovered)
        .await
        .unwrap();

    let failure = controller.format(&principal(), disk.id).await.unwrap_err();
    assert!(matches!(failure.error, LifecycleError::Unauthorized(_)));
    assert!(runner.calls().await.is_empty());
    assert_eq!(
        datastore.get_by_id(disk.id).await.unwrap().unwrap().state,
        DiskState::Discovered
    );
}

#[tokio::test]
async fn wipe_is_unsupported_on_windows_and_changes_nothing() {
    let datastore = Arc::new(MemoryDatastore::new());
    let runner = FakeRunner::always_ok();
    let controller = DiskLifecycleController::new(
        datastore.clone(),
        Arc::new(AllowAll),
        runner.clone(),
        Arc::new(WindowsPlatform),
    );

    let disk = datastore
        .create(DiskDraft::new("D:", 1024, "NTFS"), DiskState::Discovered)
        .await
        .unwrap();

    let failure = controller.wipe(&principal(), disk.id).await.unwrap_err();
    assert!(matches!(failure.error, LifecycleError::Unsupported(_)));
    assert!(runner.calls().await.is_empty());
}

#[tokio::test]
async fn register_mount_unmount_roundtrip() {
    let datastore = Arc::new(MemoryDatastore::new());
    let runner = FakeRunner::always_ok();
    let controller = controller(datastore.clone(), runner.clone());

    let outcome = controller
        .register(&principal(), DiskDraft::new("sdb", 1024, "ext4"))
        .await
        .unwrap();
    let id = outcome.disks.iter().find(|d| d.name == "sdb").unwrap().id;
    assert_eq!(
        datastore.get_by_id(id).await.unwrap().unwrap().state,
        DiskState::Discovered
    );

    controller
        .mount(&principal(), id, "/mnt/data")
        .await
        .unwrap();
    let mounted = datastore.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(mounted.state, DiskState::Mounted);
    assert_eq!(mounted.mountpoint, "/mnt/data");

    // Mounting again is rejected before any command is dispatched.
    let failure = controller
        .mount(&principal(), id, "/mnt/other")
        .await
        .unwrap_err();
    assert!(matches!(failure.error, LifecycleError::Conflict(_)));

    controller.unmount(&principal(), id).await.unwrap();
    let unmounted = datastore.get_by_id(id).await.unwrap().unwrap();
    // The record persists as Unmounted with its mountpoint cleared; unmount
    // never deletes.
    assert_eq!(unmounted.state, DiskState::Unmounted);
    assert_eq!(unmounted.mountpoint, "");

    let calls = runner.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].argv,
        vec!["sudo", "-S", "-p", "", "mount", "/dev/sdb", "/mnt/data"]
    );
    assert_eq!(
        calls[1].argv,
        vec!["sudo", "-S", "-p", "", "umount", "-l", "/dev/sdb"]
    );
}

#[tokio::test]
async fn concurrent_mounts_of_one_disk_dispatch_one_command() {
    let datastore = Arc::new(MemoryDatastore::new());
    let runner = FakeRunner::always_ok();
    let controller = Arc::new(controller(datastore.clone(), runner.clone()));

    let disk = datastore
        .create(DiskDraft::new("sdb", 1024, "ext4"), DiskState::Discovered)
        .await
        .unwrap();

    let first = controller.clone();
    let second = controller.clone();
    let id = disk.id;
    let caller = principal();
    let (a, b) = tokio::join!(
        first.mount(&caller, id, "/mnt/a"),
        second.mount(&caller, id, "/mnt/b"),
    );

    // The per-name lock serializes the two calls: exactly one mounts, the
    // other re-reads Mounted state and conflicts.
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(runner.calls().await.len(), 1);
    assert_eq!(
        datastore.get_by_id(id).await.unwrap().unwrap().state,
        DiskState::Mounted
    );
}

const LSBLK_FIXTURE: &str = r#"{
    "blockdevices": [
        {"name": "sda", "type": "disk", "size": "100G"},
        {"name": "sda1", "type": "part", "size": "512M"},
        {"name": "sdb", "type": "disk", "size": "32G"}
    ]
}"#;

struct DiscoveryRunner;

#[async_trait]
impl CommandExecutor for DiscoveryRunner {
    async fn run(&self, _spec: &CommandSpec) -> Result<CommandResult, SysError> {
        Ok(CommandResult {
            exit_code: Some(0),
            stdout: LSBLK_FIXTURE.to_string(),
            stderr: String::new(),
            succeeded: true,
            duration: Duration::from_millis(1),
        })
    }
}

#[tokio::test]
async fn reconcile_is_idempotent_and_preserves_controller_owned_fields() {
    let datastore = Arc::new(MemoryDatastore::new());
    let discoverer = DiskDiscoverer::new(Arc::new(LinuxPlatform), Arc::new(DiscoveryRunner));
    let reconciler = Reconciler::new(discoverer, datastore.clone());

    assert_eq!(reconciler.reconcile().await.unwrap(), 2);
    let seeded = datastore.list_all().await.unwrap();
    assert_eq!(seeded.len(), 2);
    assert!(seeded.iter().all(|d| d.state == DiskState::Discovered));

    // Mount sdb through the controller, then rediscover.
    let controller = controller(datastore.clone(), FakeRunner::always_ok());
    let sdb = datastore.get_by_name("sdb").await.unwrap().unwrap();
    controller
        .mount(&principal(), sdb.id, "/mnt/usb")
        .await
        .unwrap();

    assert_eq!(reconciler.reconcile().await.unwrap(), 0);
    let after = datastore.list_all().await.unwrap();
    assert_eq!(after.len(), 2);
    let sdb = datastore.get_by_name("sdb").await.unwrap().unwrap();
    assert_eq!(sdb.state, DiskState::Mounted);
    assert_eq!(sdb.mountpoint, "/mnt/usb");
}
