// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the disk lifecycle manager
//!
//! This crate defines the single source of truth for the disk domain types.
//! These models are used throughout the stack:
//!
//! - **lifecycle-sys**: discovery emits `DiskDraft`, commands are described
//!   by `CommandSpec` and report `CommandResult`
//! - **lifecycle-service**: the controller and datastore persist and mutate
//!   `Disk` records and return `OperationOutcome` to any presentation layer

pub mod command;
pub mod disk;
pub mod outcome;
pub mod principal;

pub use command::{CommandResult, CommandSpec};
pub use disk::{Disk, DiskDraft, DiskState};
pub use outcome::OperationOutcome;
pub use principal::Principal;
