// SPDX-License-Identifier: GPL-3.0-only

//! Disk lifecycle manager service
//!
//! Ties the pieces together: the [`DiskLifecycleController`] drives
//! privileged state transitions through the sys layer and records outcomes
//! in the datastore; the [`Reconciler`] seeds the datastore from discovery
//! without clobbering controller-owned fields.

pub mod auth;
pub mod config;
pub mod controller;
pub mod datastore;
pub mod error;
pub mod reconciler;

pub use auth::{AllowAll, SubjectAllowList};
pub use config::ServiceConfig;
pub use controller::{DiskLifecycleController, OperationError};
pub use datastore::MemoryDatastore;
pub use reconciler::Reconciler;
