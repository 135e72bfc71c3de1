// SPDX-License-Identifier: GPL-3.0-only

//! Collaborator contracts for the disk lifecycle manager
//!
//! The lifecycle core treats authentication and persistence as external
//! collaborators, visible only through the two traits defined here:
//!
//! - [`Authorizer`] — yes/no gate consulted before any mutating operation
//! - [`Datastore`] — CRUD surface over persisted [`Disk`](lifecycle_types::Disk)
//!   records
//!
//! The crate also carries [`LifecycleError`], the structured error taxonomy
//! shared by the sys layer, the controller and any presentation layer.

pub mod error;
pub mod traits;

pub use error::{LifecycleError, LifecycleErrorKind};
pub use traits::{Authorizer, Datastore};
