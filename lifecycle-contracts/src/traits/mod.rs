// SPDX-License-Identifier: GPL-3.0-only

mod auth;
mod datastore;

pub use auth::Authorizer;
pub use datastore::Datastore;
