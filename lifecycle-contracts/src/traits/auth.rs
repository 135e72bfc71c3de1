// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use lifecycle_types::Principal;

use crate::LifecycleError;

/// Authorization gate consulted before every mutating operation.
///
/// Implementations decide however they like (token lookup, Polkit, a static
/// allow-list); the controller only requires that a rejected call happens
/// *before* any OS action is attempted.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn check(&self, principal: &Principal) -> Result<bool, LifecycleError>;
}
