// SPDX-License-Identifier: GPL-3.0-only

//! Authorizer adapters
//!
//! Real deployments plug their own `Authorizer` (session lookup, Polkit,
//! whatever the outer application uses). The adapters here cover the local
//! CLI case and static allow-lists.

use std::collections::HashSet;

use async_trait::async_trait;

use lifecycle_contracts::{Authorizer, LifecycleError};
use lifecycle_types::Principal;

/// Grants every request. Suitable for a local single-user CLI where the OS
/// already gatekeeps via sudo.
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn check(&self, _principal: &Principal) -> Result<bool, LifecycleError> {
        Ok(true)
    }
}

/// Grants only principals whose subject appears in a fixed allow-list.
pub struct SubjectAllowList {
    subjects: HashSet<String>,
}

impl SubjectAllowList {
    pub fn new<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subjects: subjects.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Authorizer for SubjectAllowList {
    async fn check(&self, principal: &Principal) -> Result<bool, LifecycleError> {
        Ok(self.subjects.contains(&principal.subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allow_list_distinguishes_subjects() {
        let authorizer = SubjectAllowList::new(["operator"]);
        assert!(authorizer
            .check(&Principal::new("operator"))
            .await
            .unwrap());
        assert!(!authorizer.check(&Principal::new("guest")).await.unwrap());
    }
}
