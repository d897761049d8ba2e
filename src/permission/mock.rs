//! Scripted permission platform for tests and demos.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{MODERN_API_LEVEL, Permission, PermissionModel, PermissionPlatform};
use crate::error::AdapterError;

/// A permission platform whose answers are fixed up front.
///
/// Granted requests are remembered, like a real platform would.
pub struct ScriptedPermissions {
    model: PermissionModel,
    granted: Mutex<HashSet<Permission>>,
    approve: bool,
    fail_checks: bool,
    requests: Mutex<Vec<Vec<Permission>>>,
}

impl ScriptedPermissions {
    pub fn new(model: PermissionModel) -> Self {
        Self {
            model,
            granted: Mutex::new(HashSet::new()),
            approve: false,
            fail_checks: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn modern() -> Self {
        Self::new(PermissionModel::Runtime {
            api_level: MODERN_API_LEVEL,
        })
    }

    pub fn legacy() -> Self {
        Self::new(PermissionModel::Runtime { api_level: 29 })
    }

    pub fn with_granted(self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        lock(&self.granted).extend(permissions);
        self
    }

    pub fn granting_all(self) -> Self {
        let required = self.model.required();
        self.with_granted(required)
    }

    /// Whether the simulated user approves permission dialogs.
    pub fn approving(mut self, approve: bool) -> Self {
        self.approve = approve;
        self
    }

    pub fn failing_checks(mut self) -> Self {
        self.fail_checks = true;
        self
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> Vec<Vec<Permission>> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PermissionPlatform for ScriptedPermissions {
    fn model(&self) -> PermissionModel {
        self.model
    }

    async fn check(&self, permission: Permission) -> Result<bool, AdapterError> {
        if self.fail_checks {
            return Err(AdapterError::Platform("permission service unavailable".into()));
        }
        Ok(lock(&self.granted).contains(&permission))
    }

    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<HashMap<Permission, bool>, AdapterError> {
        lock(&self.requests).push(permissions.to_vec());
        if self.approve {
            lock(&self.granted).extend(permissions.iter().copied());
        }
        Ok(permissions.iter().map(|p| (*p, self.approve)).collect())
    }
}
