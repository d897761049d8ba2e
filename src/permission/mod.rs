//! # Permission Gate
//!
//! Confirms the process may scan for and connect to Bluetooth devices.
//!
//! | Platform | Required permissions |
//! |----------|----------------------|
//! | No runtime model (Linux, desktop) | none, always granted |
//! | Runtime model, API < 31 | coarse + fine location |
//! | Runtime model, API >= 31 | Bluetooth scan + Bluetooth connect |
//!
//! Grants are never cached: every print attempt checks again.

pub mod mock;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AdapterError;

/// First API level with the explicit Bluetooth scan/connect permissions.
pub const MODERN_API_LEVEL: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    CoarseLocation,
    FineLocation,
    BluetoothScan,
    BluetoothConnect,
}

impl Permission {
    /// Platform identifier of the permission.
    pub fn id(&self) -> &'static str {
        match self {
            Permission::CoarseLocation => "android.permission.ACCESS_COARSE_LOCATION",
            Permission::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Permission::BluetoothScan => "android.permission.BLUETOOTH_SCAN",
            Permission::BluetoothConnect => "android.permission.BLUETOOTH_CONNECT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionModel {
    /// Nothing to ask for.
    None,
    /// Permissions are granted at runtime; the set depends on the API level.
    Runtime { api_level: u32 },
}

impl PermissionModel {
    pub fn required(&self) -> Vec<Permission> {
        match *self {
            PermissionModel::None => Vec::new(),
            PermissionModel::Runtime { api_level } if api_level >= MODERN_API_LEVEL => {
                vec![Permission::BluetoothScan, Permission::BluetoothConnect]
            }
            PermissionModel::Runtime { .. } => {
                vec![Permission::FineLocation, Permission::CoarseLocation]
            }
        }
    }
}

/// Platform permission primitives.
#[async_trait]
pub trait PermissionPlatform: Send + Sync {
    fn model(&self) -> PermissionModel;

    /// Whether `permission` is currently granted.
    async fn check(&self, permission: Permission) -> Result<bool, AdapterError>;

    /// Ask the user for `permissions`. May suspend until a dialog is answered.
    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<HashMap<Permission, bool>, AdapterError>;
}

/// Hosts without a runtime permission model.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPermissions;

#[async_trait]
impl PermissionPlatform for HostPermissions {
    fn model(&self) -> PermissionModel {
        PermissionModel::None
    }

    async fn check(&self, _permission: Permission) -> Result<bool, AdapterError> {
        Ok(true)
    }

    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<HashMap<Permission, bool>, AdapterError> {
        Ok(permissions.iter().map(|p| (*p, true)).collect())
    }
}

pub struct PermissionGate {
    platform: Arc<dyn PermissionPlatform>,
}

impl PermissionGate {
    pub fn new(platform: Arc<dyn PermissionPlatform>) -> Self {
        Self { platform }
    }

    /// Returns `true` if every required permission is granted, prompting for
    /// the missing ones. Platform errors count as a denial.
    pub async fn ensure(&self) -> bool {
        let model = self.platform.model();
        let required = model.required();
        if required.is_empty() {
            return true;
        }

        let mut missing = Vec::new();
        for permission in required {
            match self.platform.check(permission).await {
                Ok(true) => {}
                Ok(false) => missing.push(permission),
                Err(e) => {
                    tracing::warn!(permission = permission.id(), error = %e, "Permission check failed");
                    return false;
                }
            }
        }

        if missing.is_empty() {
            tracing::debug!(?model, "Permissions already granted");
            return true;
        }

        tracing::info!(?missing, "Requesting permissions");
        let results = match self.platform.request(&missing).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, "Permission request failed");
                return false;
            }
        };

        let granted = missing
            .iter()
            .all(|p| results.get(p).copied().unwrap_or(false));
        if !granted {
            tracing::warn!(?results, "Permissions denied");
        }
        granted
    }
}
