//! Authorization service implementation
//!
//! Answers "is this user an administrator" from the configured admin list.
//! Authentication itself happens in front of this crate; callers pass an
//! already-resolved user id.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::AdminConfig;
use crate::utils::errors::{AsakatsuError, Result};

/// Permission levels for different operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Apply to and cancel events
    Member,
    /// Create, edit and delete events
    Admin,
}

/// Authorization service for event management
#[derive(Debug, Clone)]
pub struct AuthService {
    admin_ids: HashSet<i64>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            admin_ids: config.user_ids.iter().copied().collect(),
        }
    }

    /// Check if user is an administrator
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Highest permission the user holds
    pub fn permission_for(&self, user_id: i64) -> Permission {
        if self.is_admin(user_id) {
            Permission::Admin
        } else {
            Permission::Member
        }
    }

    /// Fail with `PermissionDenied` unless the user is an administrator
    pub fn require_admin(&self, user_id: i64, action: &str) -> Result<()> {
        if self.is_admin(user_id) {
            debug!(user_id = user_id, action = action, "Admin permission granted");
            return Ok(());
        }

        warn!(user_id = user_id, action = action, "Admin permission denied");
        Err(AsakatsuError::PermissionDenied(format!(
            "User {} may not {}",
            user_id, action
        )))
    }
}
