//! # Access & Safety Gate
//!
//! Role checks and the pause switch.
//!
//! Two independent capabilities guard the engine:
//!
//! - **admin**: deal creation, lifecycle transitions, pause, configuration
//! - **owner**: custody withdrawals, admin membership, logic upgrades
//!
//! The deployer becomes owner and also holds admin.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::value_objects::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Capability a caller must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Operational role.
    Admin,
    /// Custody and governance role.
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

/// Role membership plus the pause flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGate {
    owner: Address,
    admins: BTreeSet<Address>,
    paused: bool,
}

impl AccessGate {
    /// Creates a gate where `owner` and `initial_admin` hold admin.
    #[must_use]
    pub fn new(owner: Address, initial_admin: Address) -> Self {
        Self {
            owner,
            admins: BTreeSet::from([owner, initial_admin]),
            paused: false,
        }
    }

    /// Returns the owner.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Returns true if `account` holds `role`.
    #[must_use]
    pub fn has_role(&self, account: Address, role: Role) -> bool {
        match role {
            Role::Owner => account == self.owner,
            Role::Admin => self.admins.contains(&account),
        }
    }

    /// Checks that `caller` holds `role`.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Unauthorized` otherwise.
    pub fn require(&self, caller: Address, role: Role) -> ApplicationResult<()> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            Err(ApplicationError::unauthorized(role, caller))
        }
    }

    /// Returns true while deal operations are paused.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Checks that deal operations are not paused.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Paused` while paused.
    pub fn ensure_running(&self) -> ApplicationResult<()> {
        if self.paused {
            Err(ApplicationError::Paused)
        } else {
            Ok(())
        }
    }

    /// Pauses deal operations.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Paused` if already paused.
    pub fn pause(&mut self) -> ApplicationResult<()> {
        self.ensure_running()?;
        self.paused = true;
        Ok(())
    }

    /// Resumes deal operations.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Validation` if not paused.
    pub fn unpause(&mut self) -> ApplicationResult<()> {
        if !self.paused {
            return Err(ApplicationError::validation("engine is not paused"));
        }
        self.paused = false;
        Ok(())
    }

    /// Grants admin to `account`. Returns false if it already held it.
    pub fn grant_admin(&mut self, account: Address) -> bool {
        self.admins.insert(account)
    }

    /// Revokes admin from `account`.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Validation` if `account` is the owner or
    /// does not hold admin.
    pub fn revoke_admin(&mut self, account: Address) -> ApplicationResult<()> {
        if account == self.owner {
            return Err(ApplicationError::validation("the owner always holds admin"));
        }
        if !self.admins.remove(&account) {
            return Err(ApplicationError::validation(format!(
                "{account:?} does not hold admin"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;

    fn owner() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn admin() -> Address {
        Address::repeat_byte(0xad)
    }

    fn stranger() -> Address {
        Address::repeat_byte(0x99)
    }

    #[test]
    fn owner_and_initial_admin_hold_admin() {
        let gate = AccessGate::new(owner(), admin());
        assert!(gate.has_role(owner(), Role::Admin));
        assert!(gate.has_role(admin(), Role::Admin));
        assert!(gate.has_role(owner(), Role::Owner));
        assert!(!gate.has_role(admin(), Role::Owner));
    }

    #[test]
    fn stranger_is_unauthorized() {
        let gate = AccessGate::new(owner(), admin());
        let err = gate.require(stranger(), Role::Admin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn pause_toggles() {
        let mut gate = AccessGate::new(owner(), admin());
        gate.pause().unwrap();
        assert_eq!(gate.ensure_running().unwrap_err().kind(), ErrorKind::Paused);
        assert!(gate.pause().is_err());
        gate.unpause().unwrap();
        assert!(gate.ensure_running().is_ok());
        assert!(gate.unpause().is_err());
    }

    #[test]
    fn grant_and_revoke_admin() {
        let mut gate = AccessGate::new(owner(), admin());
        assert!(gate.grant_admin(stranger()));
        assert!(!gate.grant_admin(stranger()));
        gate.revoke_admin(stranger()).unwrap();
        assert!(!gate.has_role(stranger(), Role::Admin));
        assert!(gate.revoke_admin(stranger()).is_err());
    }

    #[test]
    fn owner_admin_cannot_be_revoked() {
        let mut gate = AccessGate::new(owner(), admin());
        assert!(gate.revoke_admin(owner()).is_err());
    }
}
