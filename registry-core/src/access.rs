//! Role and approval membership
//!
//! Mirrors the usual on-chain access-control contract: a role is a 32-byte
//! identifier, membership is `(role, account) -> bool`, and every mutation is
//! gated on the caller holding [`Role::DEFAULT_ADMIN`]. Gating failures use
//! the standard `AccessControl: account .. is missing role ..` revert text.

use crate::types::{Address, Role};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Ledger-resident role membership and university approval set
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    members: HashMap<Role, HashSet<Address>>,
    approved_universities: HashSet<String>,
}

impl AccessControl {
    /// New access control with `admin` holding the admin role
    pub fn with_admin(admin: Address) -> Self {
        let mut access = Self::default();
        access.members.entry(Role::DEFAULT_ADMIN).or_default().insert(admin);
        access
    }

    /// Role membership
    pub fn has_role(&self, role: &Role, account: &Address) -> bool {
        self.members
            .get(role)
            .map(|members| members.contains(account))
            .unwrap_or(false)
    }

    /// Revert unless `account` holds `role`
    pub fn check_role(&self, role: &Role, account: &Address) -> Result<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(Error::revert(format!(
                "AccessControl: account {} is missing role {}",
                account, role
            )))
        }
    }

    /// Revert unless `account` is an administrator
    pub fn check_admin(&self, account: &Address) -> Result<()> {
        self.check_role(&Role::DEFAULT_ADMIN, account)
    }

    /// Grant `role` to `account`. Returns true if membership changed.
    pub fn grant_role(&mut self, sender: &Address, role: Role, account: Address) -> Result<bool> {
        self.check_admin(sender)?;
        Ok(self.members.entry(role).or_default().insert(account))
    }

    /// Revoke `role` from `account`. Returns true if membership changed.
    pub fn revoke_role(&mut self, sender: &Address, role: &Role, account: &Address) -> Result<bool> {
        self.check_admin(sender)?;
        Ok(self
            .members
            .get_mut(role)
            .map(|members| members.remove(account))
            .unwrap_or(false))
    }

    /// Validate an approval without applying it
    pub fn check_approve_university(&self, sender: &Address, name: &str) -> Result<()> {
        self.check_admin(sender)?;
        if name.trim().is_empty() {
            return Err(Error::revert("University name cannot be empty"));
        }
        Ok(())
    }

    /// Approve a university. Returns true if it was not approved before.
    pub fn approve_university(&mut self, sender: &Address, name: &str) -> Result<bool> {
        self.check_approve_university(sender, name)?;
        Ok(self.approved_universities.insert(name.to_string()))
    }

    /// University approval
    pub fn university_approved(&self, name: &str) -> bool {
        self.approved_universities.contains(name)
    }
}
