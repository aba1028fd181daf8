//! Authenticated Principal
//!
//! プロバイダ確認済みのユーザー像。role の集合と、このセッションで
//! 有効な active role を一つ持つ。

use std::collections::BTreeSet;

use crate::domain::credentials::Identity;

/// Errors building a principal from provider output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    /// Provider confirmed the identity but granted no roles
    #[error("provider returned no roles for authenticated identity")]
    NoRoles,

    /// Restored active role is not a member of the role set
    #[error("active role is not in the granted role set")]
    ActiveRoleNotGranted,
}

/// Verified user with granted roles
///
/// The active role is the single role all downstream authorization
/// decisions in this session are made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    identity: Identity,
    roles: BTreeSet<String>,
    active_role: String,
}

impl Principal {
    /// Build a principal from a provider's role list
    ///
    /// The provider's first-listed role becomes the active role; the rest
    /// are kept as the granted set. Duplicate role names collapse.
    pub fn from_provider_roles(
        identity: Identity,
        provider_roles: Vec<String>,
    ) -> Result<Self, PrincipalError> {
        let active_role = provider_roles.first().cloned().ok_or(PrincipalError::NoRoles)?;
        let roles: BTreeSet<String> = provider_roles.into_iter().collect();
        Ok(Self {
            identity,
            roles,
            active_role,
        })
    }

    /// Restore a principal from verified token claims
    pub fn restore(
        identity: Identity,
        roles: BTreeSet<String>,
        active_role: String,
    ) -> Result<Self, PrincipalError> {
        if roles.is_empty() {
            return Err(PrincipalError::NoRoles);
        }
        if !roles.contains(&active_role) {
            return Err(PrincipalError::ActiveRoleNotGranted);
        }
        Ok(Self {
            identity,
            roles,
            active_role,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn active_role(&self) -> &str {
        &self.active_role
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::parse("user@tenant.example").unwrap()
    }

    #[test]
    fn test_first_provider_role_becomes_active() {
        let principal = Principal::from_provider_roles(
            identity(),
            vec!["onboarding-agent".into(), "viewer".into()],
        )
        .unwrap();

        assert_eq!(principal.active_role(), "onboarding-agent");
        assert!(principal.has_role("viewer"));
        assert_eq!(principal.roles().len(), 2);
    }

    #[test]
    fn test_duplicate_roles_collapse() {
        let principal = Principal::from_provider_roles(
            identity(),
            vec!["viewer".into(), "viewer".into()],
        )
        .unwrap();
        assert_eq!(principal.roles().len(), 1);
    }

    #[test]
    fn test_empty_role_list_rejected() {
        assert_eq!(
            Principal::from_provider_roles(identity(), vec![]).unwrap_err(),
            PrincipalError::NoRoles
        );
    }

    #[test]
    fn test_restore_checks_active_role_membership() {
        let roles: BTreeSet<String> = ["viewer".to_string()].into();
        assert_eq!(
            Principal::restore(identity(), roles, "admin".into()).unwrap_err(),
            PrincipalError::ActiveRoleNotGranted
        );
    }
}
