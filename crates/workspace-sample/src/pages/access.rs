//! Access guards wrapped around workspace pages.

use crate::model::{Policy, PolicyFeature};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGuard {
    /// The viewer administers the workspace.
    Admin,
    /// The workspace is on a paid plan.
    PaidPolicy,
    FeatureEnabled(PolicyFeature),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("Workspace not loaded")]
    MissingPolicy,
    #[error("Workspace is being deleted")]
    PendingDelete,
    #[error("Not a workspace admin")]
    NotAdmin,
    #[error("Not a paid workspace")]
    NotPaid,
    #[error("Feature {0:?} is disabled")]
    FeatureDisabled(PolicyFeature),
    #[error("Workspace has no distance unit")]
    MissingCustomUnit,
}

impl AccessGuard {
    pub fn check(&self, policy: &Policy) -> Result<(), AccessDenied> {
        match self {
            AccessGuard::Admin if policy.is_pending_delete() => Err(AccessDenied::PendingDelete),
            AccessGuard::Admin if !policy.is_admin() => Err(AccessDenied::NotAdmin),
            AccessGuard::PaidPolicy if !policy.is_paid_group() => Err(AccessDenied::NotPaid),
            AccessGuard::FeatureEnabled(feature) if !policy.is_feature_enabled(*feature) => {
                Err(AccessDenied::FeatureDisabled(*feature))
            }
            _ => Ok(()),
        }
    }
}

/// Runs `guards` in order; the first failure wins.
pub fn check_access<'a>(
    policy: Option<&'a Policy>,
    guards: &[AccessGuard],
) -> Result<&'a Policy, AccessDenied> {
    let policy = policy
        .filter(|p| !p.id.is_empty())
        .ok_or(AccessDenied::MissingPolicy)?;
    guards.iter().try_for_each(|guard| guard.check(policy))?;
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PolicyRole, PolicyType};
    use record_store::PendingAction;

    const ALL: [AccessGuard; 3] = [
        AccessGuard::Admin,
        AccessGuard::PaidPolicy,
        AccessGuard::FeatureEnabled(PolicyFeature::DistanceRates),
    ];

    fn admin_team_policy() -> Policy {
        Policy {
            id: "P1".into(),
            role: PolicyRole::Admin,
            policy_type: PolicyType::Team,
            are_distance_rates_enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_all_guards_pass() {
        let policy = admin_team_policy();
        assert!(check_access(Some(&policy), &ALL).is_ok());
    }

    #[test]
    fn test_each_guard_can_deny() {
        assert_eq!(check_access(None, &ALL), Err(AccessDenied::MissingPolicy));

        let mut policy = admin_team_policy();
        policy.role = PolicyRole::User;
        assert_eq!(check_access(Some(&policy), &ALL), Err(AccessDenied::NotAdmin));

        let mut policy = admin_team_policy();
        policy.policy_type = PolicyType::Personal;
        assert_eq!(check_access(Some(&policy), &ALL), Err(AccessDenied::NotPaid));

        let mut policy = admin_team_policy();
        policy.are_distance_rates_enabled = false;
        assert_eq!(
            check_access(Some(&policy), &ALL),
            Err(AccessDenied::FeatureDisabled(PolicyFeature::DistanceRates))
        );

        let mut policy = admin_team_policy();
        policy.pending_action = Some(PendingAction::Delete);
        assert_eq!(check_access(Some(&policy), &ALL), Err(AccessDenied::PendingDelete));
    }

    #[test]
    fn test_guards_only_check_what_they_name() {
        let mut policy = admin_team_policy();
        policy.are_distance_rates_enabled = false;
        assert!(check_access(Some(&policy), &[AccessGuard::Admin, AccessGuard::PaidPolicy]).is_ok());
    }
}
