//! Heuristic privilege level estimation.
//!
//! ```text
//! base       = 2 * permission_count
//! scope      = mean(scope_weight(p.scope))     (0 for an empty list)
//! multiplier = 0.9 for hierarchy clones, else 1.0
//! level      = clamp(round((base + scope) * multiplier), 10, 100)
//! ```
//!
//! An empty permission list therefore estimates to [`MIN_ESTIMATED_LEVEL`].

use crate::models::{CloneType, Permission, PermissionScope};

/// Lowest level the estimator returns.
pub const MIN_ESTIMATED_LEVEL: u32 = 10;

/// Highest level the estimator returns.
pub const MAX_ESTIMATED_LEVEL: u32 = 100;

const HIERARCHY_MULTIPLIER: f64 = 0.9;

/// Weight of a scope in the estimate.
#[must_use]
pub const fn scope_weight(scope: PermissionScope) -> u32 {
    match scope {
        PermissionScope::Platform => 10,
        PermissionScope::Organization => 8,
        PermissionScope::Property => 6,
        PermissionScope::Department => 4,
        PermissionScope::Own => 2,
        PermissionScope::Unknown => 3,
    }
}

/// Estimates a level for `permissions` produced by a `clone_type` clone.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn estimate_level(permissions: &[Permission], clone_type: CloneType) -> u32 {
    let count = permissions.len() as f64;
    let base = 2.0 * count;
    let scope_score = if permissions.is_empty() {
        0.0
    } else {
        let total: u32 = permissions.iter().map(|p| scope_weight(p.scope)).sum();
        f64::from(total) / count
    };
    let multiplier = if clone_type == CloneType::Hierarchy {
        HIERARCHY_MULTIPLIER
    } else {
        1.0
    };

    let raw = ((base + scope_score) * multiplier).round();
    let clamped = raw.clamp(f64::from(MIN_ESTIMATED_LEVEL), f64::from(MAX_ESTIMATED_LEVEL));
    clamped as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn perms(scope: PermissionScope, n: usize) -> Vec<Permission> {
        (0..n)
            .map(|i| Permission::new(format!("p{i}"), "res", "act", scope))
            .collect()
    }

    #[test_case(PermissionScope::Platform, 10)]
    #[test_case(PermissionScope::Organization, 8)]
    #[test_case(PermissionScope::Property, 6)]
    #[test_case(PermissionScope::Department, 4)]
    #[test_case(PermissionScope::Own, 2)]
    #[test_case(PermissionScope::Unknown, 3)]
    fn test_scope_weights(scope: PermissionScope, weight: u32) {
        assert_eq!(scope_weight(scope), weight);
    }

    #[test]
    fn test_empty_list_is_minimum() {
        assert_eq!(estimate_level(&[], CloneType::Full), MIN_ESTIMATED_LEVEL);
        assert_eq!(estimate_level(&[], CloneType::Hierarchy), MIN_ESTIMATED_LEVEL);
    }

    #[test]
    fn test_mixed_scopes() {
        // base 2*2 = 4, scope (6 + 10) / 2 = 8 -> 12
        let list = vec![
            Permission::new("p1", "user", "read", PermissionScope::Property),
            Permission::new("p2", "user", "write", PermissionScope::Platform),
        ];
        assert_eq!(estimate_level(&list, CloneType::Full), 12);
    }

    #[test]
    fn test_hierarchy_multiplier() {
        // (2*10 + 10) * 0.9 = 27
        assert_eq!(estimate_level(&perms(PermissionScope::Platform, 10), CloneType::Hierarchy), 27);
        assert_eq!(estimate_level(&perms(PermissionScope::Platform, 10), CloneType::Full), 30);
    }

    #[test]
    fn test_clamped_to_maximum() {
        assert_eq!(
            estimate_level(&perms(PermissionScope::Platform, 200), CloneType::Full),
            MAX_ESTIMATED_LEVEL
        );
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // base 2*2 = 4, scope (6 + 3) / 2 = 4.5 -> 8.5 -> 9 -> clamped to 10
        let list = vec![
            Permission::new("p1", "a", "b", PermissionScope::Property),
            Permission::new("p2", "a", "b", PermissionScope::Unknown),
        ];
        assert_eq!(estimate_level(&list, CloneType::Full), 10);
        // base 2*5 = 10, scope 4.4 -> 14.4 -> 14
        let mut list = perms(PermissionScope::Department, 4);
        list.push(Permission::new("p9", "a", "b", PermissionScope::Property));
        assert_eq!(estimate_level(&list, CloneType::Full), 14);
    }
}
