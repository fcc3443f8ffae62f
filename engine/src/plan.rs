//! Per-dataset sync planning.
//!
//! Given what each side currently holds for one dataset, decide which way
//! (if any) the value should flow. Planning is pure: the same inputs always
//! yield the same [`SyncDirection`].
//!
//! # Policy
//!
//! | Local   | Remote  | Direction                    |
//! |---------|---------|------------------------------|
//! | empty   | empty   | none                         |
//! | present | empty   | up                           |
//! | empty   | present | down                         |
//! | present | present | newer side wins, tie is none |
//!
//! This is dataset-granularity last-writer-wins, not a per-record merge.

use crate::freshness::compare_freshness;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Which way a dataset value should be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncDirection {
    /// Leave both sides as they are
    None,
    /// Copy local to remote
    Up,
    /// Copy remote to local
    Down,
}

/// Why a direction was chosen; carried into debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanReason {
    BothEmpty,
    RemoteEmpty,
    LocalEmpty,
    LocalNewer,
    RemoteNewer,
    EquallyFresh,
}

/// A planned action for one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    pub direction: SyncDirection,
    pub reason: PlanReason,
}

impl SyncPlan {
    fn new(direction: SyncDirection, reason: PlanReason) -> Self {
        Self { direction, reason }
    }
}

/// Whether a dataset value counts as present.
///
/// `null`, empty arrays and empty objects are treated as absent.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// Plan bidirectional sync for one dataset.
pub fn plan_sync(local: Option<&Value>, remote: Option<&Value>) -> SyncPlan {
    match (local.filter(|v| is_present(Some(*v))), remote.filter(|v| is_present(Some(*v)))) {
        (None, None) => SyncPlan::new(SyncDirection::None, PlanReason::BothEmpty),
        (Some(_), None) => SyncPlan::new(SyncDirection::Up, PlanReason::RemoteEmpty),
        (None, Some(_)) => SyncPlan::new(SyncDirection::Down, PlanReason::LocalEmpty),
        (Some(l), Some(r)) => match compare_freshness(l, r) {
            Ordering::Greater => SyncPlan::new(SyncDirection::Up, PlanReason::LocalNewer),
            Ordering::Less => SyncPlan::new(SyncDirection::Down, PlanReason::RemoteNewer),
            Ordering::Equal => SyncPlan::new(SyncDirection::None, PlanReason::EquallyFresh),
        },
    }
}

/// Plan a conservative one-way migration for one dataset.
///
/// Only copies up when local has data and remote has none; existing remote
/// data is never overwritten.
pub fn plan_migration(local: Option<&Value>, remote: Option<&Value>) -> SyncDirection {
    if is_present(local) && !is_present(remote) {
        SyncDirection::Up
    } else {
        SyncDirection::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence() {
        assert!(!is_present(None));
        assert!(!is_present(Some(&json!(null))));
        assert!(!is_present(Some(&json!([]))));
        assert!(!is_present(Some(&json!({}))));
        assert!(is_present(Some(&json!([1]))));
        assert!(is_present(Some(&json!({"theme": "dark"}))));
        assert!(is_present(Some(&json!(0))));
        assert!(is_present(Some(&json!(""))));
    }

    #[test]
    fn both_empty() {
        let plan = plan_sync(Some(&json!([])), None);
        assert_eq!(plan.direction, SyncDirection::None);
        assert_eq!(plan.reason, PlanReason::BothEmpty);
    }

    #[test]
    fn local_only_goes_up() {
        let local = json!([{"id": 1, "updatedAt": "2024-01-02"}]);
        assert_eq!(plan_sync(Some(&local), None).direction, SyncDirection::Up);
        assert_eq!(
            plan_sync(Some(&local), Some(&json!({}))).direction,
            SyncDirection::Up
        );
    }

    #[test]
    fn remote_only_goes_down() {
        let remote = json!([{"id": 1, "updatedAt": "2024-03-01"}]);
        assert_eq!(plan_sync(None, Some(&remote)).direction, SyncDirection::Down);
    }

    #[test]
    fn newer_side_wins() {
        let old = json!([{"updatedAt": "2024-01-01"}]);
        let new = json!([{"updatedAt": "2024-06-01"}]);

        let plan = plan_sync(Some(&old), Some(&new));
        assert_eq!(plan, SyncPlan::new(SyncDirection::Down, PlanReason::RemoteNewer));

        let plan = plan_sync(Some(&new), Some(&old));
        assert_eq!(plan, SyncPlan::new(SyncDirection::Up, PlanReason::LocalNewer));
    }

    #[test]
    fn equal_or_undated_is_noop() {
        let a = json!([{"id": 1, "updatedAt": "2024-01-01"}]);
        let b = json!([{"id": 2, "updatedAt": "2024-01-01"}]);
        assert_eq!(plan_sync(Some(&a), Some(&b)).direction, SyncDirection::None);

        let undated = json!({"theme": "dark"});
        assert_eq!(
            plan_sync(Some(&undated), Some(&a)).reason,
            PlanReason::EquallyFresh
        );
    }

    #[test]
    fn migration_never_overwrites_remote() {
        let local = json!([{"id": 1}]);
        let remote = json!([{"id": 9}]);
        assert_eq!(plan_migration(Some(&local), Some(&remote)), SyncDirection::None);
        assert_eq!(plan_migration(Some(&local), Some(&json!([]))), SyncDirection::Up);
        assert_eq!(plan_migration(Some(&local), None), SyncDirection::Up);
        assert_eq!(plan_migration(None, None), SyncDirection::None);
        assert_eq!(plan_migration(Some(&json!([])), None), SyncDirection::None);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_side() -> impl Strategy<Value = Option<Value>> {
            prop_oneof![
                Just(None),
                Just(Some(json!([]))),
                (1u32..28).prop_map(|d| Some(json!([{"updatedAt": format!("2024-01-{:02}", d)}]))),
                Just(Some(json!([{"id": 1}]))),
            ]
        }

        proptest! {
            #[test]
            fn prop_plan_deterministic(local in arb_side(), remote in arb_side()) {
                let first = plan_sync(local.as_ref(), remote.as_ref());
                let second = plan_sync(local.as_ref(), remote.as_ref());
                prop_assert_eq!(first, second);
            }

            #[test]
            fn prop_plan_is_antisymmetric(local in arb_side(), remote in arb_side()) {
                let forward = plan_sync(local.as_ref(), remote.as_ref()).direction;
                let backward = plan_sync(remote.as_ref(), local.as_ref()).direction;
                let mirrored = match forward {
                    SyncDirection::Up => SyncDirection::Down,
                    SyncDirection::Down => SyncDirection::Up,
                    SyncDirection::None => SyncDirection::None,
                };
                prop_assert_eq!(backward, mirrored);
            }
        }
    }
}
