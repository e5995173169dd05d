//! Condition model.
//!
//! Builds the conditions reconcilers report and merges a pass's conditions
//! into the parent status, one entry per condition type.

use crds::{Condition, ConditionStatus};

/// Machine-readable condition reasons
pub mod reasons {
    pub const SUCCESS: &str = "Success";
    pub const NOT_CONFIGURED: &str = "NotConfigured";
    pub const ADDON_PARAMETERS_SECRET_NOT_PRESENT: &str = "AddonParametersSecretNotPresent";
    pub const ADDON_PARAMETERS_SECRET_NOT_VALID: &str = "AddonParametersSecretNotValid";
    pub const FETCH_FAILED: &str = "FetchFailed";
    pub const CREATE_OR_PATCH_FAILED: &str = "CreateOrPatchFailed";
    pub const INVALID_INPUT: &str = "InvalidInput";
}

pub fn success(condition_type: &str, message: impl Into<String>) -> Condition {
    Condition::new(condition_type, ConditionStatus::True, reasons::SUCCESS, message)
}

/// Informational skip: the step did nothing, and that is not an error
pub fn skipped(condition_type: &str, reason: &str, message: impl Into<String>) -> Condition {
    Condition::new(condition_type, ConditionStatus::True, reason, message)
}

pub fn failed(condition_type: &str, reason: &str, error: &impl std::fmt::Display) -> Condition {
    Condition::new(condition_type, ConditionStatus::False, reason, error.to_string())
}

#[cfg(test)]
pub fn find<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == condition_type)
}

/// Insert or replace the condition of the same type.
///
/// The previous transition time is kept when the status value did not change.
pub fn set_condition(conditions: &mut Vec<Condition>, mut new: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == new.type_) {
        Some(existing) => {
            if existing.status == new.status {
                new.last_transition_time = existing.last_transition_time;
            }
            *existing = new;
        }
        None => conditions.push(new),
    }
}

/// Fold one reconcile pass into the stored conditions.
///
/// Types not reported by the pass are left untouched.
pub fn merge_conditions(existing: &mut Vec<Condition>, pass: Vec<Condition>) {
    for condition in pass {
        set_condition(existing, condition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_failed_carries_error_text() {
        let condition = failed("ClusterPolicyDeployed", reasons::FETCH_FAILED, &"connection refused");
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.reason, "FetchFailed");
        assert_eq!(condition.message, "connection refused");
    }

    #[test]
    fn test_set_condition_replaces_by_type() {
        let mut conditions = vec![success("A", "ok"), success("B", "ok")];
        set_condition(&mut conditions, failed("A", reasons::CREATE_OR_PATCH_FAILED, &"boom"));

        assert_eq!(conditions.len(), 2);
        let a = find(&conditions, "A").unwrap();
        assert_eq!(a.status, ConditionStatus::False);
        assert_eq!(a.message, "boom");
    }

    #[test]
    fn test_set_condition_keeps_transition_time_when_status_unchanged() {
        let mut old = success("A", "first");
        old.last_transition_time = Utc::now() - Duration::hours(1);
        let original_time = old.last_transition_time;
        let mut conditions = vec![old];

        set_condition(&mut conditions, success("A", "second"));
        assert_eq!(conditions[0].last_transition_time, original_time);
        assert_eq!(conditions[0].message, "second");

        set_condition(&mut conditions, failed("A", reasons::FETCH_FAILED, &"gone"));
        assert!(conditions[0].last_transition_time > original_time);
    }

    #[test]
    fn test_merge_keeps_unreported_types() {
        let mut existing = vec![success("A", "ok"), success("B", "ok")];
        merge_conditions(&mut existing, vec![failed("B", reasons::FETCH_FAILED, &"x"), success("C", "ok")]);

        let types: Vec<&str> = existing.iter().map(|c| c.type_.as_str()).collect();
        assert_eq!(types, vec!["A", "B", "C"]);
        assert_eq!(find(&existing, "B").unwrap().status, ConditionStatus::False);
    }
}
