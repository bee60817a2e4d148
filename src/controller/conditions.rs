//! Provider condition management following Kubernetes API conventions

use chrono::{DateTime, Utc};

use crate::crd::provider::{MACHINE_CREATION_FAILED_REASON, MACHINE_CREATION_SUCCEEDED_REASON};
use crate::crd::{AwsMachineProviderCondition, ConditionStatus, ConditionType};

pub const MACHINE_CREATION_SUCCEEDED_MESSAGE: &str = "Machine successfully created";

/// Merge `condition` into `conditions` and return the new list.
///
/// A condition of a new type is appended with both timestamps set to now.
/// An existing condition is only touched when the reason or message differs;
/// the transition time moves only when the status changed as well.
pub fn set_provider_condition(
    condition: AwsMachineProviderCondition,
    conditions: Vec<AwsMachineProviderCondition>,
) -> Vec<AwsMachineProviderCondition> {
    set_provider_condition_at(condition, conditions, Utc::now())
}

/// [`set_provider_condition`] with an explicit clock
pub fn set_provider_condition_at(
    mut condition: AwsMachineProviderCondition,
    mut conditions: Vec<AwsMachineProviderCondition>,
    now: DateTime<Utc>,
) -> Vec<AwsMachineProviderCondition> {
    if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        if existing.reason == condition.reason && existing.message == condition.message {
            return conditions;
        }

        // Update transition time only if status changed
        if existing.status != condition.status {
            existing.last_transition_time = Some(now);
        }
        existing.status = condition.status;
        existing.reason = condition.reason;
        existing.message = condition.message;
        existing.last_probe_time = Some(now);
    } else {
        condition.last_probe_time = Some(now);
        condition.last_transition_time = Some(now);
        conditions.push(condition);
    }
    conditions
}

/// Find a condition by type
pub fn find_provider_condition(
    conditions: &[AwsMachineProviderCondition],
    type_: ConditionType,
) -> Option<&AwsMachineProviderCondition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Check if a condition is true
pub fn is_condition_true(conditions: &[AwsMachineProviderCondition], type_: ConditionType) -> bool {
    find_provider_condition(conditions, type_)
        .map(|c| c.status == ConditionStatus::True)
        .unwrap_or(false)
}

/// MachineCreation=True
pub fn condition_success() -> AwsMachineProviderCondition {
    AwsMachineProviderCondition {
        type_: ConditionType::MachineCreation,
        status: ConditionStatus::True,
        reason: MACHINE_CREATION_SUCCEEDED_REASON.to_string(),
        message: MACHINE_CREATION_SUCCEEDED_MESSAGE.to_string(),
        last_probe_time: None,
        last_transition_time: None,
    }
}

/// MachineCreation=False carrying the failure message
pub fn condition_failed(message: impl Into<String>) -> AwsMachineProviderCondition {
    AwsMachineProviderCondition {
        type_: ConditionType::MachineCreation,
        status: ConditionStatus::False,
        reason: MACHINE_CREATION_FAILED_REASON.to_string(),
        message: message.into(),
        last_probe_time: None,
        last_transition_time: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_set_condition_adds_new() {
        let conditions = set_provider_condition_at(condition_success(), Vec::new(), t0());

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].type_, ConditionType::MachineCreation);
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_eq!(conditions[0].last_probe_time, Some(t0()));
        assert_eq!(conditions[0].last_transition_time, Some(t0()));
    }

    #[test]
    fn test_identical_reason_and_message_is_noop() {
        let conditions = set_provider_condition_at(condition_failed("boom"), Vec::new(), t0());
        let later = t0() + Duration::minutes(5);

        let merged = set_provider_condition_at(condition_failed("boom"), conditions.clone(), later);
        assert_eq!(merged, conditions);
    }

    #[test]
    fn test_status_change_updates_both_times() {
        let conditions = set_provider_condition_at(condition_failed("boom"), Vec::new(), t0());
        let later = t0() + Duration::minutes(5);

        let merged = set_provider_condition_at(condition_success(), conditions, later);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status, ConditionStatus::True);
        assert_eq!(merged[0].reason, MACHINE_CREATION_SUCCEEDED_REASON);
        assert_eq!(merged[0].last_probe_time, Some(later));
        assert_eq!(merged[0].last_transition_time, Some(later));
    }

    #[test]
    fn test_message_change_updates_probe_time_only() {
        let conditions = set_provider_condition_at(condition_failed("first"), Vec::new(), t0());
        let later = t0() + Duration::minutes(5);

        let merged = set_provider_condition_at(condition_failed("second"), conditions, later);
        assert_eq!(merged[0].message, "second");
        assert_eq!(merged[0].last_probe_time, Some(later));
        assert_eq!(merged[0].last_transition_time, Some(t0()));
    }

    #[test]
    fn test_status_change_with_same_reason_and_message_is_noop() {
        let conditions = set_provider_condition_at(condition_failed("x"), Vec::new(), t0());
        let mut flipped = condition_failed("x");
        flipped.status = ConditionStatus::Unknown;

        let merged =
            set_provider_condition_at(flipped, conditions.clone(), t0() + Duration::minutes(1));
        assert_eq!(merged, conditions);
    }

    #[test]
    fn test_is_condition_true() {
        let conditions = set_provider_condition(condition_success(), Vec::new());
        assert!(is_condition_true(&conditions, ConditionType::MachineCreation));
        assert!(find_provider_condition(&conditions, ConditionType::MachineCreation).is_some());

        let failed = set_provider_condition(condition_failed("nope"), Vec::new());
        assert!(!is_condition_true(&failed, ConditionType::MachineCreation));
        assert!(!is_condition_true(&[], ConditionType::MachineCreation));
    }
}
