//! Ordered action plans and batch application.

use super::action::{Action, ActionError, ActionWarning, ApplyMode};
use super::cancel::CancelToken;
use crate::graph::DataStructure;
use tracing::debug;

/// The mutation plan a filter returns from its validation pass.
///
/// Regular actions run in order. Deferred actions run only after *every*
/// regular action across the plan succeeded; deletions belong there so
/// they never run before all creations validate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputActions {
    pub actions: Vec<Action>,
    pub deferred_actions: Vec<Action>,
}

/// The hard failure that stopped a plan.
#[derive(Debug)]
pub struct ActionFailure {
    /// Index of the failing action within its list.
    pub index: usize,
    /// Whether the failing action was in the deferred list.
    pub deferred: bool,
    pub error: ActionError,
}

/// Outcome of applying a plan: everything collected up to the first hard
/// failure, which is surfaced alongside the warnings already gathered.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub warnings: Vec<ActionWarning>,
    pub failure: Option<ActionFailure>,
}

impl ApplyReport {
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// The failing error's stable code, or 0 on success.
    pub fn error_code(&self) -> i64 {
        self.failure.as_ref().map_or(0, |f| f.error.code())
    }
}

impl OutputActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn push_deferred(&mut self, action: Action) {
        self.deferred_actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.deferred_actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len() + self.deferred_actions.len()
    }

    /// Apply only the regular actions.
    pub fn apply_regular(
        &self,
        ds: &mut DataStructure,
        mode: ApplyMode,
        cancel: &CancelToken,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        apply_list(&self.actions, ds, mode, cancel, false, &mut report);
        report
    }

    /// Apply only the deferred actions.
    pub fn apply_deferred(
        &self,
        ds: &mut DataStructure,
        mode: ApplyMode,
        cancel: &CancelToken,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        apply_list(&self.deferred_actions, ds, mode, cancel, true, &mut report);
        report
    }

    /// Apply regular actions, then, only if all succeeded, deferred
    /// ones. Warnings accumulate across both groups.
    pub fn apply_all(
        &self,
        ds: &mut DataStructure,
        mode: ApplyMode,
        cancel: &CancelToken,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        apply_list(&self.actions, ds, mode, cancel, false, &mut report);
        if report.is_ok() {
            apply_list(&self.deferred_actions, ds, mode, cancel, true, &mut report);
        }
        report
    }
}

/// Run a list in order, accumulating warnings and stopping at the first
/// hard failure. The cancel flag is polled between actions.
fn apply_list(
    actions: &[Action],
    ds: &mut DataStructure,
    mode: ApplyMode,
    cancel: &CancelToken,
    deferred: bool,
    report: &mut ApplyReport,
) {
    for (index, action) in actions.iter().enumerate() {
        if cancel.is_canceled() {
            report.failure = Some(ActionFailure {
                index,
                deferred,
                error: ActionError::Canceled,
            });
            return;
        }
        match action.apply(ds, mode) {
            Ok(warnings) => report.warnings.extend(warnings),
            Err(error) => {
                debug!(index, deferred, code = error.code(), %error, "action failed");
                report.failure = Some(ActionFailure {
                    index,
                    deferred,
                    error,
                });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::DataPath;
    use crate::types::ScalarType;

    fn path(s: &str) -> DataPath {
        s.parse().unwrap()
    }

    fn create_array(p: &str) -> Action {
        Action::CreateArray {
            path: path(p),
            element_type: ScalarType::F32,
            tuple_shape: vec![2],
            component_shape: vec![1],
        }
    }

    #[test]
    fn test_apply_all_runs_regular_then_deferred() {
        let mut plan = OutputActions::new();
        plan.push(create_array("keep"));
        plan.push_deferred(Action::DeleteData { path: path("old") });

        let mut ds = DataStructure::new();
        create_array("old").apply(&mut ds, ApplyMode::Execute).unwrap();

        let report = plan.apply_all(&mut ds, ApplyMode::Execute, &CancelToken::new());
        assert!(report.is_ok());
        assert!(ds.contains(&path("keep")));
        assert!(!ds.contains(&path("old")));
    }

    #[test]
    fn test_deferred_skipped_after_regular_failure() {
        let mut plan = OutputActions::new();
        plan.push(create_array("x"));
        plan.push(create_array("x")); // collides
        plan.push_deferred(Action::DeleteData { path: path("victim") });

        let mut ds = DataStructure::new();
        create_array("victim").apply(&mut ds, ApplyMode::Execute).unwrap();

        let report = plan.apply_all(&mut ds, ApplyMode::Preflight, &CancelToken::new());
        let failure = report.failure.unwrap();
        assert_eq!(failure.index, 1);
        assert!(!failure.deferred);
        // The deletion never ran.
        assert!(ds.contains(&path("victim")));
    }

    #[test]
    fn test_stops_at_first_hard_failure_keeps_warnings() {
        let mut plan = OutputActions::new();
        plan.push(create_array("a"));
        plan.push(create_array("b"));
        plan.push(Action::Rename {
            path: path("a"),
            new_name: "b".into(),
            overwrite: true,
        });
        plan.push(Action::DeleteData { path: path("missing") });
        plan.push(create_array("never"));

        let mut ds = DataStructure::new();
        let report = plan.apply_regular(&mut ds, ApplyMode::Execute, &CancelToken::new());

        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.index, 3);
        assert_eq!(failure.error.code(), -106);
        // The overwrite warning collected before the failure survives.
        assert_eq!(report.warnings.len(), 1);
        // Prior actions stay applied: no rollback.
        assert!(ds.contains(&path("b")));
        assert!(!ds.contains(&path("never")));
    }

    #[test]
    fn test_cancellation_between_actions() {
        let mut plan = OutputActions::new();
        plan.push(create_array("a"));
        plan.push(create_array("b"));

        let cancel = CancelToken::new();
        cancel.cancel();

        let mut ds = DataStructure::new();
        let report = plan.apply_regular(&mut ds, ApplyMode::Execute, &cancel);
        assert_eq!(report.error_code(), -107);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_preflight_repeatable_on_fresh_structures() {
        // The same plan preflighted against two identical structures
        // registers identical paths.
        let mut plan = OutputActions::new();
        plan.push(Action::CreateGroup { path: path("G") });
        plan.push(create_array("G/x"));

        let mut first = DataStructure::new();
        let mut second = DataStructure::new();
        assert!(plan
            .apply_all(&mut first, ApplyMode::Preflight, &CancelToken::new())
            .is_ok());
        assert!(plan
            .apply_all(&mut second, ApplyMode::Preflight, &CancelToken::new())
            .is_ok());
        assert_eq!(first, second);
    }
}
