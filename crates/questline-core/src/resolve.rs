//! Event-result selection for general (non-battle) events.
//!
//! An event's general logic carries zero or more [`EventResult`] branches.
//! Which branch applies depends on player state the data layer does not
//! own, so condition checking is delegated to a caller-supplied
//! [`ConditionEvaluator`]. Among passing branches the highest priority
//! wins; equal priorities fall back to stored order (first wins), which is
//! deterministic because the store returns results ordered by priority
//! descending then id ascending.

use questline_types::{ConditionEntry, EventResult};

/// External collaborator that evaluates a result's condition list against
/// player state.
pub trait ConditionEvaluator {
    /// Whether every condition in the list holds for the current player.
    ///
    /// An empty list always passes.
    fn passes(&self, conditions: &[ConditionEntry]) -> bool;
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&[ConditionEntry]) -> bool,
{
    fn passes(&self, conditions: &[ConditionEntry]) -> bool {
        self(conditions)
    }
}

/// Select the resolution branch for a drawn event.
///
/// Filters `results` through the evaluator, then picks the passing branch
/// with the highest priority. Ties keep the earliest passing branch in
/// input order. Returns `None` when no branch passes.
pub fn select_result<'a, E: ConditionEvaluator>(
    results: &'a [EventResult],
    evaluator: &E,
) -> Option<&'a EventResult> {
    let mut best: Option<&'a EventResult> = None;
    for result in results {
        if !evaluator.passes(&result.conditions) {
            continue;
        }
        // Strict comparison keeps the first branch on equal priority.
        match best {
            Some(current) if result.priority <= current.priority => {}
            _ => best = Some(result),
        }
    }
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use questline_types::{LogicId, ResultId};

    use super::*;

    fn branch(name: &str, priority: i32, conditions: Vec<ConditionEntry>) -> EventResult {
        EventResult {
            id: ResultId::new(),
            logic_id: LogicId::new(),
            name: name.to_owned(),
            conditions,
            priority,
            status_effects: Vec::new(),
            story_text: Vec::new(),
            reward_pool_id: None,
        }
    }

    fn requires(key: &str) -> Vec<ConditionEntry> {
        vec![ConditionEntry {
            key: key.to_owned(),
            value: serde_json::Value::Bool(true),
        }]
    }

    /// Evaluator passing only condition lists whose every key is allowed.
    struct KeySet(Vec<&'static str>);

    impl ConditionEvaluator for KeySet {
        fn passes(&self, conditions: &[ConditionEntry]) -> bool {
            conditions.iter().all(|c| self.0.contains(&c.key.as_str()))
        }
    }

    #[test]
    fn highest_passing_priority_wins() {
        let results = vec![
            branch("low", 1, Vec::new()),
            branch("high", 5, Vec::new()),
            branch("mid", 3, Vec::new()),
        ];
        let chosen = select_result(&results, &KeySet(vec![])).unwrap();
        assert_eq!(chosen.name, "high");
    }

    #[test]
    fn failing_conditions_exclude_a_branch() {
        let results = vec![
            branch("gated", 10, requires("has_key")),
            branch("fallback", 0, Vec::new()),
        ];
        let chosen = select_result(&results, &KeySet(vec![])).unwrap();
        assert_eq!(chosen.name, "fallback");

        let chosen = select_result(&results, &KeySet(vec!["has_key"])).unwrap();
        assert_eq!(chosen.name, "gated");
    }

    #[test]
    fn equal_priority_keeps_stored_order() {
        let results = vec![
            branch("first", 2, Vec::new()),
            branch("second", 2, Vec::new()),
        ];
        let chosen = select_result(&results, &KeySet(vec![])).unwrap();
        assert_eq!(chosen.name, "first");
    }

    #[test]
    fn no_passing_branch_yields_none() {
        let results = vec![branch("gated", 1, requires("has_key"))];
        assert!(select_result(&results, &KeySet(vec![])).is_none());
    }

    #[test]
    fn closures_are_evaluators() {
        let results = vec![branch("only", 0, Vec::new())];
        let always = |_: &[ConditionEntry]| true;
        assert!(select_result(&results, &always).is_some());
    }
}
