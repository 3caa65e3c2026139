use std::collections::BTreeMap;

use crate::answers::AnswerSet;
use crate::spec::field::FieldSpec;
use crate::spec::rule::{FieldRule, RuleAction};

/// Per-field outcome of one evaluation pass over a form's rule list.
///
/// Fields absent from a map keep their defaults: visible, and required
/// per the field's static declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleEffects {
    pub hidden: BTreeMap<String, bool>,
    pub required: BTreeMap<String, bool>,
}

impl RuleEffects {
    pub fn is_hidden(&self, field_id: &str) -> bool {
        self.hidden.get(field_id).copied().unwrap_or(false)
    }

    pub fn required_override(&self, field_id: &str) -> Option<bool> {
        self.required.get(field_id).copied()
    }

    /// Required-ness used for submission validation: the rule override when
    /// one fired, otherwise the field's static default.
    pub fn effective_required(&self, field: &FieldSpec) -> bool {
        self.required
            .get(&field.id)
            .copied()
            .unwrap_or(field.required)
    }
}

/// Evaluates the full rule list against the current answers.
///
/// Rules run in list order; later satisfied rules overwrite earlier ones
/// for the same target, independently per axis. Unsatisfied rules have no
/// effect. A condition on a missing answer is never satisfied.
pub fn evaluate_rules(rules: &[FieldRule], answers: &AnswerSet) -> RuleEffects {
    let mut effects = RuleEffects::default();

    for rule in rules {
        let satisfied = rule.when.iter().all(|cond| {
            answers
                .get(&cond.field)
                .is_some_and(|answer| cond.equals.matches(answer))
        });
        if !satisfied {
            continue;
        }
        match rule.action {
            RuleAction::Hide => {
                effects.hidden.insert(rule.target.clone(), true);
            }
            RuleAction::Show => {
                effects.hidden.insert(rule.target.clone(), false);
            }
            RuleAction::Require => {
                effects.required.insert(rule.target.clone(), true);
            }
            RuleAction::Optional => {
                effects.required.insert(rule.target.clone(), false);
            }
        }
    }

    effects
}
