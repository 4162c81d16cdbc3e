//! Rule resolution: folds an element's rules into a visibility/enablement verdict.
//!
//! HIDE/DISABLE fire when all their conditions hold. SHOW/ENABLE fire, forcing
//! the negative state, when their conditions do not hold. Once a pass has set
//! `visible` or `enabled` to false nothing later in the list sets it back.

use shared::{
    domain::{as_number, display_string, strict_equals, Record, Value},
    schema::{Condition, Effect, Operator, Rule},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedState {
    pub visible: bool,
    pub enabled: bool,
}

impl Default for ResolvedState {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
        }
    }
}

pub fn resolve(rules: Option<&[Rule]>, record: &Record) -> ResolvedState {
    let Some(rules) = rules else {
        return ResolvedState::default();
    };
    rules
        .iter()
        .fold(ResolvedState::default(), |state, rule| apply(state, rule, record))
}

fn apply(mut state: ResolvedState, rule: &Rule, record: &Record) -> ResolvedState {
    let matches = rule_matches(rule, record);
    match rule.effect {
        Effect::Hide if matches => state.visible = false,
        Effect::Show if !matches => state.visible = false,
        Effect::Disable if matches => state.enabled = false,
        Effect::Enable if !matches => state.enabled = false,
        _ => {}
    }
    state
}

pub fn rule_matches(rule: &Rule, record: &Record) -> bool {
    rule.conditions
        .iter()
        .all(|condition| condition_matches(condition, record))
}

/// Evaluates one condition. Malformed conditions evaluate to false.
pub fn condition_matches(condition: &Condition, record: &Record) -> bool {
    let field = record.get(&condition.field);
    let values = condition.values.as_slice();
    match condition.operator {
        Operator::Eq => equals_first(field, values),
        Operator::Neq => !equals_first(field, values),
        Operator::Null => is_null(field),
        Operator::Nnull => !is_null(field),
        Operator::Empty => is_empty(field),
        Operator::Nempty => !is_empty(field),
        Operator::Lt => compare(field, values, |a, b| a < b),
        Operator::Lte => compare(field, values, |a, b| a <= b),
        Operator::Gt => compare(field, values, |a, b| a > b),
        Operator::Gte => compare(field, values, |a, b| a >= b),
        Operator::In => is_member(field, values),
        Operator::Nin => !is_member(field, values),
        Operator::Contains => contains_any(field, values),
    }
}

fn equals_first(field: Option<&Value>, values: &[Value]) -> bool {
    values
        .first()
        .is_some_and(|expected| strict_equals(field, expected))
}

fn is_null(field: Option<&Value>) -> bool {
    matches!(field, None | Some(Value::Null))
}

fn is_empty(field: Option<&Value>) -> bool {
    match field {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn compare(field: Option<&Value>, values: &[Value], op: fn(f64, f64) -> bool) -> bool {
    match (as_number(field), as_number(values.first())) {
        (Some(actual), Some(expected)) => op(actual, expected),
        _ => false,
    }
}

fn is_member(field: Option<&Value>, values: &[Value]) -> bool {
    values.iter().any(|candidate| strict_equals(field, candidate))
}

fn contains_any(field: Option<&Value>, values: &[Value]) -> bool {
    let Some(Value::String(haystack)) = field else {
        return false;
    };
    values
        .iter()
        .filter(|needle| !needle.is_null())
        .any(|needle| haystack.contains(display_string(needle).as_str()))
}

#[cfg(test)]
#[path = "tests/rules_tests.rs"]
mod tests;
