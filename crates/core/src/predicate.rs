//! Predicate trees -- the JSON boolean-condition grammar the target
//! evaluates to gate conditional invocation.
//!
//! The grammar has three combinators: a value-range check, `alternative`
//! (logical OR over terms) and `inverted` (logical NOT). Conjunction is
//! built as NOT(OR(NOT(term)...)), comparison chains as the conjunction of
//! each adjacent pair.

use crate::command::to_kebab;
use serde_json::{json, Value};

/// A fully-built predicate tree. Wraps the JSON form; comparison methods on
/// values produce these, control-flow lowering writes them into predicate
/// files.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(Value);

/// One side of a range check: a constant integer or a score cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreValue {
    Constant(i64),
    Score { name: String, objective: String },
}

impl ScoreValue {
    fn to_json(&self) -> Value {
        match self {
            ScoreValue::Constant(n) => json!(n),
            ScoreValue::Score { name, objective } => json!({
                "type": "minecraft:score",
                "target": { "type": "minecraft:fixed", "name": to_kebab(name) },
                "score": to_kebab(objective),
            }),
        }
    }
}

/// Bounds of a value-range check. `None` leaves that side open.
#[derive(Debug, Clone, Default)]
pub struct Range {
    pub min: Option<ScoreValue>,
    pub max: Option<ScoreValue>,
}

impl Range {
    pub fn at_least(min: ScoreValue) -> Range {
        Range {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: ScoreValue) -> Range {
        Range {
            min: None,
            max: Some(max),
        }
    }

    pub fn exactly(value: ScoreValue) -> Range {
        Range {
            min: Some(value.clone()),
            max: Some(value),
        }
    }
}

impl Predicate {
    /// `value` lies within `range`.
    pub fn value_check(value: ScoreValue, range: Range) -> Predicate {
        let mut range_json = serde_json::Map::new();
        if let Some(min) = range.min {
            range_json.insert("min".to_owned(), min.to_json());
        }
        if let Some(max) = range.max {
            range_json.insert("max".to_owned(), max.to_json());
        }
        Predicate(json!({
            "condition": "minecraft:value_check",
            "value": value.to_json(),
            "range": Value::Object(range_json),
        }))
    }

    /// Compile-time constant truth -- used when both comparison operands
    /// fold at compile time.
    pub fn constant(truth: bool) -> Predicate {
        let n = i64::from(truth);
        Predicate::value_check(
            ScoreValue::Constant(n),
            Range::exactly(ScoreValue::Constant(1)),
        )
    }

    /// Logical NOT.
    pub fn inverted(self) -> Predicate {
        Predicate(json!({
            "condition": "minecraft:inverted",
            "term": self.0,
        }))
    }

    /// Logical OR over terms.
    pub fn any_of(terms: Vec<Predicate>) -> Predicate {
        Predicate(json!({
            "condition": "minecraft:alternative",
            "terms": terms.into_iter().map(|p| p.0).collect::<Vec<_>>(),
        }))
    }

    /// Logical AND over terms: NOT(OR(NOT(term)...)).
    pub fn all_of(terms: Vec<Predicate>) -> Predicate {
        Predicate::any_of(terms.into_iter().map(Predicate::inverted).collect()).inverted()
    }

    /// Conjunction of already-paired comparison predicates -- the lowering
    /// of a chain `a < b <= c`. A single pair passes through unwrapped.
    pub fn chain(pairs: Vec<Predicate>) -> Predicate {
        debug_assert!(!pairs.is_empty());
        if pairs.len() == 1 {
            return pairs.into_iter().next().expect("len checked");
        }
        Predicate::all_of(pairs)
    }

    pub fn to_json(&self) -> Value {
        self.0.clone()
    }

    pub fn into_json(self) -> Value {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_check_constant_range() {
        let p = Predicate::value_check(
            ScoreValue::Score {
                name: "main.x".into(),
                objective: "obj".into(),
            },
            Range::at_least(ScoreValue::Constant(3)),
        );
        let j = p.to_json();
        assert_eq!(j["condition"], "minecraft:value_check");
        assert_eq!(j["range"]["min"], 3);
        assert!(j["range"].get("max").is_none());
        assert_eq!(j["value"]["target"]["name"], "main.x");
    }

    #[test]
    fn test_all_of_structure() {
        let a = Predicate::constant(true);
        let b = Predicate::constant(false);
        let p = Predicate::all_of(vec![a.clone(), b.clone()]);
        let j = p.to_json();
        assert_eq!(j["condition"], "minecraft:inverted");
        assert_eq!(j["term"]["condition"], "minecraft:alternative");
        let terms = j["term"]["terms"].as_array().unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0]["condition"], "minecraft:inverted");
        assert_eq!(terms[0]["term"], a.to_json());
    }

    #[test]
    fn test_any_of_structure() {
        let p = Predicate::any_of(vec![Predicate::constant(true)]);
        let j = p.to_json();
        assert_eq!(j["condition"], "minecraft:alternative");
        assert_eq!(j["terms"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_single_pair_chain_unwrapped() {
        let pair = Predicate::constant(true);
        assert_eq!(Predicate::chain(vec![pair.clone()]), pair);
    }
}
