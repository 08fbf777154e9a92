//! The closed value model. Every expression the front end hands us
//! evaluates to one of these variants; capability dispatch is a `match`
//! per operation, and an arm that is missing means the operation is
//! unsupported for that operand combination.

use crate::ast::{BinOp, CmpOp, UnOp};
use crate::emit::EmitEnv;
use crate::error::CompileError;
use crate::path::AttributePath;
use crate::predicate::{Predicate, Range, ScoreValue};
use crate::command::Command;
use serde_json::{json, Value as Json};

/// Opaque handle to a deferred construct's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId(pub(crate) usize);

/// A single score cell: a fake-player name on an objective.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreHandle {
    pub attr: AttributePath,
    pub objective: AttributePath,
}

/// A scoreboard objective declared by the program.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardHandle {
    pub attr: AttributePath,
    pub criteria: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BossbarHandle {
    pub attr: AttributePath,
}

/// Built-in callables and type names visible in the root scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    ScoreClass,
    ScoreboardClass,
    BossbarClass,
    Print,
    Sidebar,
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
    Score(ScoreHandle),
    Scoreboard(ScoreboardHandle),
    Bossbar(BossbarHandle),
    Predicate(Predicate),
    Function(BlockId),
    Range(BlockId),
    Builtin(Builtin),
    /// Placeholder for a name that was not bound when first seen; resolved
    /// (or rejected) during the second pass.
    Undefined(AttributePath),
    None,
}

impl Value {
    /// Operand-kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Score(_) => "score",
            Value::Scoreboard(_) => "scoreboard",
            Value::Bossbar(_) => "bossbar",
            Value::Predicate(_) => "predicate",
            Value::Function(_) => "function",
            Value::Range(_) => "range",
            Value::Builtin(_) => "builtin",
            Value::Undefined(_) => "undefined",
            Value::None => "none",
        }
    }
}

impl ScoreHandle {
    fn score_value(&self) -> ScoreValue {
        ScoreValue::Score {
            name: self.attr.to_dotted(),
            objective: self.objective.to_dotted(),
        }
    }
}

// ── constant folding ────────────────────────────────────────────────

/// Floored division, matching target-machine score division on negative
/// operands.
pub fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Remainder paired with [`floor_div`]: always carries the divisor's sign.
pub fn floor_rem(a: i64, b: i64) -> i64 {
    a - floor_div(a, b) * b
}

fn fold(op: BinOp, a: i64, b: i64) -> Result<i64, CompileError> {
    match op {
        BinOp::Add => Ok(a.wrapping_add(b)),
        BinOp::Sub => Ok(a.wrapping_sub(b)),
        BinOp::Mul => Ok(a.wrapping_mul(b)),
        BinOp::Div | BinOp::Mod if b == 0 => {
            Err(CompileError::malformed("constant division by zero"))
        }
        BinOp::Div => Ok(floor_div(a, b)),
        BinOp::Mod => Ok(floor_rem(a, b)),
    }
}

/// Operator spelling for `scoreboard players operation`.
fn operation_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+=",
        BinOp::Sub => "-=",
        BinOp::Mul => "*=",
        BinOp::Div => "/=",
        BinOp::Mod => "%=",
    }
}

// ── value operations ────────────────────────────────────────────────

impl EmitEnv<'_> {
    /// Binary arithmetic. Constants fold with no emission; score operands
    /// go through a fresh temporary so the originals are untouched.
    pub(crate) fn bin_op(&mut self, op: BinOp, left: Value, right: Value) -> Result<Value, CompileError> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(fold(op, a, b)?)),
            (Value::Str(a), Value::Str(b)) if op == BinOp::Add => Ok(Value::Str(a + &b)),
            (Value::Str(s), Value::Int(n)) if op == BinOp::Mul => {
                Ok(Value::Str(s.repeat(n.max(0) as usize)))
            }
            (Value::Score(score), right) => {
                let temp = self.temp_score();
                self.copy_score(&temp, &score);
                self.in_place(op, &temp, right)?;
                Ok(Value::Score(temp))
            }
            (Value::Int(a), right @ Value::Score(_)) => {
                let temp = self.temp_score();
                self.emitter.emit(Command::PlayersSet {
                    name: temp.attr.to_dotted(),
                    objective: temp.objective.to_dotted(),
                    value: a,
                });
                self.in_place(op, &temp, right)?;
                Ok(Value::Score(temp))
            }
            (left, right) => Err(CompileError::UnsupportedOperation {
                op: op.symbol(),
                left: left.kind(),
                right: right.kind(),
            }),
        }
    }

    pub(crate) fn unary_op(&mut self, op: UnOp, operand: Value) -> Result<Value, CompileError> {
        match (op, operand) {
            (UnOp::Plus, v @ (Value::Int(_) | Value::Score(_))) => Ok(v),
            (UnOp::Minus, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
            (UnOp::Minus, Value::Score(score)) => {
                let temp = self.temp_score();
                self.copy_score(&temp, &score);
                self.in_place(BinOp::Mul, &temp, Value::Int(-1))?;
                Ok(Value::Score(temp))
            }
            (op, operand) => Err(CompileError::UnsupportedOperation {
                op: match op {
                    UnOp::Plus => "unary +",
                    UnOp::Minus => "unary -",
                },
                left: operand.kind(),
                right: "none",
            }),
        }
    }

    /// In-place arithmetic on a score cell. `+`/`-` with an integer use the
    /// direct add/remove commands; `*`, `/`, `%` need a score operand, so
    /// integer right-hand sides go through the constant-score cache.
    pub(crate) fn in_place(&mut self, op: BinOp, target: &ScoreHandle, operand: Value) -> Result<(), CompileError> {
        match operand {
            Value::Int(n) => match op {
                BinOp::Add | BinOp::Sub => {
                    let magnitude = n.unsigned_abs() as i64;
                    let grows = (op == BinOp::Add) == (n >= 0);
                    let command = if grows {
                        Command::PlayersAdd {
                            name: target.attr.to_dotted(),
                            objective: target.objective.to_dotted(),
                            value: magnitude,
                        }
                    } else {
                        Command::PlayersRemove {
                            name: target.attr.to_dotted(),
                            objective: target.objective.to_dotted(),
                            value: magnitude,
                        }
                    };
                    self.emitter.emit(command);
                    Ok(())
                }
                BinOp::Mul | BinOp::Div | BinOp::Mod => {
                    let constant = self.constant_score(n);
                    self.score_operation(operation_symbol(op), target, &constant);
                    Ok(())
                }
            },
            Value::Score(other) => {
                self.score_operation(operation_symbol(op), target, &other);
                Ok(())
            }
            operand => Err(CompileError::UnsupportedOperation {
                op: op.symbol(),
                left: "score",
                right: operand.kind(),
            }),
        }
    }

    /// Assignment into an assignable target.
    pub(crate) fn assign(&mut self, target: &Value, value: Value) -> Result<(), CompileError> {
        match (target, value) {
            (Value::Score(score), Value::Int(n)) => {
                self.emitter.emit(Command::PlayersSet {
                    name: score.attr.to_dotted(),
                    objective: score.objective.to_dotted(),
                    value: n,
                });
                Ok(())
            }
            (Value::Score(score), Value::Score(other)) => {
                self.copy_score(score, &other);
                Ok(())
            }
            (Value::Bossbar(bar), Value::Str(title)) => {
                self.emitter.emit(Command::BossbarAdd {
                    id: bar.attr.to_dotted(),
                    title: json!({ "text": title }),
                });
                Ok(())
            }
            (target, value) => Err(CompileError::UnsupportedOperation {
                op: "=",
                left: target.kind(),
                right: value.kind(),
            }),
        }
    }

    fn copy_score(&mut self, target: &ScoreHandle, source: &ScoreHandle) {
        self.score_operation("=", target, source);
    }

    fn score_operation(&mut self, op: &'static str, target: &ScoreHandle, other: &ScoreHandle) {
        self.emitter.emit(Command::PlayersOperation {
            name: target.attr.to_dotted(),
            objective: target.objective.to_dotted(),
            op,
            other_name: other.attr.to_dotted(),
            other_objective: other.objective.to_dotted(),
        });
    }
}

// ── comparisons (pure, no emission) ─────────────────────────────────

/// The operator with its operands swapped: `a < b` is `b > a`.
fn mirrored(op: CmpOp) -> CmpOp {
    match op {
        CmpOp::Lt => CmpOp::Gt,
        CmpOp::Le => CmpOp::Ge,
        CmpOp::Gt => CmpOp::Lt,
        CmpOp::Ge => CmpOp::Le,
        CmpOp::Eq | CmpOp::Ne => op,
    }
}

/// Compare two values into a predicate. Only the `==`, `<=`, and `>=`
/// shapes are built directly; `!=`, `<`, and `>` delegate to their
/// complements under inversion, and integer left-hand sides delegate to
/// the mirrored comparison so every score/score pair is expressed one way.
pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<Predicate, CompileError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Predicate::constant(match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        })),
        (Value::Int(_), Value::Score(_)) => compare(mirrored(op), right, left),
        (Value::Score(_), Value::Score(_)) if op == CmpOp::Le => {
            // score/score orderings canonicalize to `>=` on the swapped
            // pair, so `a <= b` and `b >= a` build the same predicate
            compare(CmpOp::Ge, right, left)
        }
        (Value::Score(score), rhs @ (Value::Int(_) | Value::Score(_))) => {
            let checked = score.score_value();
            let operand = match rhs {
                Value::Int(n) => ScoreValue::Constant(*n),
                Value::Score(other) => other.score_value(),
                _ => unreachable!(),
            };
            match op {
                CmpOp::Eq => Ok(Predicate::value_check(checked, Range::exactly(operand))),
                CmpOp::Le => Ok(Predicate::value_check(checked, Range::at_most(operand))),
                CmpOp::Ge => Ok(Predicate::value_check(checked, Range::at_least(operand))),
                CmpOp::Ne => Ok(compare(CmpOp::Eq, left, rhs)?.inverted()),
                CmpOp::Lt => Ok(compare(CmpOp::Ge, left, rhs)?.inverted()),
                CmpOp::Gt => Ok(compare(CmpOp::Le, left, rhs)?.inverted()),
            }
        }
        (left, right) => Err(CompileError::UnsupportedOperation {
            op: op.symbol(),
            left: left.kind(),
            right: right.kind(),
        }),
    }
}

/// Truthiness: predicates pass through, integers decide statically, and a
/// score is truthy when it differs from zero.
pub fn to_predicate(value: &Value) -> Result<Predicate, CompileError> {
    match value {
        Value::Predicate(p) => Ok(p.clone()),
        Value::Int(n) => Ok(Predicate::constant(*n != 0)),
        Value::Score(_) => compare(CmpOp::Ne, value, &Value::Int(0)),
        value => Err(CompileError::UnsupportedOperation {
            op: "truthiness",
            left: value.kind(),
            right: "none",
        }),
    }
}

/// Text-component JSON for one printable value.
pub fn print_source(value: &Value) -> Result<Json, CompileError> {
    match value {
        Value::Int(n) => Ok(json!({ "text": n.to_string() })),
        Value::Str(s) => Ok(json!({ "text": s })),
        Value::Score(score) => Ok(json!({
            "score": {
                "name": crate::command::to_kebab(&score.attr.to_dotted()),
                "objective": crate::command::to_kebab(&score.objective.to_dotted()),
            }
        })),
        value => Err(CompileError::UnsupportedOperation {
            op: "print",
            left: value.kind(),
            right: "none",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{Emitter, FileKind};
    use crate::names::NameTable;

    fn env_fixture() -> (Emitter, NameTable) {
        let mut emitter = Emitter::new();
        let unit = emitter.new_unit();
        emitter.add_slot(unit, "main", FileKind::Function, AttributePath::new("main"));
        emitter.enter(unit, "main");
        (emitter, NameTable::new("pack"))
    }

    fn score(name: &str) -> Value {
        Value::Score(ScoreHandle {
            attr: AttributePath::new(name),
            objective: AttributePath::new("obj"),
        })
    }

    #[test]
    fn test_floor_division_matches_scoreboard_semantics() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_rem(-7, 2), 1);
        assert_eq!(floor_rem(7, -2), -1);
    }

    #[test]
    fn test_constant_arithmetic_folds_without_commands() {
        let (mut emitter, mut names) = env_fixture();
        let prefix: Vec<String> = Vec::new();
        let mut env = EmitEnv { emitter: &mut emitter, names: &mut names, prefix: &prefix };
        let v = env.bin_op(BinOp::Add, Value::Int(2), Value::Int(3)).unwrap();
        assert_eq!(v, Value::Int(5));
        emitter.leave();
        assert!(emitter.into_units()[0].slots["main"].commands.is_empty());
    }

    #[test]
    fn test_constant_division_by_zero_is_rejected() {
        let (mut emitter, mut names) = env_fixture();
        let prefix: Vec<String> = Vec::new();
        let mut env = EmitEnv { emitter: &mut emitter, names: &mut names, prefix: &prefix };
        assert!(env.bin_op(BinOp::Div, Value::Int(1), Value::Int(0)).is_err());
    }

    #[test]
    fn test_score_addition_goes_through_a_temporary() {
        let (mut emitter, mut names) = env_fixture();
        let prefix: Vec<String> = Vec::new();
        let mut env = EmitEnv { emitter: &mut emitter, names: &mut names, prefix: &prefix };
        let result = env.bin_op(BinOp::Add, score("x"), Value::Int(4)).unwrap();
        match result {
            Value::Score(t) => assert_eq!(t.attr.to_dotted(), "$temp--0"),
            other => panic!("unexpected {other:?}"),
        }
        emitter.leave();
        let commands = &emitter.into_units()[0].slots["main"].commands[..];
        // objective create, temp = x, temp += 4
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[2], Command::PlayersAdd { value: 4, .. }));
    }

    #[test]
    fn test_multiply_by_literal_uses_constant_score() {
        let (mut emitter, mut names) = env_fixture();
        let prefix: Vec<String> = Vec::new();
        let mut env = EmitEnv { emitter: &mut emitter, names: &mut names, prefix: &prefix };
        let target = ScoreHandle {
            attr: AttributePath::new("x"),
            objective: AttributePath::new("obj"),
        };
        env.in_place(BinOp::Mul, &target, Value::Int(3)).unwrap();
        env.in_place(BinOp::Mul, &target, Value::Int(3)).unwrap();
        emitter.leave();
        let commands = &emitter.into_units()[0].slots["main"].commands[..];
        // objective create, #3 set once, then two operations
        assert_eq!(commands.len(), 4);
        assert!(matches!(
            &commands[1],
            Command::PlayersSet { name, value: 3, .. } if name == "#3"
        ));
        assert!(matches!(&commands[2], Command::PlayersOperation { op: "*=", .. }));
    }

    #[test]
    fn test_comparison_symmetry() {
        let x = score("x");
        let y = score("y");
        let a = compare(CmpOp::Ge, &x, &y).unwrap();
        let b = compare(CmpOp::Le, &y, &x).unwrap();
        assert_eq!(a.to_json(), b.to_json());
        // one canonical shape: the checked score is `x`, the range holds `y`
        assert_eq!(
            a.to_json()["range"],
            json!({
                "min": {
                    "type": "minecraft:score",
                    "target": { "type": "minecraft:fixed", "name": "y" },
                    "score": "obj",
                }
            })
        );

        let lt = compare(CmpOp::Lt, &x, &y).unwrap();
        let gt = compare(CmpOp::Gt, &y, &x).unwrap();
        assert_eq!(lt.to_json(), gt.to_json());
    }

    #[test]
    fn test_strict_comparison_is_inverted_complement() {
        let x = score("x");
        let lt = compare(CmpOp::Lt, &x, &Value::Int(5)).unwrap();
        let ge = compare(CmpOp::Ge, &x, &Value::Int(5)).unwrap();
        assert_eq!(lt.to_json(), ge.inverted().to_json());
    }

    #[test]
    fn test_string_operands_reject_comparison() {
        let err = compare(CmpOp::Lt, &Value::Str("a".into()), &Value::Int(1)).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_print_source_shapes() {
        assert_eq!(print_source(&Value::Int(5)).unwrap(), json!({ "text": "5" }));
        let source = print_source(&score("myVar")).unwrap();
        assert_eq!(source["score"]["name"], "my-var");
    }
}
