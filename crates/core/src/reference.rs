//! Second pass: evaluate the deferred-operation tree. Every command and
//! predicate file of the pack is emitted here, with the scope arena and
//! emission prefix re-traversing exactly the path the first pass took.

use crate::ast::{BinOp, CmpOp};
use crate::blocks::BlockState;
use crate::command::{file_reference, Command, ExecuteStep};
use crate::compile::Compiler;
use crate::construct::{Construct, Method, Op, Target};
use crate::error::CompileError;
use crate::path::AttributePath;
use crate::predicate::Predicate;
use crate::scope::Resolved;
use crate::value::{compare, to_predicate, BlockId, ScoreHandle, Value};
use crate::emit::UnitId;
use crate::names::NameKind;
use std::collections::VecDeque;

impl Compiler {
    /// Evaluate a frame of operations in order. A `Seq` splices its
    /// children into the front of the frame, which is how multi-target
    /// statements flatten.
    pub(crate) fn eval_seq(&mut self, ops: Vec<Op>) -> Result<Vec<Value>, CompileError> {
        let mut frame: VecDeque<Op> = ops.into();
        let mut out = Vec::new();
        while let Some(op) = frame.pop_front() {
            if let Op::Seq(inner) = op {
                for (i, op) in inner.into_iter().enumerate() {
                    frame.insert(i, op);
                }
                continue;
            }
            out.push(self.eval_op(op)?);
        }
        Ok(out)
    }

    pub(crate) fn eval_op(&mut self, op: Op) -> Result<Value, CompileError> {
        match op {
            // Late resolution of a name that was unbound on the first pass.
            Op::Ready(Value::Undefined(path)) => match self.scope.get(&path)? {
                Resolved::Value(value) => Ok(value),
                Resolved::Space(_) => Err(CompileError::malformed(format!(
                    "'{path}' is a namespace, not a value"
                ))),
            },
            Op::Ready(value) => Ok(value),
            Op::Seq(ops) => {
                self.eval_seq(ops)?;
                Ok(Value::None)
            }
            Op::Construct(construct) => self.eval_construct(*construct),
        }
    }

    fn eval_args(&mut self, args: Vec<Op>) -> Result<Vec<Value>, CompileError> {
        args.into_iter().map(|op| self.eval_op(op)).collect()
    }

    fn eval_target(&mut self, target: Target) -> Result<Value, CompileError> {
        match target {
            Target::Op(op) => self.eval_op(*op),
            Target::None => Ok(Value::None),
            Target::Block(_) => Err(CompileError::malformed(
                "block target where a value was expected",
            )),
        }
    }

    fn eval_construct(&mut self, construct: Construct) -> Result<Value, CompileError> {
        let Construct {
            method,
            target,
            mut args,
        } = construct;
        match method {
            Method::Reference => {
                let Target::Block(block) = target else {
                    return Err(CompileError::malformed("reference without a block"));
                };
                self.reference_block(block, args)
            }
            Method::Declare => {
                let value = self.eval_target(target)?;
                self.declare(value)
            }
            Method::Assign => {
                let target = self.eval_target(target)?;
                let value = self.eval_one(&mut args)?;
                self.env().assign(&target, value)?;
                Ok(Value::None)
            }
            Method::AugAssign(op) => {
                let target = self.eval_target(target)?;
                let value = self.eval_one(&mut args)?;
                match target {
                    Value::Score(score) => {
                        self.env().in_place(op, &score, value)?;
                        Ok(Value::None)
                    }
                    other => Err(CompileError::UnsupportedOperation {
                        op: op.symbol(),
                        left: other.kind(),
                        right: value.kind(),
                    }),
                }
            }
            Method::Bin(op) => {
                let right = args
                    .pop()
                    .ok_or_else(|| CompileError::malformed("binary op needs two operands"))?;
                let left = self.eval_one(&mut args)?;
                let right = self.eval_op(right)?;
                self.env().bin_op(op, left, right)
            }
            Method::Unary(op) => {
                let operand = self.eval_one(&mut args)?;
                self.env().unary_op(op, operand)
            }
            Method::Compare(ops) => {
                let operands = self.eval_args(args)?;
                if operands.len() != ops.len() + 1 {
                    return Err(CompileError::malformed("construct arity mismatch"));
                }
                let mut pairs = Vec::with_capacity(ops.len());
                for (i, op) in ops.iter().enumerate() {
                    pairs.push(compare(*op, &operands[i], &operands[i + 1])?);
                }
                Ok(Value::Predicate(Predicate::chain(pairs)))
            }
            Method::AllOf => {
                let terms = self.predicates_of(args)?;
                Ok(Value::Predicate(Predicate::all_of(terms)))
            }
            Method::AnyOf => {
                let terms = self.predicates_of(args)?;
                Ok(Value::Predicate(Predicate::any_of(terms)))
            }
            Method::Call => {
                let callee = self.eval_target(target)?;
                let args = self.eval_args(args)?;
                match callee {
                    Value::Function(block) => self.call_function(block, args),
                    Value::Builtin(builtin) => self.env().call_builtin(builtin, args),
                    other => Err(CompileError::UnsupportedOperation {
                        op: "call",
                        left: other.kind(),
                        right: "none",
                    }),
                }
            }
            Method::Return => {
                let Target::Block(block) = target else {
                    return Err(CompileError::malformed("return outside of a function"));
                };
                let ret = match self.blocks.get(block) {
                    BlockState::Function(state) => state.ret.clone(),
                    _ => None,
                }
                .ok_or_else(|| {
                    CompileError::malformed("function declares no return value")
                })?;
                let value = self.eval_one(&mut args)?;
                self.env().assign(&Value::Score(ret), value)?;
                Ok(Value::None)
            }
        }
    }

    fn eval_one(&mut self, args: &mut Vec<Op>) -> Result<Value, CompileError> {
        if args.len() != 1 {
            return Err(CompileError::malformed("construct arity mismatch"));
        }
        let op = args
            .pop()
            .ok_or_else(|| CompileError::malformed("construct arity mismatch"))?;
        self.eval_op(op)
    }

    fn predicates_of(&mut self, args: Vec<Op>) -> Result<Vec<Predicate>, CompileError> {
        self.eval_args(args)?
            .iter()
            .map(to_predicate)
            .collect()
    }

    fn declare(&mut self, value: Value) -> Result<Value, CompileError> {
        match value {
            Value::Scoreboard(board) => {
                self.emitter.emit(Command::ObjectiveCreate {
                    objective: board.attr.to_dotted(),
                    criteria: board.criteria,
                });
            }
            Value::Score(score) => {
                if score.objective == self.names.default_objective() {
                    self.env().default_objective();
                }
            }
            Value::Bossbar(_) => {}
            other => {
                return Err(CompileError::malformed(format!(
                    "cannot declare a {}",
                    other.kind()
                )))
            }
        }
        Ok(Value::None)
    }

    // ── Block references ─────────────────────────────────────────────

    fn slot_ref(&self, unit: UnitId, slot: &'static str) -> String {
        file_reference(
            self.names.project(),
            self.emitter.slot_path(unit, slot).segments(),
        )
    }

    fn write_predicate(&mut self, unit: UnitId, predicate: Predicate) {
        self.emitter.enter(unit, "predicate");
        self.emitter.emit(Command::Json(predicate.into_json()));
        self.emitter.leave();
    }

    fn gate(&mut self, predicate_ref: String, file_ref: String) {
        self.emitter.emit(Command::Execute {
            steps: vec![ExecuteStep::IfPredicate {
                reference: predicate_ref,
            }],
            run: Box::new(Command::FunctionCall {
                reference: file_ref,
            }),
        });
    }

    fn reference_block(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        match self.blocks.get(id) {
            BlockState::Module(_) => self.reference_module(id, args),
            BlockState::If(_) => self.reference_if(id, args),
            BlockState::While(_) => self.reference_while(id, args),
            BlockState::For(_) => self.reference_for(id, args),
            BlockState::ForIn(_) => self.reference_for_in(id, args),
            BlockState::Range(_) => self.reference_range(id, args),
            BlockState::Function(_) => self.reference_function(id, args),
            BlockState::Space(_) => self.reference_space(id, args),
        }
    }

    fn reference_module(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::Module(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;
        let [body] = take_args(args)?;
        self.emitter.enter(unit, "main");
        self.eval_op(body)?;
        self.emitter.leave();
        Ok(Value::None)
    }

    /// If/else lowering. The check-flag idiom assumes the generated files
    /// run synchronously within one invocation: the then-file clears the
    /// flag before the else gate is evaluated.
    fn reference_if(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::If(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;
        let then_scope = state.then_scope;
        let else_scope = state.else_scope;
        let then_prefix = state.then_prefix.clone();
        let else_prefix = state.else_prefix.clone();
        let check_attr = state.check_attr.clone();

        let [condition, then_ops, else_ops] = take_args(args)?;
        let condition = self.eval_op(condition)?;
        let predicate = to_predicate(&condition)?;
        self.write_predicate(unit, predicate);

        let check = match check_attr {
            Some(attr) => {
                let objective = self.env().default_objective();
                Some((attr, objective))
            }
            None => None,
        };
        if let Some((attr, objective)) = &check {
            self.emitter.emit(Command::PlayersSet {
                name: attr.to_dotted(),
                objective: objective.to_dotted(),
                value: 1,
            });
        }
        self.gate(self.slot_ref(unit, "predicate"), self.slot_ref(unit, "if"));

        self.emitter.enter(unit, "if");
        self.prefix.push(then_prefix);
        self.scope.reenter(then_scope);
        self.eval_op(then_ops)?;
        if let Some((attr, objective)) = &check {
            self.emitter.emit(Command::PlayersSet {
                name: attr.to_dotted(),
                objective: objective.to_dotted(),
                value: 0,
            });
        }
        self.scope.leave();
        self.prefix.pop();
        self.emitter.leave();

        if let (Some(scope), Some(prefix), Some((attr, objective))) =
            (else_scope, else_prefix, check)
        {
            self.emitter.enter(unit, "else");
            self.prefix.push(prefix);
            self.scope.reenter(scope);
            self.eval_op(else_ops)?;
            self.scope.leave();
            self.prefix.pop();
            self.emitter.leave();
            self.emitter.emit(Command::Execute {
                steps: vec![ExecuteStep::IfScoreMatches {
                    name: attr.to_dotted(),
                    objective: objective.to_dotted(),
                    range: "1".to_owned(),
                }],
                run: Box::new(Command::FunctionCall {
                    reference: self.slot_ref(unit, "else"),
                }),
            });
        }
        Ok(Value::None)
    }

    /// While lowering: the condition is evaluated once at the call site
    /// with its commands recorded, then the recording replays at the tail
    /// of the loop file before the self-invocation.
    fn reference_while(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::While(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;
        let scope = state.scope;
        let prefix = state.prefix.clone();

        let [condition, body] = take_args(args)?;
        self.emitter.begin_record();
        let condition = self.eval_op(condition)?;
        let recorded = self.emitter.end_record();
        let predicate = to_predicate(&condition)?;
        self.write_predicate(unit, predicate);

        self.gate(self.slot_ref(unit, "predicate"), self.slot_ref(unit, "main"));

        self.emitter.enter(unit, "main");
        self.prefix.push(prefix);
        self.scope.reenter(scope);
        self.eval_op(body)?;
        self.emitter.paste(&recorded);
        self.gate(self.slot_ref(unit, "predicate"), self.slot_ref(unit, "main"));
        self.scope.leave();
        self.prefix.pop();
        self.emitter.leave();
        Ok(Value::None)
    }

    fn reference_for(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::For(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;
        let scope = state.scope;
        let prefix = state.prefix.clone();

        let [init, condition, step, body] = take_args(args)?;
        self.eval_op(init)?;
        self.emitter.begin_record();
        let condition = self.eval_op(condition)?;
        let recorded = self.emitter.end_record();
        let predicate = to_predicate(&condition)?;
        self.write_predicate(unit, predicate);

        self.gate(self.slot_ref(unit, "predicate"), self.slot_ref(unit, "main"));

        self.emitter.enter(unit, "main");
        self.prefix.push(prefix);
        self.scope.reenter(scope);
        self.eval_op(body)?;
        self.eval_op(step)?;
        self.emitter.paste(&recorded);
        self.gate(self.slot_ref(unit, "predicate"), self.slot_ref(unit, "main"));
        self.scope.leave();
        self.prefix.pop();
        self.emitter.leave();
        Ok(Value::None)
    }

    fn reference_for_in(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::ForIn(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;
        let scope = state.scope;
        let prefix = state.prefix.clone();
        let var = state.var.clone();

        let [iter, body] = take_args(args)?;
        let iter = self.eval_op(iter)?;
        let Value::Range(range) = iter else {
            return Err(CompileError::UnsupportedOperation {
                op: "iterate",
                left: iter.kind(),
                right: "none",
            });
        };
        let (range_unit, item) = match self.blocks.get(range) {
            BlockState::Range(r) => (
                r.unit,
                r.item
                    .clone()
                    .ok_or_else(|| CompileError::malformed("range used before evaluation"))?,
            ),
            _ => unreachable!(),
        };

        self.gate(
            self.slot_ref(range_unit, "predicate"),
            self.slot_ref(unit, "main"),
        );

        self.emitter.enter(unit, "main");
        self.prefix.push(prefix);
        self.scope.reenter(scope);
        self.env().assign(&Value::Score(var), Value::Score(item.clone()))?;
        self.eval_op(body)?;
        // Next iteration, then the same gate the call site used.
        self.env().in_place(BinOp::Add, &item, Value::Int(1))?;
        self.gate(
            self.slot_ref(range_unit, "predicate"),
            self.slot_ref(unit, "main"),
        );
        self.scope.leave();
        self.prefix.pop();
        self.emitter.leave();
        Ok(Value::None)
    }

    /// Evaluating a range expression initializes its iteration item at the
    /// current position and writes its inclusive upper-bound predicate.
    fn reference_range(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::Range(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;

        let [start, end] = take_args(args)?;
        let start = self.eval_op(start)?;
        let end = self.eval_op(end)?;
        let (Value::Int(start), Value::Int(end)) = (&start, &end) else {
            return Err(CompileError::UnsupportedOperation {
                op: "range",
                left: start.kind(),
                right: end.kind(),
            });
        };
        let (start, end) = (*start, *end);

        let item_name = self.names.next(NameKind::Item);
        let item = ScoreHandle {
            attr: AttributePath::new(item_name).prefixed(&self.prefix),
            objective: self.env().default_objective(),
        };
        self.emitter.emit(Command::PlayersSet {
            name: item.attr.to_dotted(),
            objective: item.objective.to_dotted(),
            value: start,
        });
        let predicate = compare(CmpOp::Le, &Value::Score(item.clone()), &Value::Int(end))?;
        self.write_predicate(unit, predicate);

        if let BlockState::Range(state) = self.blocks.get_mut(id) {
            state.item = Some(item);
            state.end = Some(end);
        }
        Ok(Value::Range(id))
    }

    fn reference_function(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::Function(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;
        let scope = state.scope;
        let name = state.name.clone();

        let [body] = take_args(args)?;
        self.emitter.enter(unit, "main");
        self.prefix.push(name);
        self.scope.reenter(scope);
        self.eval_op(body)?;
        self.scope.leave();
        self.prefix.pop();
        self.emitter.leave();
        Ok(Value::None)
    }

    fn call_function(&mut self, id: BlockId, args: Vec<Value>) -> Result<Value, CompileError> {
        let BlockState::Function(state) = self.blocks.get(id) else {
            return Err(CompileError::malformed("call target is not a function"));
        };
        let unit = state.unit;
        let name = state.name.clone();
        let params = state.params.clone();
        let ret = state.ret.clone();

        if args.len() != params.len() {
            return Err(CompileError::malformed(format!(
                "'{name}' takes {} arguments, got {}",
                params.len(),
                args.len()
            )));
        }
        for (param, arg) in params.into_iter().zip(args) {
            self.env().assign(&Value::Score(param), arg)?;
        }
        self.emitter.emit(Command::FunctionCall {
            reference: self.slot_ref(unit, "main"),
        });
        Ok(ret.map(Value::Score).unwrap_or(Value::None))
    }

    fn reference_space(&mut self, id: BlockId, args: Vec<Op>) -> Result<Value, CompileError> {
        let BlockState::Space(state) = self.blocks.get(id) else {
            unreachable!()
        };
        let unit = state.unit;
        let scope = state.scope;
        let name = state.name.clone();

        let [body] = take_args(args)?;
        self.emitter.emit(Command::FunctionCall {
            reference: self.slot_ref(unit, "main"),
        });
        self.emitter.enter(unit, "main");
        self.prefix.push(name);
        self.scope.reenter(scope);
        self.eval_op(body)?;
        self.scope.leave();
        self.prefix.pop();
        self.emitter.leave();
        Ok(Value::None)
    }
}

fn take_args<const N: usize>(args: Vec<Op>) -> Result<[Op; N], CompileError> {
    args.try_into()
        .map_err(|_| CompileError::malformed("construct arity mismatch"))
}
