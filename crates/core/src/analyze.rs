//! First pass: walk the AST in source order, bind every declared name,
//! allocate every file and scope a construct will need, and build the
//! deferred-operation tree. Nothing here emits a command; unresolved
//! names become placeholders that the second pass resolves or rejects.

use crate::ast::{Expr, Module, NamespaceBlock, Param, ReturnSpec, Stmt, Visibility};
use crate::blocks::{
    BlockState, ForInBlock, FunctionBlock, IfBlock, LoopBlock, ModuleBlock, RangeBlock, SpaceBlock,
};
use crate::compile::Compiler;
use crate::config::ScopeMode;
use crate::construct::{Method, Op, Target};
use crate::emit::FileKind;
use crate::error::CompileError;
use crate::names::NameKind;
use crate::path::AttributePath;
use crate::scope::Resolved;
use crate::value::{BossbarHandle, Builtin, ScoreHandle, ScoreboardHandle, Value};

impl Compiler {
    pub(crate) fn formalize_module(&mut self, module: &Module) -> Result<Op, CompileError> {
        let unit = self.emitter.new_unit();
        self.emitter.add_slot(
            unit,
            "main",
            FileKind::Function,
            AttributePath::new("--main--"),
        );
        let block = self.blocks.alloc(BlockState::Module(ModuleBlock {
            unit,
            scope: self.scope.current(),
        }));
        let body = self.formalize_body(&module.body)?;
        Ok(Op::reference(block, vec![Op::Seq(body)]))
    }

    fn formalize_body(&mut self, body: &[Stmt]) -> Result<Vec<Op>, CompileError> {
        body.iter().map(|stmt| self.formalize_stmt(stmt)).collect()
    }

    // ── Statements ───────────────────────────────────────────────────

    pub(crate) fn formalize_stmt(&mut self, stmt: &Stmt) -> Result<Op, CompileError> {
        match stmt {
            Stmt::Annotation {
                targets,
                data_type,
                args,
            } => self.formalize_annotation(targets, data_type, args),
            Stmt::Assignment { targets, values } => {
                self.formalize_assignment(targets, values, None)
            }
            Stmt::AnnAssignment {
                targets,
                data_type,
                args,
                values,
            } => {
                let declare = self.formalize_annotation(targets, data_type, args)?;
                let target_exprs: Vec<Expr> =
                    targets.iter().map(|t| Expr::name(t)).collect();
                let assign = self.formalize_assignment(&target_exprs, values, None)?;
                Ok(Op::Seq(vec![declare, assign]))
            }
            Stmt::AugAssignment {
                op,
                targets,
                values,
            } => self.formalize_assignment(targets, values, Some(*op)),
            Stmt::Expr { value } => self.formalize_expr(value),
            Stmt::If {
                condition,
                then,
                or_else,
            } => self.formalize_if(condition, then, or_else),
            Stmt::While { condition, body } => self.formalize_while(condition, body),
            Stmt::For {
                init,
                condition,
                step,
                body,
            } => self.formalize_for(init, condition, step, body),
            Stmt::ForIn { var, iter, body } => self.formalize_for_in(var, iter, body),
            Stmt::FuncDef {
                name,
                params,
                returns,
                body,
            } => self.formalize_func_def(name, params, returns.as_ref(), body),
            Stmt::NamespaceDef { name, blocks } => self.formalize_namespace(name, blocks),
            Stmt::Return { value } => {
                let Some(&function) = self.func_stack.last() else {
                    return Err(CompileError::malformed("return outside of a function"));
                };
                let value = self.formalize_expr(value)?;
                Ok(Op::construct(
                    Method::Return,
                    Target::Block(function),
                    vec![value],
                ))
            }
        }
    }

    fn formalize_assignment(
        &mut self,
        targets: &[Expr],
        values: &[Expr],
        aug: Option<crate::ast::BinOp>,
    ) -> Result<Op, CompileError> {
        if targets.len() != values.len() {
            return Err(CompileError::malformed(format!(
                "{} assignment targets but {} values",
                targets.len(),
                values.len()
            )));
        }
        let mut ops = Vec::with_capacity(targets.len());
        for (target, value) in targets.iter().zip(values) {
            let target = self.formalize_expr(target)?;
            let value = self.formalize_expr(value)?;
            let method = match aug {
                Some(op) => Method::AugAssign(op),
                None => Method::Assign,
            };
            ops.push(Op::construct(
                method,
                Target::Op(Box::new(target)),
                vec![value],
            ));
        }
        Ok(Op::Seq(ops))
    }

    /// Declarations bind immediately so everything after them resolves;
    /// only the resource-creation command is deferred.
    fn formalize_annotation(
        &mut self,
        targets: &[String],
        data_type: &str,
        args: &[Expr],
    ) -> Result<Op, CompileError> {
        let class = self.resolve_class(data_type)?;
        let mut declares = Vec::with_capacity(targets.len());
        for target in targets {
            let path = AttributePath::from(target.as_str());
            let value = match class {
                Builtin::ScoreClass => {
                    let objective = self.score_objective(args)?;
                    Value::Score(ScoreHandle {
                        attr: path.prefixed(&self.prefix),
                        objective,
                    })
                }
                Builtin::ScoreboardClass => {
                    let criteria = match args {
                        [] => "dummy".to_owned(),
                        [Expr::Str { value }] => value.clone(),
                        _ => {
                            return Err(CompileError::malformed(
                                "scoreboard criteria must be a string literal",
                            ))
                        }
                    };
                    Value::Scoreboard(ScoreboardHandle {
                        attr: self.names.static_attr(&path),
                        criteria,
                    })
                }
                Builtin::BossbarClass => Value::Bossbar(BossbarHandle {
                    attr: self.names.static_attr(&path),
                }),
                _ => return Err(CompileError::malformed(format!(
                    "'{data_type}' is not a data type"
                ))),
            };
            self.scope.write(&path, value.clone())?;
            declares.push(Op::construct(
                Method::Declare,
                Target::Op(Box::new(Op::Ready(value))),
                vec![],
            ));
        }
        Ok(Op::Seq(declares))
    }

    fn resolve_class(&self, data_type: &str) -> Result<Builtin, CompileError> {
        match self.scope.get(&AttributePath::from(data_type))? {
            Resolved::Value(Value::Builtin(b)) => Ok(b),
            _ => Err(CompileError::malformed(format!(
                "'{data_type}' is not a data type"
            ))),
        }
    }

    /// Backing objective of a score declaration: the default scoreboard,
    /// or the one named in the annotation arguments. A named scoreboard
    /// must already be declared.
    fn score_objective(&self, args: &[Expr]) -> Result<AttributePath, CompileError> {
        match args {
            [] => Ok(self.names.default_objective()),
            [Expr::Name { path, .. }] => {
                match self.scope.get(&AttributePath::from(path.as_str()))? {
                    Resolved::Value(Value::Scoreboard(board)) => Ok(board.attr),
                    _ => Err(CompileError::malformed(format!(
                        "'{path}' is not a scoreboard"
                    ))),
                }
            }
            _ => Err(CompileError::malformed(
                "a score takes at most one scoreboard argument",
            )),
        }
    }

    // ── Block statements ─────────────────────────────────────────────

    fn formalize_if(
        &mut self,
        condition: &Expr,
        then: &[Stmt],
        or_else: &[Stmt],
    ) -> Result<Op, CompileError> {
        let condition = self.formalize_expr(condition)?;
        let then_prefix = self.names.next(NameKind::IfFile);
        let predicate_name = self.names.next(NameKind::PredicateFile);
        let unit = self.emitter.new_unit();
        self.emitter
            .add_slot(unit, "if", FileKind::Function, self.local_attr(&then_prefix));
        self.emitter.add_slot(
            unit,
            "predicate",
            FileKind::Predicate,
            self.local_attr(&predicate_name),
        );

        // The else-file and check-flag counters only advance when an else
        // arm actually exists.
        let has_else = !or_else.is_empty();
        let (else_prefix, check_attr) = if has_else {
            let else_prefix = self.names.next(NameKind::ElseFile);
            let check = self.names.next(NameKind::Check);
            self.emitter.add_slot(
                unit,
                "else",
                FileKind::Function,
                self.local_attr(&else_prefix),
            );
            (
                Some(else_prefix),
                Some(AttributePath::new(check).prefixed(&self.prefix)),
            )
        } else {
            (None, None)
        };

        self.prefix.push(then_prefix.clone());
        let then_scope = self.scope.enter_local_space(true);
        let then_ops = self.formalize_body(then)?;
        self.scope.leave();
        self.prefix.pop();

        let else_scope = if let Some(else_prefix) = &else_prefix {
            self.prefix.push(else_prefix.clone());
            let scope = self.scope.enter_local_space(true);
            let ops = self.formalize_body(or_else)?;
            self.scope.leave();
            self.prefix.pop();
            Some((scope, ops))
        } else {
            None
        };
        let (else_scope, else_ops) = match else_scope {
            Some((scope, ops)) => (Some(scope), ops),
            None => (None, Vec::new()),
        };

        let block = self.blocks.alloc(BlockState::If(IfBlock {
            unit,
            then_scope,
            else_scope,
            then_prefix,
            else_prefix,
            check_attr,
        }));
        Ok(Op::reference(
            block,
            vec![condition, Op::Seq(then_ops), Op::Seq(else_ops)],
        ))
    }

    fn formalize_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<Op, CompileError> {
        let condition = self.formalize_expr(condition)?;
        let prefix = self.names.next(NameKind::WhileFile);
        let predicate_name = self.names.next(NameKind::PredicateFile);
        let unit = self.emitter.new_unit();
        self.emitter
            .add_slot(unit, "main", FileKind::Function, self.local_attr(&prefix));
        self.emitter.add_slot(
            unit,
            "predicate",
            FileKind::Predicate,
            self.local_attr(&predicate_name),
        );

        self.prefix.push(prefix.clone());
        let scope = self.scope.enter_local_space(true);
        let body = self.formalize_body(body)?;
        self.scope.leave();
        self.prefix.pop();

        let block = self
            .blocks
            .alloc(BlockState::While(LoopBlock { unit, scope, prefix }));
        Ok(Op::reference(block, vec![condition, Op::Seq(body)]))
    }

    /// Classic loop: the init and step statements belong to the enclosing
    /// scope, only the body descends.
    fn formalize_for(
        &mut self,
        init: &Stmt,
        condition: &Expr,
        step: &Stmt,
        body: &[Stmt],
    ) -> Result<Op, CompileError> {
        let init = self.formalize_stmt(init)?;
        let condition = self.formalize_expr(condition)?;
        let step = self.formalize_stmt(step)?;
        let prefix = self.names.next(NameKind::ForFile);
        let predicate_name = self.names.next(NameKind::PredicateFile);
        let unit = self.emitter.new_unit();
        self.emitter
            .add_slot(unit, "main", FileKind::Function, self.local_attr(&prefix));
        self.emitter.add_slot(
            unit,
            "predicate",
            FileKind::Predicate,
            self.local_attr(&predicate_name),
        );

        self.prefix.push(prefix.clone());
        let scope = self.scope.enter_local_space(true);
        let body = self.formalize_body(body)?;
        self.scope.leave();
        self.prefix.pop();

        let block = self
            .blocks
            .alloc(BlockState::For(LoopBlock { unit, scope, prefix }));
        Ok(Op::reference(block, vec![init, condition, step, Op::Seq(body)]))
    }

    fn formalize_for_in(
        &mut self,
        var: &str,
        iter: &Expr,
        body: &[Stmt],
    ) -> Result<Op, CompileError> {
        let iter = self.formalize_expr(iter)?;
        let prefix = self.names.next(NameKind::ForFile);
        let unit = self.emitter.new_unit();
        self.emitter
            .add_slot(unit, "main", FileKind::Function, self.local_attr(&prefix));

        self.prefix.push(prefix.clone());
        let scope = self.scope.enter_local_space(true);
        let var_path = AttributePath::new(var);
        let var_score = ScoreHandle {
            attr: var_path.prefixed(&self.prefix),
            objective: self.names.default_objective(),
        };
        self.scope.write(&var_path, Value::Score(var_score.clone()))?;
        let body = self.formalize_body(body)?;
        self.scope.leave();
        self.prefix.pop();

        let block = self.blocks.alloc(BlockState::ForIn(ForInBlock {
            unit,
            scope,
            prefix,
            var: var_score,
        }));
        Ok(Op::reference(block, vec![iter, Op::Seq(body)]))
    }

    /// The function name binds before the body is walked, so the body (or
    /// a later sibling) can call it.
    fn formalize_func_def(
        &mut self,
        name: &str,
        params: &[Param],
        returns: Option<&ReturnSpec>,
        body: &[Stmt],
    ) -> Result<Op, CompileError> {
        let unit = self.emitter.new_unit();
        self.emitter
            .add_slot(unit, "main", FileKind::Function, self.local_attr(name));
        let block = self.blocks.alloc(BlockState::Function(FunctionBlock {
            unit,
            scope: self.scope.current(),
            name: name.to_owned(),
            params: Vec::new(),
            ret: None,
        }));
        self.scope
            .write(&AttributePath::new(name), Value::Function(block))?;

        self.prefix.push(name.to_owned());
        let scope = self.scope.enter_local_space(true);

        let mut param_scores = Vec::with_capacity(params.len());
        for param in params {
            if self.resolve_class(&param.data_type)? != Builtin::ScoreClass {
                return Err(CompileError::malformed(format!(
                    "parameter '{}' must be a score",
                    param.target
                )));
            }
            let path = AttributePath::new(param.target.as_str());
            let score = ScoreHandle {
                attr: path.prefixed(&self.prefix),
                objective: self.names.default_objective(),
            };
            self.scope.write(&path, Value::Score(score.clone()))?;
            param_scores.push(score);
        }

        let ret = match returns {
            None => None,
            Some(spec) => {
                if self.resolve_class(&spec.data_type)? != Builtin::ScoreClass {
                    return Err(CompileError::malformed(
                        "a function can only return a score",
                    ));
                }
                let slot = self.names.next(NameKind::Return);
                Some(ScoreHandle {
                    attr: AttributePath::new(slot).prefixed(&self.prefix),
                    objective: self.names.default_objective(),
                })
            }
        };

        if let BlockState::Function(state) = self.blocks.get_mut(block) {
            state.scope = scope;
            state.params = param_scores;
            state.ret = ret;
        }

        self.func_stack.push(block);
        let body = self.formalize_body(body)?;
        self.func_stack.pop();
        self.scope.leave();
        self.prefix.pop();

        Ok(Op::reference(block, vec![Op::Seq(body)]))
    }

    fn formalize_namespace(
        &mut self,
        name: &str,
        sections: &[NamespaceBlock],
    ) -> Result<Op, CompileError> {
        let file_name = format!("--namespace--{name}--");
        let unit = self.emitter.new_unit();
        self.emitter
            .add_slot(unit, "main", FileKind::Function, self.local_attr(&file_name));

        self.prefix.push(name.to_owned());
        let scope = self.scope.enter_named_space(name, false);
        let mut body = Vec::new();
        for section in sections {
            let private = match section.visibility {
                Visibility::Private => true,
                Visibility::Public => false,
                Visibility::Default => self.config.default_scope == ScopeMode::Private,
            };
            if private {
                self.scope.enable_private();
            } else {
                self.scope.disable_private();
            }
            body.extend(self.formalize_body(&section.body)?);
        }
        self.scope.disable_private();
        self.scope.leave();
        self.prefix.pop();

        let block = self.blocks.alloc(BlockState::Space(SpaceBlock {
            unit,
            scope,
            name: name.to_owned(),
        }));
        Ok(Op::reference(block, vec![Op::Seq(body)]))
    }

    // ── Expressions ──────────────────────────────────────────────────

    pub(crate) fn formalize_expr(&mut self, expr: &Expr) -> Result<Op, CompileError> {
        match expr {
            Expr::Name { path, prov } => {
                let path = AttributePath::from(path.as_str());
                match self.scope.get(&path) {
                    Ok(Resolved::Value(value)) => Ok(Op::Ready(value)),
                    Ok(Resolved::Space(_)) => Err(CompileError::malformed(format!(
                        "'{path}' is a namespace, not a value"
                    ))),
                    // Not bound yet: leave a placeholder for the second
                    // pass, when every declaration has been seen.
                    Err(CompileError::UnboundName { .. }) => {
                        Ok(Op::Ready(Value::Undefined(path)))
                    }
                    Err(CompileError::HiddenName { path, .. }) => {
                        Err(CompileError::HiddenName {
                            path,
                            prov: prov.clone(),
                        })
                    }
                    Err(other) => Err(other),
                }
            }
            Expr::Int { value } => Ok(Op::Ready(Value::Int(*value))),
            Expr::Str { value } => Ok(Op::Ready(Value::Str(value.clone()))),
            Expr::Unary { op, operand } => {
                let operand = self.formalize_expr(operand)?;
                Ok(Op::construct(Method::Unary(*op), Target::None, vec![operand]))
            }
            Expr::Binary { op, left, right } => {
                let left = self.formalize_expr(left)?;
                let right = self.formalize_expr(right)?;
                Ok(Op::construct(Method::Bin(*op), Target::None, vec![left, right]))
            }
            Expr::Compare { operands, ops } => {
                if operands.len() != ops.len() + 1 || ops.is_empty() {
                    return Err(CompileError::malformed(
                        "comparison needs N operands and N-1 operators",
                    ));
                }
                let operands = operands
                    .iter()
                    .map(|e| self.formalize_expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Op::construct(
                    Method::Compare(ops.clone()),
                    Target::None,
                    operands,
                ))
            }
            Expr::AllOf { terms } => {
                let terms = terms
                    .iter()
                    .map(|e| self.formalize_expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Op::construct(Method::AllOf, Target::None, terms))
            }
            Expr::AnyOf { terms } => {
                let terms = terms
                    .iter()
                    .map(|e| self.formalize_expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Op::construct(Method::AnyOf, Target::None, terms))
            }
            Expr::Call { target, args } => {
                let target = self.formalize_expr(target)?;
                let args = args
                    .iter()
                    .map(|e| self.formalize_expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Op::construct(Method::Call, Target::Op(Box::new(target)), args))
            }
            Expr::Range { start, end } => {
                let start = self.formalize_expr(start)?;
                let end = self.formalize_expr(end)?;
                let predicate_name = self.names.next(NameKind::PredicateFile);
                let unit = self.emitter.new_unit();
                self.emitter.add_slot(
                    unit,
                    "predicate",
                    FileKind::Predicate,
                    self.local_attr(&predicate_name),
                );
                let block = self.blocks.alloc(BlockState::Range(RangeBlock {
                    unit,
                    item: None,
                    end: None,
                }));
                Ok(Op::reference(block, vec![start, end]))
            }
        }
    }
}
