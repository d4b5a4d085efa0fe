//! Expression checking: name resolution, constancy and folding.

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, errors};
use crate::frontend::symbols::{ConstValue, EntityState};

use super::const_eval::{Value, fold_binary, fold_unary, parse_float_literal, parse_int_literal};
use super::{Checker, Context};

impl Checker<'_> {
    pub(super) fn check_expr(&self, expr: &Spanned<Expr>, ctx: &mut Context) -> Value {
        match &expr.node {
            // The parser already reported it.
            Expr::Invalid => {
                ctx.invalid = true;
                Value::Error
            }
            Expr::Ident(name) => self.check_ident(name, expr.span, ctx),
            Expr::Literal(literal) => self.check_literal(literal, expr.span, ctx),
            Expr::Unary(op, operand) => match self.check_expr(operand, ctx) {
                Value::Const(value) => self.folded(fold_unary(*op, value, expr.span), ctx),
                other => other,
            },
            Expr::Binary(lhs, op, rhs) => {
                let lhs = self.check_expr(lhs, ctx);
                let rhs = self.check_expr(rhs, ctx);
                match (lhs, rhs) {
                    (Value::Const(a), Value::Const(b)) => self.folded(fold_binary(*op, a, b, expr.span), ctx),
                    _ => Value::join(&[lhs, rhs]).unwrap_or(Value::Error),
                }
            }
            Expr::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.check_expr(cond, ctx);
                let then_value = self.check_expr(then_branch, ctx);
                let else_value = self.check_expr(else_branch, ctx);
                match (cond, then_value, else_value) {
                    (Value::Const(c), Value::Const(a), Value::Const(b)) => {
                        Value::Const(if c.is_truthy() { a } else { b })
                    }
                    _ => Value::join(&[cond, then_value, else_value]).unwrap_or(Value::Error),
                }
            }
            Expr::Paren(inner) => self.check_expr(inner, ctx),
            Expr::Function(func) => {
                self.check_function(func, expr.span, ctx);
                Value::Const(ConstValue::Function)
            }
        }
    }

    fn folded(&self, result: Result<ConstValue, Diagnostic>, ctx: &mut Context) -> Value {
        match result {
            Ok(value) => Value::Const(value),
            Err(diagnostic) => {
                ctx.error(diagnostic);
                Value::Error
            }
        }
    }

    fn check_literal(&self, literal: &Literal, span: Span, ctx: &mut Context) -> Value {
        match literal {
            Literal::Int(text) => match parse_int_literal(text) {
                Ok(value) => Value::Const(ConstValue::Int(value)),
                Err(e) if matches!(e.kind(), std::num::IntErrorKind::PosOverflow) => {
                    ctx.error(errors::integer_out_of_range(text, span));
                    Value::Error
                }
                Err(_) => {
                    ctx.error(errors::malformed_literal(text, span));
                    Value::Error
                }
            },
            Literal::Float(text) => match parse_float_literal(text) {
                Ok(value) => Value::Const(ConstValue::Float(value)),
                Err(_) => {
                    ctx.error(errors::malformed_literal(text, span));
                    Value::Error
                }
            },
        }
    }

    /// Resolve an identifier and classify it.
    ///
    /// A mutable entity is a run-time value whatever its state. Constant top-level entities are gated on their
    /// resolution state:
    ///
    /// | State | Result |
    /// |-------|--------|
    /// | `Unchecked` | pending (wait on it) |
    /// | `Checking` by this executor | cyclic dependency error |
    /// | `Checking` by another executor, `Emitting` | pending (wait on it) |
    /// | `Emitted` | its value |
    /// | `Failed` | invalid dependency error |
    fn check_ident(&self, name: &str, span: Span, ctx: &mut Context) -> Value {
        let Some(id) = self.symbols.lookup(ctx.scope, name) else {
            ctx.error(errors::unresolved_identifier(name, span));
            return Value::Error;
        };
        let entity = self.symbols.entity(id);

        if !entity.constant {
            return Value::Runtime;
        }
        if !entity.is_top_level() {
            return match entity.value() {
                Some(value) => Value::Const(value),
                // A local constant without a value is still pending or already failed.
                None if ctx.invalid => Value::Error,
                None => Value::Pending,
            };
        }

        match entity.state() {
            EntityState::Checking(executor) if executor == ctx.executor => {
                ctx.error(errors::cyclic_dependency(name, span));
                Value::Error
            }
            EntityState::Unchecked | EntityState::Checking(_) | EntityState::Emitting => {
                ctx.wait_on(id);
                Value::Pending
            }
            EntityState::Emitted => match entity.value() {
                Some(value) => Value::Const(value),
                None => Value::Runtime,
            },
            EntityState::Failed => {
                ctx.error(errors::invalid_dependency(name, span));
                Value::Error
            }
        }
    }

    /// Check a function literal: parameters in a fresh scope, body in the same scope, trailing `return`.
    fn check_function(&self, func: &FunctionLit, span: Span, ctx: &mut Context) {
        let saved = ctx.scope;
        ctx.scope = self.symbols.push_scope(saved);
        ctx.function_depth += 1;

        for param in &func.params {
            self.bind_local(param.entity, &param.name, ctx);
        }
        for stmt in &func.body.node.stmts {
            self.check_stmt(stmt, ctx);
        }
        if !matches!(func.body.node.stmts.last().map(|s| &s.node), Some(Stmt::Return(_))) {
            ctx.error(errors::missing_return(span));
        }

        ctx.function_depth -= 1;
        ctx.scope = saved;
    }
}
