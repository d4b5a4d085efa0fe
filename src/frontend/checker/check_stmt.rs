//! Statement checking: declarations, assignments, returns and blocks.

use crate::frontend::ast::*;
use crate::frontend::diagnostics::errors;
use crate::frontend::symbols::{ConstValue, EntityId, ScopeId};

use super::const_eval::Value;
use super::{Checker, Context};

const ENTRY_POINT: &str = "main";

impl Checker<'_> {
    /// Check a top-level declaration whose entity the parser already bound in the global scope.
    ///
    /// Returns the folded value when the right-hand side is constant.
    pub(super) fn check_top_level_decl(&self, decl: &Decl, ctx: &mut Context) -> Option<ConstValue> {
        let value = self.check_decl_value(decl, ctx);

        if decl.name.node == ENTRY_POINT {
            if decl.constant && matches!(decl.value.node, Expr::Function(_)) {
                ctx.entry_point = Some(decl.entity);
            } else {
                ctx.warn(errors::main_not_function(decl.name.span));
            }
        }

        match value {
            Value::Const(value) => Some(value),
            _ => None,
        }
    }

    pub(super) fn check_stmt(&self, stmt: &Spanned<Stmt>, ctx: &mut Context) {
        match &stmt.node {
            // The parser already reported it.
            Stmt::Invalid => ctx.invalid = true,
            Stmt::Decl(decl) => {
                let value = self.check_decl_value(decl, ctx);
                if let (true, Value::Const(value)) = (decl.constant, value) {
                    self.symbols.set_value(decl.entity, value);
                }
                self.bind_local(decl.entity, &decl.name, ctx);
            }
            Stmt::Assign(assign) => self.check_assign(assign, stmt.span, ctx),
            Stmt::Return(value) => {
                self.check_expr(value, ctx);
            }
            Stmt::Block(block) => {
                let saved = ctx.scope;
                ctx.scope = self.symbols.push_scope(saved);
                for stmt in &block.stmts {
                    self.check_stmt(stmt, ctx);
                }
                ctx.scope = saved;
            }
            Stmt::Expr(expr) => {
                self.check_expr(expr, ctx);
            }
        }
    }

    /// Check the right-hand side of a declaration and apply the constant-declaration rule.
    ///
    /// A `::` declaration whose value is not constant is an error, unless the value is merely waiting on an
    /// unsettled dependency.
    fn check_decl_value(&self, decl: &Decl, ctx: &mut Context) -> Value {
        let value = self.check_expr(&decl.value, ctx);
        if decl.constant && value == Value::Runtime {
            ctx.error(errors::expected_constant(&decl.name.node, decl.value.span));
            return Value::Error;
        }
        value
    }

    /// Bind a local entity in the current scope; names are unique per scope.
    pub(super) fn bind_local(&self, entity: EntityId, name: &Spanned<Ident>, ctx: &mut Context) {
        debug_assert_ne!(ctx.scope, ScopeId::GLOBAL, "locals never bind in the global scope");
        if let Some(previous) = self.symbols.declare(ctx.scope, entity) {
            let previous_span = self.symbols.entity(previous).span;
            ctx.error(errors::duplicate_declaration(&name.node, name.span, previous_span));
        }
    }

    /// `name = value`: the target must exist and must not be constant.
    ///
    /// An unknown target aborts the statement; a constant target is reported and the value is still checked.
    fn check_assign(&self, assign: &Assign, span: Span, ctx: &mut Context) {
        let Some(target) = self.symbols.lookup(ctx.scope, &assign.target.node) else {
            ctx.error(errors::unresolved_identifier(&assign.target.node, assign.target.span));
            return;
        };
        let entity = self.symbols.entity(target);
        if entity.constant {
            ctx.error(errors::assign_to_constant(&assign.target.node, span, entity.span));
        }
        self.check_expr(&assign.value, ctx);
    }
}
