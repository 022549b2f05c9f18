//! Lowering-after: rewrites safe only once binding is fixed (§4.2). The
//! only rewrite is demoting `let` to `var` — the distinction only mattered
//! to the resolver's final-binding diagnostics.

use crate::ast::{Module, Stmt};

pub struct LowerAfter;

impl LowerAfter {
    pub fn new() -> Self {
        LowerAfter
    }

    pub fn lower_module(&mut self, module: Module) -> Module {
        Module {
            statements: self.lower_stmt_list(module.statements),
            globals_count: module.globals_count,
        }
    }

    fn lower_stmt_list(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        stmts.into_iter().map(|s| self.lower_stmt(s)).collect()
    }

    fn lower_stmt(&mut self, stmt: Stmt) -> Stmt {
        match stmt {
            Stmt::LetDecl {
                span,
                export,
                pattern,
                value,
            } => Stmt::VarDecl {
                span,
                export,
                pattern,
                value,
            },
            Stmt::BlockStmt { span, stmts, locals } => Stmt::BlockStmt {
                span,
                stmts: self.lower_stmt_list(stmts),
                locals,
            },
            other => other,
        }
    }
}

impl Default for LowerAfter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Identifier, Pattern};
    use crate::span::SourceSpan;

    #[test]
    fn let_decl_becomes_var_decl() {
        let mut pass = LowerAfter::new();
        let span = SourceSpan::new(0, 1);
        let stmts = vec![Stmt::LetDecl {
            span,
            export: false,
            pattern: Pattern::Identifier {
                name: Identifier::new(span, "x"),
            },
            value: None,
        }];
        let lowered = pass.lower_stmt_list(stmts);
        assert!(matches!(lowered[0], Stmt::VarDecl { .. }));
    }

    #[test]
    fn idempotent_on_already_lowered_tree() {
        let mut pass = LowerAfter::new();
        let span = SourceSpan::new(0, 1);
        let stmts = vec![Stmt::VarDecl {
            span,
            export: false,
            pattern: Pattern::Identifier {
                name: Identifier::new(span, "x"),
            },
            value: None,
        }];
        let once = pass.lower_stmt_list(stmts.clone());
        let mut pass2 = LowerAfter::new();
        let twice = pass2.lower_stmt_list(once.clone());
        assert_eq!(once, twice);
    }
}
