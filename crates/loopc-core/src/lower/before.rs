//! Lowering-before: rewrites that introduce new names, run ahead of
//! resolution because resolution needs to see the bindings they create
//! (§4.1).

use crate::ast::{Expr, Identifier, Module, Pattern, Stmt};
use crate::span::SourceSpan;

/// Mints synthetic identifiers. Kept as a field on the pass object (not a
/// true process-wide global, per §9) so repeated compiles in one process
/// stay hermetic; a fresh `LowerBefore` still produces stable output for a
/// given input.
pub struct LowerBefore {
    counter: usize,
}

impl LowerBefore {
    pub fn new() -> Self {
        LowerBefore { counter: 0 }
    }

    fn synth_name(&mut self, prefix: &str) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("{prefix}{n}")
    }

    pub fn lower_module(&mut self, module: Module) -> Module {
        Module {
            statements: self.lower_stmt_list(module.statements),
            globals_count: module.globals_count,
        }
    }

    fn lower_stmt_list(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        stmts.into_iter().flat_map(|s| self.lower_stmt(s)).collect()
    }

    fn lower_block_field(&mut self, body: Box<Stmt>) -> Box<Stmt> {
        match *body {
            Stmt::BlockStmt { span, stmts, locals } => Box::new(Stmt::BlockStmt {
                span,
                stmts: self.lower_stmt_list(stmts),
                locals,
            }),
            other => Box::new(other),
        }
    }

    fn lower_stmt(&mut self, stmt: Stmt) -> Vec<Stmt> {
        match stmt {
            Stmt::ImportFromStmt { span, names, path } => {
                let module_name = self.synth_name("__module");
                let module_ident = Identifier::new(span, module_name);
                let mut out = vec![Stmt::ImportAsStmt {
                    span,
                    path,
                    name: module_ident.clone(),
                }];
                for name in names {
                    let name_span = name.span;
                    out.push(Stmt::LetDecl {
                        span: name_span,
                        export: false,
                        pattern: Pattern::Identifier { name: name.clone() },
                        value: Some(Expr::GetAttrExpr {
                            span: name_span,
                            object: Box::new(Expr::VarExpr {
                                name: module_ident.clone(),
                            }),
                            attr: name,
                        }),
                    });
                }
                out
            }

            Stmt::VarDecl {
                span,
                export,
                pattern: Pattern::List { patterns, .. },
                value,
            } => {
                let main_name = self.synth_name("__mainVar");
                let main_ident = Identifier::new(span, main_name);
                let main_decl = Stmt::LetDecl {
                    span,
                    export,
                    pattern: Pattern::Identifier {
                        name: main_ident.clone(),
                    },
                    value,
                };
                let mut combined = vec![main_decl];
                for (i, pattern) in patterns.into_iter().enumerate() {
                    let pspan = pattern.span();
                    combined.push(Stmt::VarDecl {
                        span: pspan,
                        export: false,
                        pattern,
                        value: Some(index_expr(&main_ident, i, pspan)),
                    });
                }
                // Re-lower: nested list patterns get desugared in turn.
                self.lower_stmt_list(combined)
            }

            Stmt::ForInStmt {
                span,
                pattern: Pattern::List { patterns, .. },
                expr,
                body,
            } => {
                let main_name = self.synth_name("__mainVar");
                let main_ident = Identifier::new(span, main_name);
                let mut prefix_stmts = Vec::new();
                for (i, pattern) in patterns.into_iter().enumerate() {
                    let pspan = pattern.span();
                    prefix_stmts.push(Stmt::LetDecl {
                        span: pspan,
                        export: false,
                        pattern,
                        value: Some(index_expr(&main_ident, i, pspan)),
                    });
                }
                let body_span = body.span();
                let mut new_body_stmts = prefix_stmts;
                match *body {
                    Stmt::BlockStmt { stmts, .. } => new_body_stmts.extend(stmts),
                    other => new_body_stmts.push(other),
                }
                vec![Stmt::ForInStmt {
                    span,
                    pattern: Pattern::Identifier { name: main_ident },
                    expr,
                    body: Box::new(Stmt::BlockStmt {
                        span: body_span,
                        stmts: new_body_stmts,
                        locals: Vec::new(),
                    }),
                    iter_index: None,
                    counter_index: None,
                    locals: Vec::new(),
                }]
            }

            Stmt::FuncDecl {
                span,
                export,
                name,
                args,
                body,
                upvalues,
            } => vec![Stmt::FuncDecl {
                span,
                export,
                name,
                args,
                body: self.lower_block_field(body),
                upvalues,
            }],

            Stmt::ClassDecl {
                span,
                export,
                name,
                parent,
                methods,
            } => {
                let methods = methods
                    .into_iter()
                    .map(|m| crate::ast::Method {
                        span: m.span,
                        name: m.name,
                        args: m.args,
                        body: self.lower_block_field(m.body),
                        upvalues: m.upvalues,
                    })
                    .collect();
                vec![Stmt::ClassDecl {
                    span,
                    export,
                    name,
                    parent,
                    methods,
                }]
            }

            Stmt::BlockStmt { span, stmts, locals } => vec![Stmt::BlockStmt {
                span,
                stmts: self.lower_stmt_list(stmts),
                locals,
            }],

            other => vec![other],
        }
    }
}

impl Default for LowerBefore {
    fn default() -> Self {
        Self::new()
    }
}

fn index_expr(main_ident: &Identifier, index: usize, span: SourceSpan) -> Expr {
    Expr::GetItemExpr {
        span,
        object: Box::new(Expr::VarExpr {
            name: main_ident.clone(),
        }),
        index: vec![Expr::IntegerLiteral {
            span,
            value: index as i64,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOpType, Stmt};

    fn span() -> SourceSpan {
        SourceSpan::new(0, 1)
    }

    #[test]
    fn import_from_desugars_to_import_as_plus_let_decls() {
        let mut pass = LowerBefore::new();
        let stmts = vec![Stmt::ImportFromStmt {
            span: span(),
            names: vec![Identifier::new(span(), "x"), Identifier::new(span(), "y")],
            path: "m".to_string(),
        }];
        let lowered = pass.lower_stmt_list(stmts);
        assert_eq!(lowered.len(), 3);
        assert!(matches!(lowered[0], Stmt::ImportAsStmt { .. }));
        assert!(matches!(lowered[1], Stmt::LetDecl { .. }));
        assert!(matches!(lowered[2], Stmt::LetDecl { .. }));
    }

    #[test]
    fn var_decl_list_pattern_desugars_through_main_var() {
        let mut pass = LowerBefore::new();
        let a = Identifier::new(span(), "a");
        let b = Identifier::new(span(), "b");
        let stmts = vec![Stmt::VarDecl {
            span: span(),
            export: false,
            pattern: Pattern::List {
                span: span(),
                patterns: vec![
                    Pattern::Identifier { name: a },
                    Pattern::Identifier { name: b },
                ],
            },
            value: Some(Expr::IntegerLiteral { span: span(), value: 0 }),
        }];
        let lowered = pass.lower_stmt_list(stmts);
        // main LetDecl + 2 VarDecls
        assert_eq!(lowered.len(), 3);
        assert!(matches!(lowered[0], Stmt::LetDecl { .. }));
        assert!(matches!(lowered[1], Stmt::VarDecl { .. }));
        assert!(matches!(lowered[2], Stmt::VarDecl { .. }));
    }

    #[test]
    fn unrelated_binary_op_is_untouched() {
        // sanity: passthrough doesn't choke on ordinary expressions
        let _ = BinaryOpType::Add;
    }
}
