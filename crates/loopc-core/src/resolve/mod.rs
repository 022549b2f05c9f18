//! The semantic/resolution pass (§4.3): fills in every `Identifier`'s
//! `ref_type`/`ref_index`, checks binding rules, builds per-function upvalue
//! lists and per-block capture-flag lists, and drives compilation of
//! imported submodules.

mod env;

use crate::ast::{Expr, Identifier, Method, Module, Pattern, RefType, Stmt, UpvalueDescriptor};
use crate::diagnostics::ErrorListener;
use crate::span::SourceSpan;
use env::Env;

/// Invoked once per `ImportAsStmt` with the raw import path; returns
/// whether the recursive compile succeeded (no errors). The resolver
/// doesn't need the imported module's value back, only whether this
/// module's own compilation should be considered tainted by a broken
/// import.
pub type ImportCompiler<'a> = dyn FnMut(&str, SourceSpan) -> bool + 'a;

pub struct Resolver<'a> {
    listener: &'a mut dyn ErrorListener,
    envs: Vec<Env>,
    loop_depth: usize,
    in_method: bool,
    import_compiler: &'a mut ImportCompiler<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(listener: &'a mut dyn ErrorListener, import_compiler: &'a mut ImportCompiler<'a>) -> Self {
        Resolver {
            listener,
            envs: vec![Env::new_top()],
            loop_depth: 0,
            in_method: false,
            import_compiler,
        }
    }

    pub fn resolve_module(&mut self, mut module: Module) -> Module {
        self.collect_globals(&mut module.statements);
        for stmt in &mut module.statements {
            self.resolve_stmt(stmt);
        }
        module.globals_count = self.envs[0].globals.as_ref().unwrap().len();
        module
    }

    // ---- collect_globals pre-pass --------------------------------------

    /// Only the literal top-level statement list is scanned: a binding
    /// introduced inside a nested block — even at top level — is a local,
    /// not a global (see `is_top_level_position`), so nothing nested needs
    /// pre-allocating here.
    fn collect_globals(&mut self, stmts: &mut [Stmt]) {
        for stmt in stmts.iter_mut() {
            match stmt {
                Stmt::VarDecl { export, pattern, .. } => self.predeclare_pattern(pattern, *export, false),
                Stmt::LetDecl { export, pattern, .. } => self.predeclare_pattern(pattern, *export, true),
                Stmt::FuncDecl { export, name, .. } => self.predeclare_name(name, *export, true),
                Stmt::ClassDecl { export, name, .. } => self.predeclare_name(name, *export, true),
                Stmt::ImportAsStmt { name, .. } => self.predeclare_name(name, false, true),
                _ => {}
            }
        }
    }

    fn predeclare_pattern(&mut self, pattern: &mut Pattern, export: bool, is_final: bool) {
        match pattern {
            Pattern::Identifier { name } => self.predeclare_name(name, export, is_final),
            Pattern::List { patterns, .. } => {
                for p in patterns {
                    self.predeclare_pattern(p, false, is_final);
                }
            }
        }
    }

    fn predeclare_name(&mut self, identifier: &mut Identifier, export: bool, is_final: bool) {
        let top = &mut self.envs[0];
        let slots = if export {
            top.exports.as_mut().unwrap()
        } else {
            top.globals.as_mut().unwrap()
        };
        if let Some(prev) = slots.iter().find(|g| g.name == identifier.name) {
            let prev_span = prev.span;
            self.listener.error(
                Some(identifier.span),
                format!("redefinition of '{}' at module scope", identifier.name),
            );
            self.listener.note(Some(prev_span), "previous definition here".to_string());
        }
        let index = slots.len();
        slots.push(env::GlobalEntry {
            name: identifier.name.clone(),
            span: identifier.span,
            is_final,
        });
        identifier.ref_type = Some(if export { RefType::Export } else { RefType::Global });
        identifier.ref_index = Some(index);
    }

    // ---- scope/env helpers ----------------------------------------------

    fn current_env(&self) -> &Env {
        self.envs.last().unwrap()
    }

    fn current_env_mut(&mut self) -> &mut Env {
        self.envs.last_mut().unwrap()
    }

    fn is_top_level_position(&self) -> bool {
        self.envs.len() == 1 && self.current_env().scope == 0
    }

    fn enter_scope(&mut self) {
        self.current_env_mut().scope += 1;
    }

    /// Pops locals introduced in the scope being left, returning their
    /// captured flags in declaration order, for `BlockStmt::locals`.
    fn exit_scope(&mut self) -> Vec<bool> {
        let env = self.current_env_mut();
        let scope = env.scope;
        let mut flags = Vec::new();
        while let Some(last) = env.defs.last() {
            if last.scope != scope {
                break;
            }
            let local = env.defs.pop().unwrap();
            flags.push(local.is_captured);
        }
        flags.reverse();
        env.scope -= 1;
        flags
    }

    /// Defines `identifier` at the current position: a global/export slot
    /// at true module scope (already pre-allocated by `collect_globals`,
    /// so this is a no-op there beyond the export-misuse check), or a
    /// fresh local slot otherwise.
    fn define(&mut self, identifier: &mut Identifier, export: bool, is_final: bool) {
        if self.is_top_level_position() {
            return;
        }
        if export {
            self.listener.error(
                Some(identifier.span),
                format!("'{}' cannot be exported outside module scope", identifier.name),
            );
        }
        if let Some(prev) = self.current_env().redefinition_in_scope(&identifier.name) {
            let prev_span = prev.span;
            self.listener.error(
                Some(identifier.span),
                format!("redefinition of '{}'", identifier.name),
            );
            self.listener.note(Some(prev_span), "previous definition here".to_string());
        }
        let scope = self.current_env().scope;
        let env = self.current_env_mut();
        let index = env.defs.len();
        env.defs.push(env::Local {
            name: identifier.name.clone(),
            span: identifier.span,
            scope,
            is_captured: false,
            is_final,
        });
        identifier.ref_type = Some(RefType::Local);
        identifier.ref_index = Some(index);
    }

    /// Allocates a local slot for a compiler-synthesized name (never
    /// subject to redefinition checks, since user source can't spell a
    /// `$`-prefixed identifier). Returns the slot index.
    fn define_hidden(&mut self, name: &str) -> usize {
        let scope = self.current_env().scope;
        let env = self.current_env_mut();
        let index = env.defs.len();
        env.defs.push(env::Local {
            name: name.to_string(),
            span: SourceSpan::new(0, 0),
            scope,
            is_captured: false,
            is_final: true,
        });
        index
    }

    fn define_pattern(&mut self, pattern: &mut Pattern, export: bool, is_final: bool) {
        match pattern {
            Pattern::Identifier { name } => self.define(name, export, is_final),
            Pattern::List { patterns, .. } => {
                for p in patterns {
                    self.define_pattern(p, false, is_final);
                }
            }
        }
    }

    /// Local in the current function env, else an upvalue walk up the
    /// enclosing function envs, else global/export at module scope, else
    /// "not defined".
    fn resolve_name(&mut self, identifier: &mut Identifier) {
        if identifier.name == "super" {
            self.resolve_super(identifier);
            return;
        }
        let depth = self.envs.len() - 1;
        if let Some(index) = self.envs[depth].resolve_local(&identifier.name) {
            identifier.ref_type = Some(RefType::Local);
            identifier.ref_index = Some(index);
            return;
        }
        if let Some(index) = self.resolve_upvalue(depth, &identifier.name, identifier.span) {
            identifier.ref_type = Some(RefType::Upvalue);
            identifier.ref_index = Some(index);
            return;
        }
        if let Some(index) = self.global_index(&identifier.name) {
            identifier.ref_type = Some(RefType::Global);
            identifier.ref_index = Some(index);
            return;
        }
        if let Some(index) = self.export_index(&identifier.name) {
            identifier.ref_type = Some(RefType::Export);
            identifier.ref_index = Some(index);
            return;
        }
        self.listener.error(
            Some(identifier.span),
            format!("'{}' is not defined", identifier.name),
        );
    }

    fn global_index(&self, name: &str) -> Option<usize> {
        self.envs[0].globals.as_ref().unwrap().iter().position(|g| g.name == name)
    }

    fn export_index(&self, name: &str) -> Option<usize> {
        self.envs[0].exports.as_ref().unwrap().iter().position(|g| g.name == name)
    }

    /// `super` never occupies a local slot: it's checked (method body,
    /// parent class present) and then resolved to the same receiver slot 0
    /// already holds for `this`, since every method's `this` already names
    /// the instance `super.method()` would dispatch on.
    fn resolve_super(&mut self, identifier: &mut Identifier) {
        if !self.in_method {
            self.listener.error(
                Some(identifier.span),
                "'super' is only valid inside a method body".to_string(),
            );
            return;
        }
        let depth = self.envs.len() - 1;
        if !self.envs[depth].has_parent {
            self.listener.error(
                Some(identifier.span),
                "'super' used in a class with no parent".to_string(),
            );
            return;
        }
        identifier.ref_type = Some(RefType::Local);
        identifier.ref_index = Some(0);
    }

    /// Walks the env stack outward from `depth`, recursively adding an
    /// upvalue at each level until the owning local is found, then threads
    /// the descriptor chain back down. Each level re-derives its own
    /// `(is_local, index)` pair from only its immediate parent.
    ///
    /// `span` is only used to report the §4.3/§7 "too many upvalues"
    /// diagnostic when a level's 256-upvalue cap is hit; it does not affect
    /// resolution itself.
    fn resolve_upvalue(&mut self, depth: usize, name: &str, span: SourceSpan) -> Option<usize> {
        if depth == 0 {
            return None;
        }
        let parent_depth = depth - 1;
        if let Some(local_index) = self.envs[parent_depth].resolve_local(name) {
            self.envs[parent_depth].defs[local_index].is_captured = true;
            let descriptor = UpvalueDescriptor { index: local_index, is_local: true };
            return match self.envs[depth].add_upvalue(descriptor) {
                Some(index) => Some(index),
                None => {
                    self.listener
                        .error(Some(span), format!("too many upvalues in '{}'", self.envs[depth].label));
                    None
                }
            };
        }
        let parent_upvalue = self.resolve_upvalue(parent_depth, name, span)?;
        let descriptor = UpvalueDescriptor { index: parent_upvalue, is_local: false };
        match self.envs[depth].add_upvalue(descriptor) {
            Some(index) => Some(index),
            None => {
                self.listener
                    .error(Some(span), format!("too many upvalues in '{}'", self.envs[depth].label));
                None
            }
        }
    }

    fn lookup_is_final(&self, name: &str) -> Option<bool> {
        let depth = self.envs.len() - 1;
        if let Some(index) = self.envs[depth].resolve_local(name) {
            return Some(self.envs[depth].defs[index].is_final);
        }
        if let Some(globals) = self.envs[0].globals.as_ref() {
            if let Some(g) = globals.iter().find(|g| g.name == name) {
                return Some(g.is_final);
            }
        }
        if let Some(exports) = self.envs[0].exports.as_ref() {
            if let Some(g) = exports.iter().find(|g| g.name == name) {
                return Some(g.is_final);
            }
        }
        None
    }

    // ---- statements -------------------------------------------------------

    fn resolve_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::ImportAsStmt { name, path, span } => {
                // "builtins" names the VM's built-in module; it has no
                // `.loop` source file to recursively compile (§4.3).
                if path != "builtins" {
                    let ok = (self.import_compiler)(path, *span);
                    if !ok {
                        self.listener.error(
                            Some(*span),
                            format!("failed to compile imported module '{path}'"),
                        );
                    }
                }
                self.define(name, false, true);
            }
            Stmt::ImportFromStmt { .. } => {
                unreachable!("ImportFromStmt must be desugared before resolution")
            }
            Stmt::PrintStmt { expr, .. } | Stmt::ExprStmt { expr, .. } | Stmt::ThrowStmt { expr, .. } => {
                self.resolve_expr(expr);
            }
            Stmt::VarDecl { export, pattern, value, .. } => {
                if let Some(v) = value {
                    self.resolve_expr(v);
                }
                self.define_pattern(pattern, *export, false);
            }
            Stmt::LetDecl { export, pattern, value, .. } => {
                if let Some(v) = value {
                    self.resolve_expr(v);
                }
                self.define_pattern(pattern, *export, true);
            }
            Stmt::BlockStmt { stmts, locals, .. } => {
                self.enter_scope();
                for s in stmts.iter_mut() {
                    self.resolve_stmt(s);
                }
                *locals = self.exit_scope();
            }
            Stmt::IfStmt { condition, then_arm, else_arm, .. } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_arm);
                if let Some(else_arm) = else_arm {
                    self.resolve_stmt(else_arm);
                }
            }
            Stmt::WhileStmt { condition, block, .. } => {
                self.resolve_expr(condition);
                self.loop_depth += 1;
                self.resolve_stmt(block);
                self.loop_depth -= 1;
            }
            Stmt::FuncDecl { export, name, args, body, upvalues, .. } => {
                self.define(name, *export, true);
                *upvalues = self.resolve_function(args, body, false, false);
            }
            Stmt::ReturnStmt { value, .. } => {
                if let Some(v) = value {
                    self.resolve_expr(v);
                }
            }
            Stmt::ClassDecl { export, name, parent, methods, .. } => {
                if let Some(parent_ident) = parent {
                    self.resolve_name(parent_ident);
                }
                self.define(name, *export, true);
                let has_parent = parent.is_some();
                for method in methods {
                    self.resolve_method(method, has_parent);
                }
            }
            Stmt::TryStmt { try_block, catch_name, catch_block, .. } => {
                self.resolve_stmt(try_block);
                self.enter_scope();
                self.define(catch_name, false, true);
                self.resolve_stmt(catch_block);
                let _ = self.exit_scope();
            }
            Stmt::ForInStmt {
                pattern,
                expr,
                body,
                iter_index,
                counter_index,
                locals,
            } => {
                self.resolve_expr(expr);
                self.enter_scope();
                // Two hidden locals drive the length/GetItem iteration
                // protocol (§4.5); allocated through the ordinary local
                // machinery so the enclosing BlockStmt-style cleanup pops
                // them same as any other local.
                *iter_index = Some(self.define_hidden("$iter"));
                *counter_index = Some(self.define_hidden("$i"));
                self.define_pattern(pattern, false, true);
                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;
                *locals = self.exit_scope();
            }
            Stmt::BreakStmt { span } | Stmt::ContinueStmt { span } => {
                if self.loop_depth == 0 {
                    self.listener.error(Some(*span), "break/continue outside of a loop".to_string());
                }
            }
        }
    }

    /// Pushes a fresh function env, resolves parameters and body, pops the
    /// env, and returns its upvalue list for the caller to stash on the
    /// owning `FuncDecl`/`Method` node.
    fn resolve_function(
        &mut self,
        args: &mut [Identifier],
        body: &mut Stmt,
        has_parent: bool,
        in_method: bool,
    ) -> Vec<UpvalueDescriptor> {
        self.envs.push(Env::new_function("<function>".to_string(), has_parent));
        let prev_in_method = self.in_method;
        let prev_loop_depth = self.loop_depth;
        self.in_method = in_method;
        self.loop_depth = 0;
        for arg in args.iter_mut() {
            self.define(arg, false, false);
        }
        match body {
            Stmt::BlockStmt { stmts, locals, .. } => {
                self.enter_scope();
                for s in stmts.iter_mut() {
                    self.resolve_stmt(s);
                }
                *locals = self.exit_scope();
            }
            other => self.resolve_stmt(other),
        }
        self.in_method = prev_in_method;
        self.loop_depth = prev_loop_depth;
        self.envs.pop().unwrap().upvalues
    }

    fn resolve_method(&mut self, method: &mut Method, has_parent: bool) {
        let is_init = method.name.name == "init";
        if is_init {
            self.check_init_returns(&method.body);
        }
        method.upvalues = self.resolve_function(&mut method.args, &mut method.body, has_parent, true);
    }

    /// `init` may only contain a bare `return;` or `return init;` (§4.3).
    fn check_init_returns(&mut self, body: &Stmt) {
        fn walk(stmt: &Stmt, listener: &mut dyn ErrorListener) {
            match stmt {
                Stmt::ReturnStmt { value: None, .. } => {}
                Stmt::ReturnStmt {
                    value: Some(Expr::VarExpr { name }),
                    ..
                } if name.name == "init" => {}
                Stmt::ReturnStmt { span, .. } => listener.error(
                    Some(*span),
                    "'init' may only return bare 'return;' or 'return init;'".to_string(),
                ),
                Stmt::BlockStmt { stmts, .. } => {
                    for s in stmts {
                        walk(s, listener);
                    }
                }
                Stmt::IfStmt { then_arm, else_arm, .. } => {
                    walk(then_arm, listener);
                    if let Some(e) = else_arm {
                        walk(e, listener);
                    }
                }
                Stmt::WhileStmt { block, .. } => walk(block, listener),
                Stmt::TryStmt { try_block, catch_block, .. } => {
                    walk(try_block, listener);
                    walk(catch_block, listener);
                }
                Stmt::ForInStmt { body, .. } => walk(body, listener),
                _ => {}
            }
        }
        walk(body, self.listener);
    }

    // ---- expressions --------------------------------------------------

    fn resolve_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::IntegerLiteral { .. }
            | Expr::BoolLiteral { .. }
            | Expr::NullLiteral { .. }
            | Expr::StringLiteral { .. } => {}
            Expr::VarExpr { name } => self.resolve_name(name),
            Expr::Assignment { target, value, .. } => {
                self.resolve_expr(value);
                self.resolve_assignment_target(target);
            }
            Expr::UnaryOp { operand, .. } => self.resolve_expr(operand),
            Expr::BinaryOp { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::CallExpr { callee, args, .. } => {
                self.resolve_expr(callee);
                for a in args {
                    self.resolve_expr(a);
                }
            }
            Expr::GetAttrExpr { object, .. } => self.resolve_expr(object),
            Expr::GetItemExpr { object, index, .. } => {
                self.resolve_expr(object);
                for i in index {
                    self.resolve_expr(i);
                }
            }
            Expr::DictionaryLiteral { entries, .. } => {
                for pair in entries {
                    self.resolve_expr(&mut pair.key);
                    self.resolve_expr(&mut pair.value);
                }
            }
            Expr::ListLiteral { elements, .. } => {
                for e in elements {
                    self.resolve_expr(e);
                }
            }
        }
    }

    fn resolve_assignment_target(&mut self, target: &mut Expr) {
        match target {
            Expr::VarExpr { name } if name.name == "super" => {
                self.listener.error(Some(name.span), "cannot assign to 'super'".to_string());
            }
            Expr::VarExpr { name } => {
                let is_final = self.lookup_is_final(&name.name);
                self.resolve_name(name);
                if is_final == Some(true) {
                    self.listener.error(
                        Some(name.span),
                        format!("cannot assign to '{}', it is declared with let", name.name),
                    );
                }
            }
            Expr::GetAttrExpr { object, .. } => self.resolve_expr(object),
            Expr::GetItemExpr { object, index, .. } => {
                self.resolve_expr(object);
                for i in index {
                    self.resolve_expr(i);
                }
            }
            other => {
                self.listener.error(Some(other.span()), "invalid assignment target".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingListener;
    use crate::span::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::new(0, 1)
    }

    fn resolve(module: Module) -> (Module, CollectingListener) {
        let mut listener = CollectingListener::new("t.loop");
        let mut import_compiler = |_: &str, _: SourceSpan| true;
        let module = {
            let mut resolver = Resolver::new(&mut listener, &mut import_compiler);
            resolver.resolve_module(module)
        };
        (module, listener)
    }

    #[test]
    fn top_level_var_decl_resolves_to_global() {
        let name = Identifier::new(span(), "x");
        let module = Module::new(vec![Stmt::VarDecl {
            span: span(),
            export: false,
            pattern: Pattern::Identifier { name },
            value: Some(Expr::IntegerLiteral { span: span(), value: 1 }),
        }]);
        let (module, listener) = resolve(module);
        assert!(!listener.had_error());
        assert_eq!(module.globals_count, 1);
        match &module.statements[0] {
            Stmt::VarDecl { pattern: Pattern::Identifier { name }, .. } => {
                assert_eq!(name.ref_type, Some(RefType::Global));
                assert_eq!(name.ref_index, Some(0));
            }
            _ => panic!("expected VarDecl"),
        }
    }

    #[test]
    fn redefinition_at_module_scope_is_an_error() {
        let a = Identifier::new(span(), "x");
        let b = Identifier::new(span(), "x");
        let module = Module::new(vec![
            Stmt::VarDecl {
                span: span(),
                export: false,
                pattern: Pattern::Identifier { name: a },
                value: None,
            },
            Stmt::VarDecl {
                span: span(),
                export: false,
                pattern: Pattern::Identifier { name: b },
                value: None,
            },
        ]);
        let (_module, listener) = resolve(module);
        assert!(listener.had_error());
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let module = Module::new(vec![Stmt::BreakStmt { span: span() }]);
        let (_module, listener) = resolve(module);
        assert!(listener.had_error());
    }

    #[test]
    fn undefined_name_is_an_error() {
        let module = Module::new(vec![Stmt::ExprStmt {
            span: span(),
            expr: Expr::VarExpr { name: Identifier::new(span(), "nope") },
        }]);
        let (_module, listener) = resolve(module);
        assert!(listener.had_error());
    }

    #[test]
    fn closure_capture_produces_upvalue() {
        // func outer() { var n = 1; func inner() { print n; } }
        let inner = Stmt::FuncDecl {
            span: span(),
            export: false,
            name: Identifier::new(span(), "inner"),
            args: vec![],
            body: Box::new(Stmt::BlockStmt {
                span: span(),
                stmts: vec![Stmt::PrintStmt {
                    span: span(),
                    expr: Expr::VarExpr { name: Identifier::new(span(), "n") },
                }],
                locals: vec![],
            }),
            upvalues: vec![],
        };
        let outer = Stmt::FuncDecl {
            span: span(),
            export: false,
            name: Identifier::new(span(), "outer"),
            args: vec![],
            body: Box::new(Stmt::BlockStmt {
                span: span(),
                stmts: vec![
                    Stmt::VarDecl {
                        span: span(),
                        export: false,
                        pattern: Pattern::Identifier { name: Identifier::new(span(), "n") },
                        value: Some(Expr::IntegerLiteral { span: span(), value: 1 }),
                    },
                    inner,
                ],
                locals: vec![],
            }),
            upvalues: vec![],
        };
        let module = Module::new(vec![outer]);
        let (module, listener) = resolve(module);
        assert!(!listener.had_error());
        let outer_body = match &module.statements[0] {
            Stmt::FuncDecl { body, .. } => body,
            _ => panic!("expected FuncDecl"),
        };
        let inner_upvalues = match outer_body.as_ref() {
            Stmt::BlockStmt { stmts, .. } => match &stmts[1] {
                Stmt::FuncDecl { upvalues, .. } => upvalues,
                _ => panic!("expected nested FuncDecl"),
            },
            _ => panic!("expected BlockStmt"),
        };
        assert_eq!(inner_upvalues.len(), 1);
        assert!(inner_upvalues[0].is_local);
    }
}
