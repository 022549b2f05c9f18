//! One lexical environment per function (including the implicit top-level
//! script environment), per §4.3.

use crate::ast::UpvalueDescriptor;
use crate::span::SourceSpan;

#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub span: SourceSpan,
    pub scope: usize,
    pub is_captured: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone)]
pub struct GlobalEntry {
    pub name: String,
    pub span: SourceSpan,
    pub is_final: bool,
}

pub struct Env {
    pub label: String,
    pub scope: usize,
    pub defs: Vec<Local>,
    pub upvalues: Vec<UpvalueDescriptor>,
    /// `Some` only on the implicit top-level (script) environment.
    pub globals: Option<Vec<GlobalEntry>>,
    pub exports: Option<Vec<GlobalEntry>>,
    /// Whether this is a method env whose class has a superclass. Checked by
    /// `Resolver::resolve_super` directly; `super` never occupies a local
    /// slot of its own.
    pub has_parent: bool,
}

impl Env {
    pub fn new_top() -> Self {
        Env {
            label: "<script>".to_string(),
            scope: 0,
            defs: Vec::new(),
            upvalues: Vec::new(),
            globals: Some(Vec::new()),
            exports: Some(Vec::new()),
            has_parent: false,
        }
    }

    /// A non-script function environment. Slot 0 is always the implicit
    /// `this` receiver, including for plain functions (§9), and argument
    /// slots start at index 1 uniformly — `has_parent` only records whether
    /// `super` is in scope here, it never reserves a slot for it.
    pub fn new_function(label: String, has_parent: bool) -> Self {
        let defs = vec![Local {
            name: "this".to_string(),
            span: SourceSpan::new(0, 0),
            scope: 0,
            is_captured: false,
            is_final: true,
        }];
        Env {
            label,
            scope: 0,
            defs,
            upvalues: Vec::new(),
            globals: None,
            exports: None,
            has_parent,
        }
    }

    pub fn is_top(&self) -> bool {
        self.globals.is_some()
    }

    /// Innermost-to-outermost: a later shadowing definition wins.
    pub fn resolve_local(&self, name: &str) -> Option<usize> {
        self.defs.iter().rposition(|l| l.name == name)
    }

    /// Dedup by descriptor so repeated captures of the same name collapse
    /// to one slot (§4.3 "Upvalue creation").
    pub fn add_upvalue(&mut self, descriptor: UpvalueDescriptor) -> Option<usize> {
        if let Some(pos) = self.upvalues.iter().position(|u| *u == descriptor) {
            return Some(pos);
        }
        if self.upvalues.len() >= 256 {
            return None;
        }
        self.upvalues.push(descriptor);
        Some(self.upvalues.len() - 1)
    }

    /// Find a previous definition at the *current* scope depth — used for
    /// same-scope redefinition diagnostics. Definitions of the current
    /// scope are always a contiguous trailing run of `defs`.
    pub fn redefinition_in_scope(&self, name: &str) -> Option<&Local> {
        self.defs
            .iter()
            .rev()
            .take_while(|l| l.scope == self.scope)
            .find(|l| l.name == name)
    }
}
