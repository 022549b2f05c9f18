//! End-to-end tests for the six concrete compile scenarios: parse a literal
//! `loop` source string, run it through the whole pipeline, and assert on
//! the resulting `Chunk`'s opcodes/constants or the lowered AST shape.

use loopc_core::ast::{Expr, Pattern, Stmt};
use loopc_core::bytecode::{Chunk, FunctionValue, Opcode, Value};
use loopc_core::diagnostics::{CollectingListener, Diagnostic, ErrorListener};
use loopc_core::pipeline::Pipeline;
use loopc_core::span::SourceSpan;

fn compile_chunk(source: &str) -> (Chunk, usize, bool, Vec<Diagnostic>) {
    let pipeline = Pipeline::new(source.to_string(), "t.loop".to_string());
    let module = pipeline.parse().expect("source should parse");
    let module = pipeline.lower_before(module);

    let mut listener = CollectingListener::new("t.loop");
    let mut import_compiler = |_: &str, _: SourceSpan| true;
    let module = pipeline.resolve(module, &mut listener, &mut import_compiler);
    let globals_count = module.globals_count;

    let module = pipeline.lower_after(module);
    let mut emit_listener = CollectingListener::new("t.loop");
    let chunk = pipeline.emit(&module, &mut emit_listener);

    let had_error = listener.had_error() || emit_listener.had_error();
    let mut diagnostics = listener.diagnostics;
    diagnostics.extend(emit_listener.diagnostics);
    (chunk, globals_count, had_error, diagnostics)
}

fn find_function<'a>(constants: &'a [Value], name: &str) -> &'a FunctionValue {
    constants
        .iter()
        .find_map(|c| match c {
            Value::Function(f) if f.name == name => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no Function constant named '{name}'"))
}

#[test]
fn s1_top_level_globals_and_print() {
    let (chunk, globals_count, had_error, _) = compile_chunk("var x = 1 + 2;\nprint x;");
    assert!(!had_error);
    assert_eq!(globals_count, 1);

    assert_eq!(chunk.code[0], Opcode::PushConstant as u8);
    assert!(chunk.constants.contains(&Value::Integer(1)));
    assert!(chunk.constants.contains(&Value::Integer(2)));
    assert!(chunk.code.windows(2).any(|w| w == [Opcode::Add as u8, Opcode::SetGlobal as u8]));
    assert!(chunk.code.windows(2).any(|w| w == [Opcode::SetGlobal as u8, 0]));
    assert!(chunk.code.windows(2).any(|w| w == [Opcode::Pop as u8, Opcode::GetGlobal as u8]));
    assert!(chunk.code.windows(2).any(|w| w == [Opcode::GetGlobal as u8, 0]));
    assert!(chunk.code.windows(2).any(|w| w == [Opcode::Print as u8, Opcode::ModuleEnd as u8]));
    assert_eq!(*chunk.code.last().unwrap(), Opcode::ModuleEnd as u8);
}

#[test]
fn s2_short_circuit_or() {
    let (chunk, _, had_error, _) = compile_chunk("print true || false;");
    assert!(!had_error);

    let push_true = chunk.code.iter().position(|&b| b == Opcode::PushTrue as u8).unwrap();
    assert_eq!(chunk.code[push_true + 1], Opcode::JumpIfTrue as u8);
    // JumpIfTrue takes a two-byte operand; the jump-over body is Pop then
    // PushFalse, patched to land right where Print begins.
    assert_eq!(chunk.code[push_true + 4], Opcode::Pop as u8);
    assert_eq!(chunk.code[push_true + 5], Opcode::PushFalse as u8);
    let disp = u16::from_le_bytes([chunk.code[push_true + 2], chunk.code[push_true + 3]]) as usize;
    // Displacement is measured from just after the 2-byte operand.
    assert_eq!(push_true + 4 + disp, chunk.code.iter().position(|&b| b == Opcode::Print as u8).unwrap());
    assert_eq!(*chunk.code.last().unwrap(), Opcode::ModuleEnd as u8);
}

#[test]
fn s3_closure_capture() {
    let source = "func make() { let n = 0; func inner() { n = n + 1; return n; } return inner; }";
    let (chunk, _, had_error, _) = compile_chunk(source);
    assert!(!had_error);

    let make = find_function(&chunk.constants, "make");
    let inner = find_function(&make.chunk.constants, "inner");

    let build_closure = make
        .chunk
        .code
        .iter()
        .position(|&b| b == Opcode::BuildClosure as u8)
        .expect("make's chunk should build inner's closure");
    assert_eq!(make.chunk.code[build_closure - 2], Opcode::PushConstant as u8);
    assert_eq!(make.chunk.code[build_closure + 1], 1, "inner captures exactly one upvalue");
    assert_eq!(make.chunk.code[build_closure + 2], 1, "n is captured as a direct parent local");

    assert!(inner.chunk.code.windows(2).any(|w| w == [Opcode::GetUpvalue as u8, 0]));
    assert!(inner.chunk.code.windows(2).any(|w| w == [Opcode::SetUpvalue as u8, 0]));

    assert!(
        make.chunk.code.contains(&(Opcode::CloseUpvalue as u8)),
        "make's block must close n's slot, not pop it, since inner captured it"
    );
}

#[test]
fn s4_redefinition_diagnostic() {
    let source = "var a = 1; var a = 2;";
    let pipeline = Pipeline::new(source.to_string(), "t.loop".to_string());
    let module = pipeline.parse().unwrap();
    let module = pipeline.lower_before(module);

    let mut listener = CollectingListener::new("t.loop");
    let mut import_compiler = |_: &str, _: SourceSpan| true;
    let _ = pipeline.resolve(module, &mut listener, &mut import_compiler);

    assert!(listener.had_error());
    assert_eq!(listener.diagnostics.len(), 1);
    let diag = &listener.diagnostics[0];
    assert!(diag.message.contains("redefinition"));
    assert_eq!(diag.notes.len(), 1);
    assert!(diag.notes[0].contains("previous definition"));
}

#[test]
fn s5_import_from_desugaring() {
    let pipeline = Pipeline::new(r#"from "m" import x, y;"#.to_string(), "t.loop".to_string());
    let module = pipeline.parse().unwrap();
    let module = pipeline.lower_before(module);

    assert_eq!(module.statements.len(), 3);
    assert!(matches!(module.statements[0], Stmt::ImportAsStmt { .. }));
    assert!(matches!(module.statements[1], Stmt::LetDecl { .. }));
    assert!(matches!(module.statements[2], Stmt::LetDecl { .. }));
    if let Stmt::ImportAsStmt { path, .. } = &module.statements[0] {
        assert_eq!(path, "m");
    }

    let (chunk, _, had_error, _) = compile_chunk(r#"from "m" import x, y;"#);
    assert!(!had_error);
    let import_count = chunk.code.iter().filter(|&&b| b == Opcode::Import as u8).count();
    assert_eq!(import_count, 1);
}

#[test]
fn s6_for_in_with_destructuring() {
    let pipeline = Pipeline::new("for [a, b] in pairs { print a; }".to_string(), "t.loop".to_string());
    let module = pipeline.parse().unwrap();
    let module = pipeline.lower_before(module);

    assert_eq!(module.statements.len(), 1);
    match &module.statements[0] {
        Stmt::ForInStmt { pattern, body, .. } => {
            assert!(matches!(pattern, Pattern::Identifier { .. }));
            match body.as_ref() {
                Stmt::BlockStmt { stmts, .. } => {
                    assert!(stmts.len() >= 3, "two extraction LetDecls plus the original print");
                    assert!(matches!(stmts[0], Stmt::LetDecl { .. }));
                    assert!(matches!(stmts[1], Stmt::LetDecl { .. }));
                    match &stmts[0] {
                        Stmt::LetDecl { value: Some(Expr::GetItemExpr { index, .. }), .. } => {
                            assert!(matches!(index[0], Expr::IntegerLiteral { value: 0, .. }));
                        }
                        other => panic!("expected GetItemExpr LetDecl, got {other:?}"),
                    }
                    match &stmts[1] {
                        Stmt::LetDecl { value: Some(Expr::GetItemExpr { index, .. }), .. } => {
                            assert!(matches!(index[0], Expr::IntegerLiteral { value: 1, .. }));
                        }
                        other => panic!("expected GetItemExpr LetDecl, got {other:?}"),
                    }
                }
                other => panic!("expected block body, got {other:?}"),
            }
        }
        other => panic!("expected for-in, got {other:?}"),
    }
}
