//! Surface parser for the `loop` language (§4.0 — connective tissue, not
//! part of the core's contract). A chumsky recursive-descent-via-combinators
//! parser producing the `Module`/`Stmt`/`Expr`/`Pattern` shapes directly,
//! leaving every resolver-filled field (`ref_type`, `ref_index`, `upvalues`,
//! `iter_index`, `counter_index`, block/loop `locals`) at its default.

mod errors;

use crate::ast::{
    BinaryOpType, DictionaryPair, Expr, Identifier, Method, Module, Pattern, Stmt, UnaryOpType,
};
use crate::diagnostics::Diagnostic;
use crate::span::SourceSpan;
use chumsky::prelude::*;

const KEYWORDS: &[&str] = &[
    "var", "let", "func", "return", "true", "false", "null", "if", "else", "while", "for", "in",
    "break", "continue", "print", "class", "init", "try", "catch", "throw", "import", "as",
    "from", "export", "this", "super",
];

fn line_comment<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> + Clone {
    just("//").then(none_of("\n").repeated()).ignored()
}

fn block_comment<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> + Clone {
    just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored()
}

fn ws<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> + Clone {
    choice((block_comment(), line_comment(), one_of(" \t\r\n").ignored()))
        .repeated()
        .ignored()
}

/// Builds the full module parser. Kept as one function, like the teacher's
/// `parser()`, so the mutually-recursive expression/statement grammars can
/// share `Recursive::declare()` placeholders.
fn module_parser<'a>() -> impl Parser<'a, &'a str, Module, extra::Err<Rich<'a, char>>> {
    let ws = ws();

    let ident = text::ident()
        .try_map(move |s: &'a str, span| {
            if KEYWORDS.contains(&s) {
                Err(Rich::custom(span, format!("'{s}' is a keyword and cannot be used as an identifier")))
            } else {
                Ok(s)
            }
        })
        .padded_by(ws.clone());

    let identifier = ident.clone().map_with(|s: &str, e| Identifier::new(SourceSpan::from_chumsky(e.span()), s));

    let integer = text::int(10)
        .to_slice()
        .map_with(|s: &str, e| Expr::IntegerLiteral {
            span: SourceSpan::from_chumsky(e.span()),
            value: s.parse::<i64>().unwrap_or(0),
        })
        .padded_by(ws.clone());

    let escaped_char = just('\\').ignore_then(choice((
        just('n').to('\n'),
        just('t').to('\t'),
        just('r').to('\r'),
        just('"').to('"'),
        just('\\').to('\\'),
    )));
    let string_literal = none_of("\"\\")
        .or(escaped_char)
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .map_with(|value: String, e| Expr::StringLiteral { span: SourceSpan::from_chumsky(e.span()), value })
        .padded_by(ws.clone());

    let raw_string = none_of("\"\\")
        .or(escaped_char)
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .padded_by(ws.clone());

    let boolean = choice((
        just("true").map_with(|_, e| Expr::BoolLiteral { span: SourceSpan::from_chumsky(e.span()), value: true }),
        just("false").map_with(|_, e| Expr::BoolLiteral { span: SourceSpan::from_chumsky(e.span()), value: false }),
    ))
    .padded_by(ws.clone());

    let null = just("null")
        .map_with(|_, e| Expr::NullLiteral { span: SourceSpan::from_chumsky(e.span()) })
        .padded_by(ws.clone());

    let this_expr = just("this")
        .map_with(|_, e| Expr::VarExpr { name: Identifier::new(SourceSpan::from_chumsky(e.span()), "this") })
        .padded_by(ws.clone());
    let super_expr = just("super")
        .map_with(|_, e| Expr::VarExpr { name: Identifier::new(SourceSpan::from_chumsky(e.span()), "super") })
        .padded_by(ws.clone());

    let mut expr = Recursive::declare();
    let mut stmt = Recursive::declare();

    // ---- pattern (destructuring target for var/let/for-in) -------------
    let mut pattern = Recursive::declare();
    pattern.define({
        let single = identifier.clone().map(|name| Pattern::Identifier { name });
        let list = pattern
            .clone()
            .separated_by(just(',').padded_by(ws.clone()))
            .allow_trailing()
            .collect::<Vec<Pattern>>()
            .delimited_by(just('[').padded_by(ws.clone()), just(']').padded_by(ws.clone()))
            .map_with(|patterns, e| Pattern::List { span: SourceSpan::from_chumsky(e.span()), patterns });
        choice((list, single))
    });

    // ---- list / dict literals --------------------------------------------
    let list_lit = expr
        .clone()
        .separated_by(just(',').padded_by(ws.clone()))
        .allow_trailing()
        .collect::<Vec<Expr>>()
        .delimited_by(just('[').padded_by(ws.clone()), just(']').padded_by(ws.clone()))
        .map_with(|elements, e| Expr::ListLiteral { span: SourceSpan::from_chumsky(e.span()), elements });

    let dict_key = choice((
        expr.clone().delimited_by(just('[').padded_by(ws.clone()), just(']').padded_by(ws.clone())),
        raw_string.clone().map_with(|value: String, e| Expr::StringLiteral { span: SourceSpan::from_chumsky(e.span()), value }),
        ident.clone().map_with(|s: &str, e| Expr::StringLiteral { span: SourceSpan::from_chumsky(e.span()), value: s.to_string() }),
    ));
    let dict_entry = dict_key
        .then_ignore(just(':').padded_by(ws.clone()))
        .then(expr.clone())
        .map_with(|(key, value), e| DictionaryPair { span: SourceSpan::from_chumsky(e.span()), key, value });
    let dict_lit = dict_entry
        .separated_by(just(',').padded_by(ws.clone()))
        .allow_trailing()
        .collect::<Vec<DictionaryPair>>()
        .delimited_by(just('{').padded_by(ws.clone()), just('}').padded_by(ws.clone()))
        .map_with(|entries, e| Expr::DictionaryLiteral { span: SourceSpan::from_chumsky(e.span()), entries });

    let var_expr = identifier.clone().map(|name| Expr::VarExpr { name });

    let paren_expr = expr
        .clone()
        .delimited_by(just('(').padded_by(ws.clone()), just(')').padded_by(ws.clone()));

    let primary = choice((
        integer,
        string_literal,
        boolean,
        null,
        this_expr,
        super_expr,
        list_lit,
        dict_lit,
        paren_expr,
        var_expr,
    ))
    .boxed();

    // ---- postfix: call / attribute / index chains -----------------------
    #[derive(Clone)]
    enum Postfix {
        Call(Vec<Expr>),
        Attr(Identifier),
        Index(Vec<Expr>),
    }

    let call_args = expr
        .clone()
        .separated_by(just(',').padded_by(ws.clone()))
        .allow_trailing()
        .collect::<Vec<Expr>>()
        .delimited_by(just('(').padded_by(ws.clone()), just(')').padded_by(ws.clone()));

    let index_args = expr
        .clone()
        .separated_by(just(',').padded_by(ws.clone()))
        .at_least(1)
        .collect::<Vec<Expr>>()
        .delimited_by(just('[').padded_by(ws.clone()), just(']').padded_by(ws.clone()));

    let postfix_op = choice((
        call_args.clone().map(Postfix::Call),
        just('.').padded_by(ws.clone()).ignore_then(identifier.clone()).map(Postfix::Attr),
        index_args.map(Postfix::Index),
    ));

    let postfix = primary
        .clone()
        .then(postfix_op.repeated().collect::<Vec<_>>())
        .map_with(|(mut e, ops), ext| {
            let end = ext.span().end;
            for op in ops {
                let start = e.span().start;
                let span = SourceSpan::new(start, end);
                e = match op {
                    Postfix::Call(args) => Expr::CallExpr { span, callee: Box::new(e), args },
                    Postfix::Attr(attr) => Expr::GetAttrExpr { span, object: Box::new(e), attr },
                    Postfix::Index(index) => Expr::GetItemExpr { span, object: Box::new(e), index },
                };
            }
            e
        })
        .boxed();

    let unary_op = choice((
        just('!').padded_by(ws.clone()).to(UnaryOpType::Not),
        just('-').padded_by(ws.clone()).to(UnaryOpType::Negate),
        just('+').padded_by(ws.clone()).to(UnaryOpType::Plus),
    ));
    let unary = unary_op
        .repeated()
        .collect::<Vec<_>>()
        .then(postfix.clone())
        .map_with(|(ops, mut operand), e| {
            for op in ops.into_iter().rev() {
                let start = e.span().start;
                let end = operand.span().end;
                operand = Expr::UnaryOp { span: SourceSpan::new(start, end), op, operand: Box::new(operand) };
            }
            operand
        })
        .boxed();

    macro_rules! left_assoc_binop {
        ($name:ident, $operand:expr, $op_parser:expr) => {
            let $name = $operand
                .clone()
                .then($op_parser.then($operand.clone()).repeated().collect::<Vec<_>>())
                .map(|(mut left, rest)| {
                    for (op, right) in rest {
                        let span = left.span().merge(&right.span());
                        left = Expr::BinaryOp { span, op, left: Box::new(left), right: Box::new(right) };
                    }
                    left
                })
                .boxed();
        };
    }

    let mul_op = choice((
        just('*').padded_by(ws.clone()).to(BinaryOpType::Multiply),
        just('/').padded_by(ws.clone()).to(BinaryOpType::Divide),
    ));
    left_assoc_binop!(mul_expr, unary, mul_op);

    let add_op = choice((
        just('+').padded_by(ws.clone()).to(BinaryOpType::Add),
        just('-').padded_by(ws.clone()).to(BinaryOpType::Subtract),
    ));
    left_assoc_binop!(add_expr, mul_expr, add_op);

    let cmp_op = choice((
        just("<=").padded_by(ws.clone()).to(BinaryOpType::LessEqual),
        just(">=").padded_by(ws.clone()).to(BinaryOpType::GreaterEqual),
        just('<').padded_by(ws.clone()).to(BinaryOpType::Less),
        just('>').padded_by(ws.clone()).to(BinaryOpType::Greater),
    ));
    left_assoc_binop!(cmp_expr, add_expr, cmp_op);

    let eq_op = choice((
        just("==").padded_by(ws.clone()).to(BinaryOpType::Equal),
        just("!=").padded_by(ws.clone()).to(BinaryOpType::NotEqual),
    ));
    left_assoc_binop!(eq_expr, cmp_expr, eq_op);

    let and_op = just("&&").padded_by(ws.clone()).to(BinaryOpType::LogicalAnd);
    left_assoc_binop!(and_expr, eq_expr, and_op);

    let or_op = just("||").padded_by(ws.clone()).to(BinaryOpType::LogicalOr);
    left_assoc_binop!(or_expr, and_expr, or_op);

    // Assignment binds loosest and is right-associative.
    let assignment = recursive(|assignment| {
        or_expr
            .clone()
            .then(just('=').padded_by(ws.clone()).ignore_then(assignment).or_not())
            .map(|(target, value)| match value {
                None => target,
                Some(value) => {
                    let span = target.span().merge(&value.span());
                    Expr::Assignment { span, target: Box::new(target), value: Box::new(value) }
                }
            })
    });

    expr.define(assignment);

    // ---- statements -------------------------------------------------------
    let semi = just(';').padded_by(ws.clone());
    let kw = |s: &'static str| just(s).padded_by(ws.clone());

    let block = stmt
        .clone()
        .repeated()
        .collect::<Vec<Stmt>>()
        .delimited_by(just('{').padded_by(ws.clone()), just('}').padded_by(ws.clone()))
        .map_with(|stmts, e| Stmt::BlockStmt { span: SourceSpan::from_chumsky(e.span()), stmts, locals: Vec::new() });

    let export_prefix = kw("export").or_not().map(|o| o.is_some());

    let var_decl = export_prefix
        .clone()
        .then_ignore(kw("var"))
        .then(pattern.clone())
        .then(just('=').padded_by(ws.clone()).ignore_then(expr.clone()).or_not())
        .then_ignore(semi.clone())
        .map_with(|((export, pattern), value), e| {
            Stmt::VarDecl { span: SourceSpan::from_chumsky(e.span()), export, pattern, value }
        });

    let let_decl = export_prefix
        .clone()
        .then_ignore(kw("let"))
        .then(pattern.clone())
        .then(just('=').padded_by(ws.clone()).ignore_then(expr.clone()).or_not())
        .then_ignore(semi.clone())
        .map_with(|((export, pattern), value), e| {
            Stmt::LetDecl { span: SourceSpan::from_chumsky(e.span()), export, pattern, value }
        });

    let print_stmt = kw("print")
        .ignore_then(expr.clone())
        .then_ignore(semi.clone())
        .map_with(|expr, e| Stmt::PrintStmt { span: SourceSpan::from_chumsky(e.span()), expr });

    let throw_stmt = kw("throw")
        .ignore_then(expr.clone())
        .then_ignore(semi.clone())
        .map_with(|expr, e| Stmt::ThrowStmt { span: SourceSpan::from_chumsky(e.span()), expr });

    let return_stmt = kw("return")
        .ignore_then(expr.clone().or_not())
        .then_ignore(semi.clone())
        .map_with(|value, e| Stmt::ReturnStmt { span: SourceSpan::from_chumsky(e.span()), value });

    let break_stmt = kw("break").then_ignore(semi.clone()).map_with(|_, e| Stmt::BreakStmt { span: SourceSpan::from_chumsky(e.span()) });
    let continue_stmt = kw("continue").then_ignore(semi.clone()).map_with(|_, e| Stmt::ContinueStmt { span: SourceSpan::from_chumsky(e.span()) });

    let if_stmt = recursive(|if_stmt| {
        kw("if")
            .ignore_then(expr.clone())
            .then(block.clone())
            .then(
                kw("else")
                    .ignore_then(choice((if_stmt, block.clone())))
                    .or_not(),
            )
            .map_with(|((condition, then_arm), else_arm), e| Stmt::IfStmt {
                span: SourceSpan::from_chumsky(e.span()),
                condition,
                then_arm: Box::new(then_arm),
                else_arm: else_arm.map(Box::new),
            })
    });

    let while_stmt = kw("while")
        .ignore_then(expr.clone())
        .then(block.clone())
        .map_with(|(condition, block), e| Stmt::WhileStmt { span: SourceSpan::from_chumsky(e.span()), condition, block: Box::new(block) });

    let for_stmt = kw("for")
        .ignore_then(pattern.clone())
        .then_ignore(kw("in"))
        .then(expr.clone())
        .then(block.clone())
        .map_with(|((pattern, expr), body), e| Stmt::ForInStmt {
            span: SourceSpan::from_chumsky(e.span()),
            pattern,
            expr,
            body: Box::new(body),
            iter_index: None,
            counter_index: None,
            locals: Vec::new(),
        });

    let params = identifier
        .clone()
        .separated_by(just(',').padded_by(ws.clone()))
        .allow_trailing()
        .collect::<Vec<Identifier>>()
        .delimited_by(just('(').padded_by(ws.clone()), just(')').padded_by(ws.clone()));

    let func_decl = export_prefix
        .clone()
        .then_ignore(kw("func"))
        .then(identifier.clone())
        .then(params.clone())
        .then(block.clone())
        .map_with(|(((export, name), args), body), e| Stmt::FuncDecl {
            span: SourceSpan::from_chumsky(e.span()),
            export,
            name,
            args,
            body: Box::new(body),
            upvalues: Vec::new(),
        });

    let method = identifier
        .clone()
        .then(params.clone())
        .then(block.clone())
        .map_with(|((name, args), body), e| Method {
            span: SourceSpan::from_chumsky(e.span()),
            name,
            args,
            body: Box::new(body),
            upvalues: Vec::new(),
        });

    let class_decl = export_prefix
        .then_ignore(kw("class"))
        .then(identifier.clone())
        .then(just('<').padded_by(ws.clone()).ignore_then(identifier.clone()).or_not())
        .then(
            method
                .repeated()
                .collect::<Vec<Method>>()
                .delimited_by(just('{').padded_by(ws.clone()), just('}').padded_by(ws.clone())),
        )
        .map_with(|(((export, name), parent), methods), e| Stmt::ClassDecl {
            span: SourceSpan::from_chumsky(e.span()),
            export,
            name,
            parent,
            methods,
        });

    let try_stmt = kw("try")
        .ignore_then(block.clone())
        .then_ignore(kw("catch"))
        .then(identifier.clone())
        .then(block.clone())
        .map_with(|((try_block, catch_name), catch_block), e| Stmt::TryStmt {
            span: SourceSpan::from_chumsky(e.span()),
            try_block: Box::new(try_block),
            catch_name,
            catch_block: Box::new(catch_block),
        });

    let import_as_stmt = kw("import")
        .ignore_then(raw_string.clone())
        .then_ignore(kw("as"))
        .then(identifier.clone())
        .then_ignore(semi.clone())
        .map_with(|(path, name), e| Stmt::ImportAsStmt { span: SourceSpan::from_chumsky(e.span()), path, name });

    let import_from_stmt = kw("from")
        .ignore_then(raw_string.clone())
        .then_ignore(kw("import"))
        .then(
            identifier
                .clone()
                .separated_by(just(',').padded_by(ws.clone()))
                .at_least(1)
                .collect::<Vec<Identifier>>(),
        )
        .then_ignore(semi.clone())
        .map_with(|(path, names), e| Stmt::ImportFromStmt { span: SourceSpan::from_chumsky(e.span()), names, path });

    let expr_stmt = expr
        .clone()
        .then_ignore(semi.clone())
        .map_with(|expr, e| Stmt::ExprStmt { span: SourceSpan::from_chumsky(e.span()), expr });

    stmt.define(
        choice((
            var_decl,
            let_decl,
            print_stmt,
            throw_stmt,
            return_stmt,
            break_stmt,
            continue_stmt,
            if_stmt,
            while_stmt,
            for_stmt,
            try_stmt,
            func_decl,
            class_decl,
            import_as_stmt,
            import_from_stmt,
            block.clone(),
            expr_stmt,
        ))
        .boxed(),
    );

    ws.clone().ignore_then(
        stmt.repeated()
            .collect::<Vec<Stmt>>()
            .then_ignore(ws.clone())
            .then_ignore(end())
            .map(Module::new),
    )
}

pub fn parse(source: &str, filename: &str) -> Result<Module, Vec<Diagnostic>> {
    let (output, errs) = module_parser().parse(source).into_output_errors();
    if errs.is_empty() {
        Ok(output.expect("parser produces output when no errors are reported"))
    } else {
        Err(errors::errors_to_diagnostics(errs, filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Module {
        parse(source, "t.loop").unwrap_or_else(|errs| panic!("parse failed: {errs:?}"))
    }

    #[test]
    fn top_level_var_and_print() {
        let module = parse_ok("var x = 1 + 2;\nprint x;");
        assert_eq!(module.statements.len(), 2);
        assert!(matches!(module.statements[0], Stmt::VarDecl { .. }));
        assert!(matches!(module.statements[1], Stmt::PrintStmt { .. }));
    }

    #[test]
    fn short_circuit_or_parses_as_binary_op() {
        let module = parse_ok("print true || false;");
        match &module.statements[0] {
            Stmt::PrintStmt { expr: Expr::BinaryOp { op: BinaryOpType::LogicalOr, .. }, .. } => {}
            other => panic!("expected top-level || binary op, got {other:?}"),
        }
    }

    #[test]
    fn nested_function_declaration_parses() {
        let module = parse_ok(
            "func make() { let n = 0; func inner() { n = n + 1; return n; } return inner; }",
        );
        assert!(matches!(module.statements[0], Stmt::FuncDecl { .. }));
    }

    #[test]
    fn redefinition_source_still_parses_two_decls() {
        let module = parse_ok("var a = 1; var a = 2;");
        assert_eq!(module.statements.len(), 2);
    }

    #[test]
    fn import_from_desugars_at_resolve_time_not_parse_time() {
        let module = parse_ok(r#"from "m" import x, y;"#);
        match &module.statements[0] {
            Stmt::ImportFromStmt { names, path } => {
                assert_eq!(path, "m");
                assert_eq!(names.len(), 2);
            }
            other => panic!("expected ImportFromStmt, got {other:?}"),
        }
    }

    #[test]
    fn for_in_with_list_pattern_parses() {
        let module = parse_ok("for [a, b] in pairs { print a; }");
        match &module.statements[0] {
            Stmt::ForInStmt { pattern: Pattern::List { patterns, .. }, .. } => {
                assert_eq!(patterns.len(), 2);
            }
            other => panic!("expected ForInStmt with list pattern, got {other:?}"),
        }
    }

    #[test]
    fn class_with_parent_and_init_method() {
        let module = parse_ok("class Dog < Animal { init(name) { this.name = name; } bark() { print this.name; } }");
        match &module.statements[0] {
            Stmt::ClassDecl { parent, methods, .. } => {
                assert!(parent.is_some());
                assert_eq!(methods.len(), 2);
                assert_eq!(methods[0].name.name, "init");
            }
            other => panic!("expected ClassDecl, got {other:?}"),
        }
    }

    #[test]
    fn try_catch_parses() {
        let module = parse_ok(r#"try { throw "boom"; } catch e { print e; }"#);
        assert!(matches!(module.statements[0], Stmt::TryStmt { .. }));
    }

    #[test]
    fn assignment_is_right_associative_expression() {
        let module = parse_ok("x = y = 1;");
        match &module.statements[0] {
            Stmt::ExprStmt { expr: Expr::Assignment { value, .. }, .. } => {
                assert!(matches!(**value, Expr::Assignment { .. }));
            }
            other => panic!("expected nested assignment, got {other:?}"),
        }
    }

    #[test]
    fn keyword_cannot_be_used_as_identifier() {
        assert!(parse("let if = 5;", "t.loop").is_err());
    }

    #[test]
    fn unterminated_statement_is_a_parse_error() {
        assert!(parse("var x = ", "t.loop").is_err());
    }
}
