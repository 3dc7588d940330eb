// Parser for .src source files.
//
// Parses a token stream (from the lexer) into an AST. Uses chumsky
// combinators; expressions are built with `recursive` and left folds for the
// three precedence levels (`*`, then `+`/`-`, then `==`/`<`).
//
// Preconditions: input is a loaded `SourceFile`.
// Postconditions: returns an AST plus any errors as located diagnostics.
// Failure modes: syntax errors produce `E0001` diagnostics; no AST is returned
//   when the token stream cannot be parsed.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::diag::{codes, Diagnostic};
use crate::lexer::Token;
use crate::source::SourceFile;

/// Result of parsing: AST plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub ast: Option<SourceAst>,
    pub errors: Vec<Diagnostic>,
}

/// Parse a source file. Lexes then parses.
///
/// Lex errors and parse errors are both reported as `E0001` diagnostics
/// located in `file`.
pub fn parse(file: &SourceFile) -> ParseResult {
    let source = file.text.as_str();
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = file_parser(source);
    let (decls, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut errors: Vec<Diagnostic> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            Diagnostic::error((e.span.start..e.span.end).into(), e.message)
                .with_code(codes::E0001)
                .located_in(file)
        })
        .collect();
    errors.extend(parse_errors.into_iter().map(|e| {
        Diagnostic::error(*e.span(), e.to_string())
            .with_code(codes::E0001)
            .located_in(file)
    }));

    // A lex error drops tokens, so any AST built from the remainder would be
    // misleading.
    let ast = if errors.is_empty() {
        decls.map(|decls| SourceAst {
            file: file.id,
            decls,
        })
    } else {
        None
    };

    ParseResult { ast, errors }
}

fn fold_binary(lhs: Expr, (op, rhs): (BinOp, Expr)) -> Expr {
    let span: SimpleSpan = (lhs.span.start..rhs.span.end).into();
    Expr {
        kind: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    }
}

// ── Main parser builder ──
//
// All grammar rules are built inside `file_parser` so that the `source`
// reference is captured once and shared by all combinators.

fn file_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Vec<Decl>, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    // ── Identifier ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start..span.end].to_string(),
            span,
        }
    });

    let type_ref = ident.clone().map(|id| TypeRef {
        name: id.name,
        span: id.span,
    });

    // ── Expressions ──

    let expr = recursive(|expr| {
        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let literal = select! {
            Token::Int(n) => ExprKind::Int(n),
            Token::True => ExprKind::Bool(true),
            Token::False => ExprKind::Bool(false),
        }
        .map_with(|kind, e| Expr {
            kind,
            span: e.span(),
        });

        // `name(args)` is a call, a bare `name` is a reference.
        let name_or_call = ident
            .clone()
            .then(args.or_not())
            .map_with(|(name, args), e| {
                let kind = match args {
                    Some(args) => ExprKind::Call { callee: name, args },
                    None => ExprKind::Name(name),
                };
                Expr {
                    kind,
                    span: e.span(),
                }
            });

        let atom = literal
            .or(name_or_call)
            .or(expr.delimited_by(just(Token::LParen), just(Token::RParen)));

        let product = atom
            .clone()
            .foldl(just(Token::Star).to(BinOp::Mul).then(atom).repeated(), fold_binary);

        let sum_op = just(Token::Plus)
            .to(BinOp::Add)
            .or(just(Token::Minus).to(BinOp::Sub));
        let sum = product
            .clone()
            .foldl(sum_op.then(product).repeated(), fold_binary);

        let cmp_op = just(Token::EqEq)
            .to(BinOp::Eq)
            .or(just(Token::Lt).to(BinOp::Lt));
        sum.clone().foldl(cmp_op.then(sum).repeated(), fold_binary)
    });

    // ── Statements ──

    let let_stmt = just(Token::Let)
        .ignore_then(ident.clone())
        .then_ignore(just(Token::Equals))
        .then(expr.clone())
        .map(|(name, value)| StmtKind::Let { name, value });

    let print_stmt = just(Token::Print)
        .ignore_then(expr.clone())
        .map(StmtKind::Print);

    let return_stmt = just(Token::Return)
        .ignore_then(expr.clone().or_not())
        .map(StmtKind::Return);

    let expr_stmt = expr.clone().map(StmtKind::Expr);

    let stmt = choice((let_stmt, print_stmt, return_stmt, expr_stmt))
        .then_ignore(just(Token::Semi))
        .map_with(|kind, e| Stmt {
            kind,
            span: e.span(),
        });

    // ── Declarations ──

    let param = ident
        .clone()
        .then_ignore(just(Token::Colon))
        .then(type_ref.clone())
        .map(|(name, ty)| Param { name, ty });

    let params = param
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let body = stmt
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LBrace), just(Token::RBrace))
        .map_with(|stmts, e| (stmts, e.span()));

    let fun_decl = just(Token::Fun)
        .ignore_then(ident.clone())
        .then(params)
        .then(just(Token::Colon).ignore_then(type_ref.clone()).or_not())
        .then(body)
        .map(|(((name, params), ret), (body, body_span))| {
            DeclKind::Fun(FunDecl {
                name,
                params,
                ret,
                body,
                body_span,
            })
        });

    let val_decl = just(Token::Val)
        .ignore_then(ident)
        .then_ignore(just(Token::Colon))
        .then(type_ref)
        .then_ignore(just(Token::Equals))
        .then(expr)
        .then_ignore(just(Token::Semi))
        .map(|((name, ty), init)| DeclKind::Val(ValDecl { name, ty, init }));

    let decl = just(Token::Pub)
        .or_not()
        .then(fun_decl.or(val_decl))
        .map_with(|(visibility, kind), e| Decl {
            kind,
            public: visibility.is_some(),
            span: e.span(),
        });

    decl.repeated().collect::<Vec<_>>()
}

// ── Tests ──
