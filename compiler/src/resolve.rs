// resolve.rs — Name resolution and type checking (reference analyzer)
//
// Resolves every parsed source file into one module namespace and checks
// types. Global initializers are constant-evaluated in declaration order.
//
// Preconditions: source files are loaded.
// Postconditions: if no error-level diagnostic was reported, a fully
//   resolved, type-correct `ResolvedModule` is returned.
// Failure modes: syntax, name, type, arity, missing-return and constant
//   initializer errors (E0001, E0100–E0106).
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::ast::{self, BinOp, DeclKind, ExprKind, Span, StmtKind};
use crate::config::Config;
use crate::diag::{codes, has_errors, Diagnostic};
use crate::id::{DefId, FileId, IdAllocator, LocalId};
use crate::source::SourceFile;
use crate::toolchain::{Analysis, Analyzer};

// ── Resolved program ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Int,
    Bool,
    Unit,
}

impl Type {
    fn from_name(name: &str) -> Option<Type> {
        match name {
            "Int" => Some(Type::Int),
            "Bool" => Some(Type::Bool),
            "Unit" => Some(Type::Unit),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Bool => write!(f, "Bool"),
            Type::Unit => write!(f, "Unit"),
        }
    }
}

/// Output of the frontend: every declaration resolved and typed.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    pub name: String,
    pub globals: Vec<ResolvedGlobal>,
    pub functions: Vec<ResolvedFunction>,
}

impl ResolvedModule {
    pub fn function(&self, def: DefId) -> Option<&ResolvedFunction> {
        self.functions.iter().find(|f| f.def == def)
    }

    pub fn global(&self, def: DefId) -> Option<&ResolvedGlobal> {
        self.globals.iter().find(|g| g.def == def)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedGlobal {
    pub def: DefId,
    pub name: String,
    pub public: bool,
    pub ty: Type,
    /// Constant-evaluated initializer; `Bool` is stored as 0 or 1.
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct ResolvedFunction {
    pub def: DefId,
    pub name: String,
    pub public: bool,
    pub params: Vec<(String, Type)>,
    pub ret: Type,
    pub body: Vec<ResolvedStmt>,
}

impl ResolvedFunction {
    /// Human-readable signature, e.g. `fun add(Int, Int): Int`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|(_, t)| t.to_string()).collect();
        format!("fun {}({}): {}", self.name, params.join(", "), self.ret)
    }
}

#[derive(Debug, Clone)]
pub enum ResolvedStmt {
    Let { local: LocalId, value: ResolvedExpr },
    Print(ResolvedExpr),
    Eval(ResolvedExpr),
    Return(Option<ResolvedExpr>),
}

#[derive(Debug, Clone)]
pub struct ResolvedExpr {
    pub kind: ResolvedExprKind,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub enum ResolvedExprKind {
    Int(i64),
    Bool(bool),
    Param(u32),
    Local(LocalId),
    Global(DefId),
    Call {
        callee: DefId,
        args: Vec<ResolvedExpr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<ResolvedExpr>,
        rhs: Box<ResolvedExpr>,
    },
}

// ── Analyzer ────────────────────────────────────────────────────────────────

/// Reference analyzer for the `.src` language.
#[derive(Debug, Default)]
pub struct SourceAnalyzer;

impl Analyzer for SourceAnalyzer {
    fn analyze(&self, sources: &[SourceFile], config: &Config) -> Analysis {
        analyze_sources(sources, &config.effective_module_name())
    }
}

/// Parse, resolve and type-check `sources` as one module named `module_name`.
pub fn analyze_sources(sources: &[SourceFile], module_name: &str) -> Analysis {
    let mut diagnostics = Vec::new();
    let mut asts = Vec::new();
    for file in sources {
        let result = crate::parser::parse(file);
        diagnostics.extend(result.errors);
        if let Some(ast) = result.ast {
            asts.push(ast);
        }
    }

    let files: HashMap<FileId, &SourceFile> = sources.iter().map(|f| (f.id, f)).collect();
    let mut resolver = Resolver {
        files,
        diagnostics,
        ids: IdAllocator::new(),
        decls: HashMap::new(),
    };
    let module = resolver.resolve(&asts, module_name);
    let diagnostics = resolver.diagnostics;
    let module = if has_errors(&diagnostics) {
        None
    } else {
        Some(module)
    };

    Analysis {
        module,
        diagnostics,
    }
}

// ── Resolver ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum DeclSig {
    Fun { params: Vec<Type>, ret: Type },
    Val { ty: Type },
}

#[derive(Debug, Clone)]
struct DeclEntry {
    def: DefId,
    sig: DeclSig,
    file: FileId,
    span: Span,
}

struct Resolver<'a> {
    files: HashMap<FileId, &'a SourceFile>,
    diagnostics: Vec<Diagnostic>,
    ids: IdAllocator,
    decls: HashMap<String, DeclEntry>,
}

impl<'a> Resolver<'a> {
    fn report(&mut self, file: FileId, diag: Diagnostic) {
        let diag = match self.files.get(&file) {
            Some(source) => diag.located_in(source),
            None => diag,
        };
        self.diagnostics.push(diag);
    }

    fn resolve_type(&mut self, file: FileId, ty: &ast::TypeRef) -> Type {
        match Type::from_name(&ty.name) {
            Some(t) => t,
            None => {
                self.report(
                    file,
                    Diagnostic::error(ty.span, format!("unknown type `{}`", ty.name))
                        .with_code(codes::E0106)
                        .with_hint("expected one of Int, Bool, Unit"),
                );
                Type::Int
            }
        }
    }

    fn resolve(&mut self, asts: &[ast::SourceAst], module_name: &str) -> ResolvedModule {
        // Pass 1: declare every top-level name with its signature.
        let mut declared: Vec<(FileId, &ast::Decl, DefId)> = Vec::new();
        for source in asts {
            for decl in &source.decls {
                let name = decl.name();
                if let Some(prev) = self.decls.get(&name.name) {
                    let prev_span = prev.span;
                    self.report(
                        source.file,
                        Diagnostic::error(name.span, format!("duplicate declaration `{}`", name.name))
                            .with_code(codes::E0100)
                            .with_related(prev_span, "first declared here"),
                    );
                    continue;
                }
                let sig = match &decl.kind {
                    DeclKind::Fun(fun) => {
                        let params = fun
                            .params
                            .iter()
                            .map(|p| self.resolve_type(source.file, &p.ty))
                            .collect();
                        let ret = match &fun.ret {
                            Some(t) => self.resolve_type(source.file, t),
                            None => Type::Unit,
                        };
                        DeclSig::Fun { params, ret }
                    }
                    DeclKind::Val(val) => DeclSig::Val {
                        ty: self.resolve_type(source.file, &val.ty),
                    },
                };
                let def = self.ids.alloc_def();
                self.decls.insert(
                    name.name.clone(),
                    DeclEntry {
                        def,
                        sig,
                        file: source.file,
                        span: name.span,
                    },
                );
                declared.push((source.file, decl, def));
            }
        }

        // Pass 2: evaluate globals in declaration order.
        let mut globals = Vec::new();
        let mut const_values: HashMap<DefId, (Type, i64)> = HashMap::new();
        for (file, decl, def) in &declared {
            if let DeclKind::Val(val) = &decl.kind {
                let Some(DeclSig::Val { ty }) = self.decls.get(&val.name.name).map(|d| d.sig.clone())
                else {
                    continue;
                };
                if let Some((actual, value)) = self.eval_const(*file, &val.init, &const_values) {
                    if actual != ty {
                        self.report(
                            *file,
                            Diagnostic::error(
                                val.init.span,
                                format!("type mismatch: expected {}, found {}", ty, actual),
                            )
                            .with_code(codes::E0102),
                        );
                        continue;
                    }
                    const_values.insert(*def, (ty, value));
                    globals.push(ResolvedGlobal {
                        def: *def,
                        name: val.name.name.clone(),
                        public: decl.public,
                        ty,
                        value,
                    });
                }
            }
        }

        // Pass 3: check function bodies.
        let mut functions = Vec::new();
        for (file, decl, def) in &declared {
            if let DeclKind::Fun(fun) = &decl.kind {
                if let Some(resolved) = self.check_function(*file, fun, *def, decl.public) {
                    functions.push(resolved);
                }
            }
        }

        ResolvedModule {
            name: module_name.to_string(),
            globals,
            functions,
        }
    }

    // ── Constant evaluation ──

    fn eval_const(
        &mut self,
        file: FileId,
        expr: &ast::Expr,
        known: &HashMap<DefId, (Type, i64)>,
    ) -> Option<(Type, i64)> {
        match &expr.kind {
            ExprKind::Int(n) => Some((Type::Int, *n)),
            ExprKind::Bool(b) => Some((Type::Bool, i64::from(*b))),
            ExprKind::Name(name) => {
                let Some(entry) = self.decls.get(&name.name).cloned() else {
                    self.report(
                        file,
                        Diagnostic::error(name.span, format!("unknown name `{}`", name.name))
                            .with_code(codes::E0101),
                    );
                    return None;
                };
                match known.get(&entry.def) {
                    Some(v) => Some(*v),
                    None => {
                        self.report(
                            file,
                            Diagnostic::error(
                                name.span,
                                format!("`{}` is not a constant defined earlier", name.name),
                            )
                            .with_code(codes::E0105)
                            .with_hint("global initializers may only use literals and earlier globals"),
                        );
                        None
                    }
                }
            }
            ExprKind::Call { .. } => {
                self.report(
                    file,
                    Diagnostic::error(expr.span, "global initializer must be a constant expression")
                        .with_code(codes::E0105),
                );
                None
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.eval_const(file, lhs, known);
                let r = self.eval_const(file, rhs, known);
                let ((lt, lv), (rt, rv)) = (l?, r?);
                let ty = self.binary_type(file, *op, lt, rt, expr.span)?;
                Some((ty, op.eval(lv, rv)))
            }
        }
    }

    fn binary_type(&mut self, file: FileId, op: BinOp, lhs: Type, rhs: Type, span: Span) -> Option<Type> {
        let result = match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul if lhs == Type::Int && rhs == Type::Int => {
                Some(Type::Int)
            }
            BinOp::Lt if lhs == Type::Int && rhs == Type::Int => Some(Type::Bool),
            BinOp::Eq if lhs == rhs && lhs != Type::Unit => Some(Type::Bool),
            _ => None,
        };
        if result.is_none() {
            self.report(
                file,
                Diagnostic::error(
                    span,
                    format!(
                        "type mismatch: operator `{}` cannot be applied to {} and {}",
                        op.symbol(),
                        lhs,
                        rhs
                    ),
                )
                .with_code(codes::E0102),
            );
        }
        result
    }

    // ── Function bodies ──

    fn check_function(
        &mut self,
        file: FileId,
        fun: &ast::FunDecl,
        def: DefId,
        public: bool,
    ) -> Option<ResolvedFunction> {
        let Some(DeclSig::Fun { params, ret }) = self.decls.get(&fun.name.name).map(|d| d.sig.clone())
        else {
            return None;
        };

        let mut scope = Scope::default();
        for (i, (param, ty)) in fun.params.iter().zip(&params).enumerate() {
            scope.bind_param(&param.name.name, i as u32, *ty);
        }

        let errors_before = self.error_count();
        let mut body = Vec::new();
        for stmt in &fun.body {
            if let Some(resolved) = self.check_stmt(file, stmt, ret, &mut scope) {
                body.push(resolved);
            }
        }

        if ret != Type::Unit && !matches!(fun.body.last(), Some(s) if matches!(s.kind, StmtKind::Return(_)))
        {
            self.report(
                file,
                Diagnostic::error(
                    fun.body_span,
                    format!("function `{}` must end with a return of {}", fun.name.name, ret),
                )
                .with_code(codes::E0104),
            );
        }

        for local in scope.unused_locals() {
            self.report(
                file,
                Diagnostic::warning(local.span, format!("unused local `{}`", local.name))
                    .with_code(codes::W0001)
                    .with_hint("remove the binding or use it"),
            );
        }

        if self.error_count() > errors_before {
            return None;
        }

        Some(ResolvedFunction {
            def,
            name: fun.name.name.clone(),
            public,
            params: fun
                .params
                .iter()
                .zip(params)
                .map(|(p, t)| (p.name.name.clone(), t))
                .collect(),
            ret,
            body,
        })
    }

    fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    fn check_stmt(
        &mut self,
        file: FileId,
        stmt: &ast::Stmt,
        ret: Type,
        scope: &mut Scope,
    ) -> Option<ResolvedStmt> {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                let value = self.check_expr(file, value, scope)?;
                if value.ty == Type::Unit {
                    self.report(
                        file,
                        Diagnostic::error(stmt.span, format!("cannot bind a Unit value to `{}`", name.name))
                            .with_code(codes::E0102),
                    );
                    return None;
                }
                let local = self.ids.alloc_local();
                scope.bind_local(name, local, value.ty);
                Some(ResolvedStmt::Let { local, value })
            }
            StmtKind::Print(expr) => {
                let value = self.check_expr(file, expr, scope)?;
                if value.ty == Type::Unit {
                    self.report(
                        file,
                        Diagnostic::error(expr.span, "type mismatch: cannot print a Unit value")
                            .with_code(codes::E0102),
                    );
                    return None;
                }
                Some(ResolvedStmt::Print(value))
            }
            StmtKind::Expr(expr) => Some(ResolvedStmt::Eval(self.check_expr(file, expr, scope)?)),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => Some(self.check_expr(file, expr, scope)?),
                    None => None,
                };
                let actual = value.as_ref().map_or(Type::Unit, |v| v.ty);
                if actual != ret {
                    self.report(
                        file,
                        Diagnostic::error(
                            stmt.span,
                            format!("type mismatch: expected return of {}, found {}", ret, actual),
                        )
                        .with_code(codes::E0102),
                    );
                    return None;
                }
                Some(ResolvedStmt::Return(value))
            }
        }
    }

    fn check_expr(&mut self, file: FileId, expr: &ast::Expr, scope: &mut Scope) -> Option<ResolvedExpr> {
        match &expr.kind {
            ExprKind::Int(n) => Some(ResolvedExpr {
                kind: ResolvedExprKind::Int(*n),
                ty: Type::Int,
            }),
            ExprKind::Bool(b) => Some(ResolvedExpr {
                kind: ResolvedExprKind::Bool(*b),
                ty: Type::Bool,
            }),
            ExprKind::Name(name) => {
                if let Some(binding) = scope.lookup(&name.name) {
                    return Some(binding);
                }
                match self.decls.get(&name.name).cloned() {
                    Some(DeclEntry {
                        def,
                        sig: DeclSig::Val { ty },
                        ..
                    }) => Some(ResolvedExpr {
                        kind: ResolvedExprKind::Global(def),
                        ty,
                    }),
                    Some(DeclEntry {
                        sig: DeclSig::Fun { .. },
                        ..
                    }) => {
                        self.report(
                            file,
                            Diagnostic::error(
                                name.span,
                                format!("function `{}` cannot be used as a value", name.name),
                            )
                            .with_code(codes::E0102)
                            .with_hint(format!("call it: `{}(...)`", name.name)),
                        );
                        None
                    }
                    None => {
                        self.report(
                            file,
                            Diagnostic::error(name.span, format!("unknown name `{}`", name.name))
                                .with_code(codes::E0101),
                        );
                        None
                    }
                }
            }
            ExprKind::Call { callee, args } => {
                let mut resolved_args = Vec::with_capacity(args.len());
                let mut ok = true;
                for arg in args {
                    match self.check_expr(file, arg, scope) {
                        Some(a) => resolved_args.push(a),
                        None => ok = false,
                    }
                }
                let entry = match self.decls.get(&callee.name).cloned() {
                    Some(entry) => entry,
                    None => {
                        self.report(
                            file,
                            Diagnostic::error(callee.span, format!("unknown function `{}`", callee.name))
                                .with_code(codes::E0101),
                        );
                        return None;
                    }
                };
                let DeclSig::Fun { params, ret } = &entry.sig else {
                    self.report(
                        file,
                        Diagnostic::error(callee.span, format!("`{}` is not a function", callee.name))
                            .with_code(codes::E0102),
                    );
                    return None;
                };
                if !ok {
                    return None;
                }
                if params.len() != resolved_args.len() {
                    self.report(
                        file,
                        Diagnostic::error(
                            expr.span,
                            format!(
                                "`{}` takes {} argument(s) but {} were supplied",
                                callee.name,
                                params.len(),
                                resolved_args.len()
                            ),
                        )
                        .with_code(codes::E0103)
                        .with_related(entry.span, "declared here"),
                    );
                    return None;
                }
                for (i, (arg, expected)) in resolved_args.iter().zip(params).enumerate() {
                    if arg.ty != *expected {
                        self.report(
                            file,
                            Diagnostic::error(
                                args[i].span,
                                format!("type mismatch: expected {}, found {}", expected, arg.ty),
                            )
                            .with_code(codes::E0102),
                        );
                        ok = false;
                    }
                }
                if !ok {
                    return None;
                }
                Some(ResolvedExpr {
                    kind: ResolvedExprKind::Call {
                        callee: entry.def,
                        args: resolved_args,
                    },
                    ty: *ret,
                })
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.check_expr(file, lhs, scope);
                let r = self.check_expr(file, rhs, scope);
                let (l, r) = (l?, r?);
                let ty = self.binary_type(file, *op, l.ty, r.ty, expr.span)?;
                Some(ResolvedExpr {
                    kind: ResolvedExprKind::Binary {
                        op: *op,
                        lhs: Box::new(l),
                        rhs: Box::new(r),
                    },
                    ty,
                })
            }
        }
    }
}

// ── Scope ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct LocalBinding {
    name: String,
    span: Span,
    local: LocalId,
    ty: Type,
    used: bool,
}

/// Function scope: parameters plus `let` bindings. A later `let` with the
/// same name shadows the earlier one.
#[derive(Debug, Default)]
struct Scope {
    params: HashMap<String, (u32, Type)>,
    locals: Vec<LocalBinding>,
}

impl Scope {
    fn bind_param(&mut self, name: &str, index: u32, ty: Type) {
        self.params.insert(name.to_string(), (index, ty));
    }

    fn bind_local(&mut self, name: &ast::Ident, local: LocalId, ty: Type) {
        self.locals.push(LocalBinding {
            name: name.name.clone(),
            span: name.span,
            local,
            ty,
            used: false,
        });
    }

    fn lookup(&mut self, name: &str) -> Option<ResolvedExpr> {
        if let Some(binding) = self.locals.iter_mut().rev().find(|b| b.name == name) {
            binding.used = true;
            return Some(ResolvedExpr {
                kind: ResolvedExprKind::Local(binding.local),
                ty: binding.ty,
            });
        }
        self.params.get(name).map(|&(index, ty)| ResolvedExpr {
            kind: ResolvedExprKind::Param(index),
            ty,
        })
    }

    fn unused_locals(&self) -> impl Iterator<Item = &LocalBinding> {
        self.locals.iter().filter(|b| !b.used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::DiagLevel;

    fn analyze(text: &str) -> Analysis {
        analyze_sources(&[SourceFile::new(FileId(0), "a.src", text)], "test")
    }

    fn error_codes(analysis: &Analysis) -> Vec<&'static str> {
        analysis
            .diagnostics
            .iter()
            .filter(|d| d.level == DiagLevel::Error)
            .filter_map(|d| d.code.map(|c| c.0))
            .collect()
    }

    #[test]
    fn valid_program_resolves() {
        let analysis = analyze(
            "pub val base: Int = 40;\n\
             val bonus: Int = base + 2;\n\
             pub fun add(a: Int, b: Int): Int { return a + b; }\n\
             fun main() { let x = add(base, bonus); print x; print x == 82; }\n",
        );
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let module = analysis.module.expect("module");
        assert_eq!(module.name, "test");
        assert_eq!(module.globals.len(), 2);
        assert_eq!(module.globals[1].value, 82);
        assert_eq!(module.functions.len(), 2);
        assert_eq!(module.functions[0].signature(), "fun add(Int, Int): Int");
        assert!(module.functions[0].public);
        assert!(!module.functions[1].public);
    }

    #[test]
    fn type_error_reports_e0102_and_no_module() {
        let analysis = analyze("fun main() { print 1 + true; }");
        assert!(analysis.module.is_none());
        assert_eq!(error_codes(&analysis), vec!["E0102"]);
        let rendered = analysis.diagnostics[0].to_string();
        assert!(rendered.starts_with("a.src:1:20: error[E0102]"), "{rendered}");
    }

    #[test]
    fn unknown_name_and_function() {
        let analysis = analyze("fun main() { print y; nope(); }");
        assert_eq!(error_codes(&analysis), vec!["E0101", "E0101"]);
    }

    #[test]
    fn duplicate_declaration_across_files() {
        let analysis = analyze_sources(
            &[
                SourceFile::new(FileId(0), "a.src", "fun f() { }"),
                SourceFile::new(FileId(1), "b.src", "val f: Int = 1;"),
            ],
            "dup",
        );
        assert_eq!(error_codes(&analysis), vec!["E0100"]);
        let diag = &analysis.diagnostics[0];
        assert_eq!(diag.location.as_ref().unwrap().path.to_str(), Some("b.src"));
        assert_eq!(diag.related_spans.len(), 1);
    }

    #[test]
    fn arity_mismatch() {
        let analysis = analyze("fun f(a: Int) { } fun main() { f(1, 2); }");
        assert_eq!(error_codes(&analysis), vec!["E0103"]);
    }

    #[test]
    fn missing_return() {
        let analysis = analyze("fun f(): Int { print 1; }");
        assert_eq!(error_codes(&analysis), vec!["E0104"]);
    }

    #[test]
    fn return_type_mismatch() {
        let analysis = analyze("fun f(): Bool { return 1; }");
        assert_eq!(error_codes(&analysis), vec!["E0102"]);
    }

    #[test]
    fn global_initializer_must_be_constant() {
        let analysis = analyze("fun f(): Int { return 1; } val x: Int = f();");
        assert_eq!(error_codes(&analysis), vec!["E0105"]);
        let later = analyze("val a: Int = b; val b: Int = 1;");
        assert_eq!(error_codes(&later), vec!["E0105"]);
    }

    #[test]
    fn unknown_type() {
        let analysis = analyze("val x: Float = 1;");
        assert_eq!(error_codes(&analysis), vec!["E0106"]);
    }

    #[test]
    fn unused_local_is_only_a_warning() {
        let analysis = analyze("fun main() { let x = 1; }");
        assert!(analysis.module.is_some());
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(analysis.diagnostics[0].level, DiagLevel::Warning);
        assert_eq!(analysis.diagnostics[0].code, Some(codes::W0001));
    }

    #[test]
    fn shadowing_uses_latest_binding() {
        let analysis = analyze("fun main() { let x = 1; let x = x == 1; print x; }");
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        let module = analysis.module.unwrap();
        let ResolvedStmt::Print(expr) = &module.functions[0].body[2] else {
            panic!("expected print")
        };
        assert_eq!(expr.ty, Type::Bool);
    }

    #[test]
    fn syntax_error_is_e0001() {
        let analysis = analyze("fun main( { }");
        assert!(analysis.module.is_none());
        assert_eq!(error_codes(&analysis), vec!["E0001"]);
    }
}
