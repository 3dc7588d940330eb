// translate.rs — Resolved module to IR
//
// Declares every global and function in the run's symbol table first, then
// translates function bodies into straight-line SSA instructions.
//
// Preconditions: `module` came out of a successful analysis.
// Postconditions: the returned IR passes `validate_module`.
// Failure modes: a reference to a declaration the module does not contain.
// Side effects: symbols are declared in `symbols`.

use std::collections::HashMap;

use crate::error::CollaboratorError;
use crate::id::{DefId, LocalId, SymbolId, ValueId};
use crate::ir::{Instr, IrFunction, IrGlobal, IrModule, Op};
use crate::resolve::{ResolvedExpr, ResolvedExprKind, ResolvedFunction, ResolvedModule, ResolvedStmt, Type};
use crate::symbols::{SymbolKind, SymbolTable};
use crate::toolchain::{CollabResult, IrTranslator};

#[derive(Debug, Default)]
pub struct IrGenerator;

impl IrTranslator for IrGenerator {
    fn translate(&self, module: &ResolvedModule, symbols: &mut SymbolTable) -> CollabResult<IrModule> {
        translate_module(module, symbols)
    }
}

pub fn translate_module(module: &ResolvedModule, symbols: &mut SymbolTable) -> CollabResult<IrModule> {
    let mut ir = IrModule::new(module.name.clone());
    let mut defs: HashMap<DefId, SymbolId> = HashMap::new();

    for global in &module.globals {
        let symbol = symbols.declare(&global.name, SymbolKind::Global);
        defs.insert(global.def, symbol);
        ir.globals.push(IrGlobal {
            symbol,
            name: global.name.clone(),
            parent: module.name.clone(),
            value: global.value,
            exported: global.public,
            in_metadata: false,
        });
    }
    for function in &module.functions {
        defs.insert(function.def, symbols.declare(&function.name, SymbolKind::Function));
    }

    for function in &module.functions {
        let builder = FunctionBuilder {
            module,
            defs: &defs,
            body: Vec::new(),
            next_value: 0,
            params: Vec::new(),
            locals: HashMap::new(),
        };
        ir.functions.push(builder.build(function)?);
    }

    tracing::debug!(
        module = %ir.name,
        functions = ir.functions.len(),
        instructions = ir.instruction_count(),
        "translated module to IR"
    );
    Ok(ir)
}

struct FunctionBuilder<'a> {
    module: &'a ResolvedModule,
    defs: &'a HashMap<DefId, SymbolId>,
    body: Vec<Instr>,
    next_value: u32,
    params: Vec<ValueId>,
    locals: HashMap<LocalId, ValueId>,
}

impl FunctionBuilder<'_> {
    fn build(mut self, function: &ResolvedFunction) -> CollabResult<IrFunction> {
        let symbol = self.symbol(function.def)?;
        for index in 0..function.params.len() as u32 {
            let value = self.push(Op::Param(index));
            self.params.push(value);
        }

        for stmt in &function.body {
            self.stmt(stmt)?;
        }
        if function.ret == Type::Unit && !matches!(function.body.last(), Some(ResolvedStmt::Return(_))) {
            self.push_effect(Op::Return(None));
        }

        Ok(IrFunction {
            symbol,
            name: function.name.clone(),
            parent: self.module.name.clone(),
            params: function.params.len() as u32,
            returns_value: function.ret != Type::Unit,
            exported: function.public,
            in_metadata: false,
            body: self.body,
        })
    }

    fn symbol(&self, def: DefId) -> CollabResult<SymbolId> {
        self.defs
            .get(&def)
            .copied()
            .ok_or_else(|| CollaboratorError::Other(format!("reference to unknown declaration #{}", def.0)))
    }

    fn push(&mut self, op: Op) -> ValueId {
        let value = ValueId(self.next_value);
        self.next_value += 1;
        self.body.push(Instr {
            result: Some(value),
            op,
        });
        value
    }

    fn push_effect(&mut self, op: Op) {
        self.body.push(Instr { result: None, op });
    }

    fn stmt(&mut self, stmt: &ResolvedStmt) -> CollabResult<()> {
        match stmt {
            ResolvedStmt::Let { local, value } => {
                let v = self.value(value)?;
                self.locals.insert(*local, v);
            }
            ResolvedStmt::Print(expr) => {
                let v = self.value(expr)?;
                self.push_effect(Op::Print(v));
            }
            ResolvedStmt::Eval(expr) => {
                self.expr(expr)?;
            }
            ResolvedStmt::Return(expr) => {
                let v = match expr {
                    Some(e) => Some(self.value(e)?),
                    None => None,
                };
                self.push_effect(Op::Return(v));
            }
        }
        Ok(())
    }

    fn value(&mut self, expr: &ResolvedExpr) -> CollabResult<ValueId> {
        self.expr(expr)?
            .ok_or_else(|| CollaboratorError::Other("Unit expression used as a value".into()))
    }

    /// Translate `expr`; `None` for a call to a Unit function.
    fn expr(&mut self, expr: &ResolvedExpr) -> CollabResult<Option<ValueId>> {
        let value = match &expr.kind {
            ResolvedExprKind::Int(n) => self.push(Op::Const(*n)),
            ResolvedExprKind::Bool(b) => self.push(Op::Const(i64::from(*b))),
            ResolvedExprKind::Param(index) => *self.params.get(*index as usize).ok_or_else(|| {
                CollaboratorError::Other(format!("parameter {} out of range", index))
            })?,
            ResolvedExprKind::Local(local) => *self.locals.get(local).ok_or_else(|| {
                CollaboratorError::Other(format!("local #{} used before binding", local.0))
            })?,
            ResolvedExprKind::Global(def) => {
                let symbol = self.symbol(*def)?;
                self.push(Op::LoadGlobal(symbol))
            }
            ResolvedExprKind::Call { callee, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.value(arg)?);
                }
                let symbol = self.symbol(*callee)?;
                let op = Op::Call {
                    callee: symbol,
                    args: values,
                };
                let returns_value = self
                    .module
                    .function(*callee)
                    .is_some_and(|f| f.ret != Type::Unit);
                if !returns_value {
                    self.push_effect(op);
                    return Ok(None);
                }
                self.push(op)
            }
            ResolvedExprKind::Binary { op, lhs, rhs } => {
                let l = self.value(lhs)?;
                let r = self.value(rhs)?;
                self.push(Op::Binary(*op, l, r))
            }
        };
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FileId;
    use crate::resolve::analyze_sources;
    use crate::source::SourceFile;
    use crate::validate::validate_module;

    fn translate(text: &str) -> IrModule {
        let analysis = analyze_sources(&[SourceFile::new(FileId(0), "t.src", text)], "t");
        let module = analysis.module.expect("analysis succeeds");
        let mut symbols = SymbolTable::new();
        translate_module(&module, &mut symbols).unwrap()
    }

    #[test]
    fn translated_program_is_valid() {
        let ir = translate(
            "pub val base: Int = 40;\n\
             pub fun add(a: Int, b: Int): Int { return a + b; }\n\
             fun show(x: Int) { print x; }\n\
             fun main() { let x = add(base, 2); show(x); print x < 100; }\n",
        );
        assert_eq!(validate_module(&ir), Ok(()));
        assert_eq!(ir.globals.len(), 1);
        assert_eq!(ir.functions.len(), 3);
        assert!(ir.function_by_name("add").unwrap().exported);
    }

    #[test]
    fn dump_of_small_function() {
        let ir = translate("val k: Int = 3; fun main() { let b = true; print k * 2; print b; }");
        insta::assert_snapshot!(ir.to_string(), @r"
        module t
        global @k = 3
        fun @main(0) -> unit {
          %0 = const 1
          %1 = load @k
          %2 = const 2
          %3 = mul %1, %2
          print %3
          print %0
          ret
        }
        ");
    }

    #[test]
    fn unit_call_binds_no_value() {
        let ir = translate("fun f() { } fun main() { f(); }");
        let main = ir.function_by_name("main").unwrap();
        assert_eq!(main.body.len(), 2);
        assert!(main.body[0].result.is_none());
        assert!(matches!(main.body[0].op, Op::Call { .. }));
    }
}
