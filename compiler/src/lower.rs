// lower.rs — In-place IR lowering
//
// Simplifies the IR before bitcode emission:
//   1. global loads are replaced by the global's constant value,
//   2. binary operations on constants are folded (wrapping arithmetic),
//   3. instructions after the first `ret` are dropped,
//   4. pure instructions whose result is unused are removed, to a fixpoint.
//
// Preconditions: the module passes `validate_module`.
// Postconditions: the module still passes `validate_module`; observable
//   behaviour (printed values, returned values) is unchanged.
// Failure modes: none for the reference implementation.
// Side effects: mutates the module in place. The caller bumps its generation.

use std::collections::{HashMap, HashSet};

use crate::id::{SymbolId, ValueId};
use crate::ir::{Instr, IrFunction, IrModule, Op};
use crate::toolchain::{CollabResult, Lowering};

#[derive(Debug, Default)]
pub struct Lowerer;

impl Lowering for Lowerer {
    fn lower(&self, ir: &mut IrModule) -> CollabResult<()> {
        let stats = lower_module(ir);
        tracing::debug!(
            inlined = stats.inlined_loads,
            folded = stats.folded,
            unreachable = stats.unreachable,
            dead = stats.dead,
            "lowered module"
        );
        Ok(())
    }
}

/// Counts of rewrites performed by one lowering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LowerStats {
    pub inlined_loads: usize,
    pub folded: usize,
    pub unreachable: usize,
    pub dead: usize,
}

pub fn lower_module(ir: &mut IrModule) -> LowerStats {
    let globals: HashMap<SymbolId, i64> = ir.globals.iter().map(|g| (g.symbol, g.value)).collect();
    let mut stats = LowerStats::default();
    for function in ir.functions.iter_mut() {
        stats.inlined_loads += inline_globals(function, &globals);
        stats.folded += fold_constants(function);
        stats.unreachable += strip_unreachable(function);
        stats.dead += eliminate_dead_values(function);
    }
    stats
}

fn inline_globals(function: &mut IrFunction, globals: &HashMap<SymbolId, i64>) -> usize {
    let mut count = 0;
    for instr in function.body.iter_mut() {
        if let Op::LoadGlobal(symbol) = instr.op {
            if let Some(&value) = globals.get(&symbol) {
                instr.op = Op::Const(value);
                count += 1;
            }
        }
    }
    count
}

fn fold_constants(function: &mut IrFunction) -> usize {
    let mut consts: HashMap<ValueId, i64> = HashMap::new();
    let mut count = 0;
    for instr in function.body.iter_mut() {
        if let Op::Binary(op, l, r) = instr.op {
            if let (Some(&lv), Some(&rv)) = (consts.get(&l), consts.get(&r)) {
                instr.op = Op::Const(op.eval(lv, rv));
                count += 1;
            }
        }
        if let (Some(result), Op::Const(n)) = (instr.result, &instr.op) {
            consts.insert(result, *n);
        }
    }
    count
}

fn strip_unreachable(function: &mut IrFunction) -> usize {
    match function.body.iter().position(|i| i.op.is_terminator()) {
        Some(pos) => {
            let removed = function.body.len() - pos - 1;
            function.body.truncate(pos + 1);
            removed
        }
        None => 0,
    }
}

fn eliminate_dead_values(function: &mut IrFunction) -> usize {
    let mut removed = 0;
    loop {
        let used: HashSet<ValueId> = function
            .body
            .iter()
            .flat_map(|i| i.op.operands())
            .collect();
        let before = function.body.len();
        function.body.retain(|i: &Instr| {
            !(i.op.is_pure() && i.result.is_some_and(|r| !used.contains(&r)))
        });
        let delta = before - function.body.len();
        if delta == 0 {
            break;
        }
        removed += delta;
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FileId;
    use crate::resolve::analyze_sources;
    use crate::source::SourceFile;
    use crate::symbols::SymbolTable;
    use crate::translate::translate_module;
    use crate::validate::validate_module;

    fn ir_for(text: &str) -> IrModule {
        let analysis = analyze_sources(&[SourceFile::new(FileId(0), "l.src", text)], "l");
        translate_module(&analysis.module.unwrap(), &mut SymbolTable::new()).unwrap()
    }

    #[test]
    fn globals_are_inlined_and_folded() {
        let mut ir = ir_for("val a: Int = 20; fun main() { print a * 2 + 2; }");
        let stats = lower_module(&mut ir);
        assert_eq!(stats.inlined_loads, 1);
        assert_eq!(stats.folded, 2);
        assert_eq!(validate_module(&ir), Ok(()));
        insta::assert_snapshot!(ir.to_string(), @r"
        module l
        global @a = 20
        fun @main(0) -> unit {
          %4 = const 42
          print %4
          ret
        }
        ");
    }

    #[test]
    fn code_after_return_is_dropped() {
        let mut ir = ir_for("fun f(): Int { return 1; print 2; return 3; }");
        let stats = lower_module(&mut ir);
        assert!(stats.unreachable >= 3);
        let f = ir.function_by_name("f").unwrap();
        assert!(f.body.last().unwrap().op.is_terminator());
        assert_eq!(f.body.iter().filter(|i| i.op.is_terminator()).count(), 1);
        assert_eq!(validate_module(&ir), Ok(()));
    }

    #[test]
    fn calls_and_prints_survive() {
        let mut ir = ir_for("fun g(x: Int): Int { return x; } fun main() { g(1); let y = 5; print 0; }");
        lower_module(&mut ir);
        let main = ir.function_by_name("main").unwrap();
        assert!(main.body.iter().any(|i| matches!(i.op, Op::Call { .. })));
        assert!(main.body.iter().any(|i| matches!(i.op, Op::Print(_))));
        assert_eq!(validate_module(&ir), Ok(()));
    }

    #[test]
    fn unused_params_are_removed_but_arity_kept() {
        let mut ir = ir_for("fun f(a: Int, b: Int): Int { return b; }");
        lower_module(&mut ir);
        let f = ir.function_by_name("f").unwrap();
        assert_eq!(f.params, 2);
        assert_eq!(f.body.len(), 2);
    }
}
