// index.rs — Derived lookup cache over a lowered module
//
// Built once after LOWER and read by BITCODE. It records the IR generation
// it was built from; `is_current` turns false as soon as the module is
// mutated again, and the state refuses to hand out a stale index.

use std::collections::{BTreeSet, HashMap};

use crate::id::SymbolId;
use crate::ir::{IrFunction, IrGlobal, IrModule, Op};

pub const ENTRY_POINT: &str = "main";

#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    generation: u64,
    function_pos: HashMap<SymbolId, usize>,
    global_pos: HashMap<SymbolId, usize>,
    ordinals: HashMap<SymbolId, u32>,
    callers: HashMap<SymbolId, BTreeSet<SymbolId>>,
    entry: Option<SymbolId>,
}

impl ModuleIndex {
    pub fn build(module: &IrModule) -> Self {
        let mut index = ModuleIndex {
            generation: module.generation(),
            ..ModuleIndex::default()
        };
        for (i, global) in module.globals.iter().enumerate() {
            index.global_pos.insert(global.symbol, i);
        }
        for (i, function) in module.functions.iter().enumerate() {
            index.function_pos.insert(function.symbol, i);
            index.ordinals.insert(function.symbol, i as u32);
            if function.name == ENTRY_POINT && function.params == 0 {
                index.entry = Some(function.symbol);
            }
            for instr in &function.body {
                if let Op::Call { callee, .. } = instr.op {
                    index.callers.entry(callee).or_default().insert(function.symbol);
                }
            }
        }
        index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while `module` has not been mutated since this index was built.
    pub fn is_current(&self, module: &IrModule) -> bool {
        self.generation == module.generation()
    }

    pub fn function<'a>(&self, module: &'a IrModule, symbol: SymbolId) -> Option<&'a IrFunction> {
        self.function_pos
            .get(&symbol)
            .and_then(|&i| module.functions.get(i))
    }

    pub fn global<'a>(&self, module: &'a IrModule, symbol: SymbolId) -> Option<&'a IrGlobal> {
        self.global_pos
            .get(&symbol)
            .and_then(|&i| module.globals.get(i))
    }

    /// Position of a function in emission order.
    pub fn ordinal(&self, symbol: SymbolId) -> Option<u32> {
        self.ordinals.get(&symbol).copied()
    }

    /// Functions that call `symbol`, in symbol order.
    pub fn callers(&self, symbol: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.callers.get(&symbol).into_iter().flatten().copied()
    }

    /// The zero-argument `main`, if the module has one.
    pub fn entry_point(&self) -> Option<SymbolId> {
        self.entry
    }
}
