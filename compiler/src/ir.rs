// ir.rs — Module-level intermediate representation
//
// A flat SSA-style IR: each function is a single straight-line block of
// instructions ending in `ret`. Values are numbered per function. Symbols
// come from the run's `SymbolTable`.
//
// The module carries a generation counter that every in-place mutation
// bumps, so derived caches (the ModuleIndex) can detect staleness.

use std::fmt;

use crate::ast::BinOp;
use crate::id::{SymbolId, ValueId};

#[derive(Debug, Clone, PartialEq)]
pub struct IrModule {
    pub name: String,
    pub globals: Vec<IrGlobal>,
    pub functions: Vec<IrFunction>,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrGlobal {
    pub symbol: SymbolId,
    pub name: String,
    /// Name of the owning module.
    pub parent: String,
    pub value: i64,
    pub exported: bool,
    /// Set by the serializer when the declaration is part of the metadata.
    pub in_metadata: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub symbol: SymbolId,
    pub name: String,
    pub parent: String,
    pub params: u32,
    pub returns_value: bool,
    pub exported: bool,
    pub in_metadata: bool,
    pub body: Vec<Instr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub result: Option<ValueId>,
    pub op: Op,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Const(i64),
    Param(u32),
    LoadGlobal(SymbolId),
    Binary(BinOp, ValueId, ValueId),
    Call { callee: SymbolId, args: Vec<ValueId> },
    Print(ValueId),
    Return(Option<ValueId>),
}

impl Op {
    /// Values read by this operation.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Op::Const(_) | Op::Param(_) | Op::LoadGlobal(_) | Op::Return(None) => Vec::new(),
            Op::Binary(_, l, r) => vec![*l, *r],
            Op::Call { args, .. } => args.clone(),
            Op::Print(v) | Op::Return(Some(v)) => vec![*v],
        }
    }

    /// No side effects: removable when its result is unused.
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            Op::Const(_) | Op::Param(_) | Op::LoadGlobal(_) | Op::Binary(..)
        )
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Op::Return(_))
    }
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            globals: Vec::new(),
            functions: Vec::new(),
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record an in-place mutation. Any index built before this call is stale.
    pub fn mark_mutated(&mut self) {
        self.generation += 1;
    }

    pub fn function(&self, symbol: SymbolId) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.symbol == symbol)
    }

    pub fn global(&self, symbol: SymbolId) -> Option<&IrGlobal> {
        self.globals.iter().find(|g| g.symbol == symbol)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn global_by_name(&self, name: &str) -> Option<&IrGlobal> {
        self.globals.iter().find(|g| g.name == name)
    }

    pub fn instruction_count(&self) -> usize {
        self.functions.iter().map(|f| f.body.len()).sum()
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        if let Some(f) = self.function(symbol) {
            return f.name.clone();
        }
        if let Some(g) = self.global(symbol) {
            return g.name.clone();
        }
        format!("sym{}", symbol.0)
    }
}

// ── Textual dump ────────────────────────────────────────────────────────────

fn flags(exported: bool, in_metadata: bool) -> String {
    let mut s = String::new();
    if exported {
        s.push_str(" export");
    }
    if in_metadata {
        s.push_str(" meta");
    }
    s
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {}", self.name)?;
        for g in &self.globals {
            writeln!(
                f,
                "global @{} = {}{}",
                g.name,
                g.value,
                flags(g.exported, g.in_metadata)
            )?;
        }
        for func in &self.functions {
            writeln!(
                f,
                "fun @{}({}) -> {}{} {{",
                func.name,
                func.params,
                if func.returns_value { "value" } else { "unit" },
                flags(func.exported, func.in_metadata)
            )?;
            for instr in &func.body {
                write!(f, "  ")?;
                if let Some(result) = instr.result {
                    write!(f, "{} = ", result)?;
                }
                match &instr.op {
                    Op::Const(n) => writeln!(f, "const {}", n)?,
                    Op::Param(i) => writeln!(f, "param {}", i)?,
                    Op::LoadGlobal(sym) => writeln!(f, "load @{}", self.symbol_name(*sym))?,
                    Op::Binary(op, l, r) => writeln!(f, "{} {}, {}", op.mnemonic(), l, r)?,
                    Op::Call { callee, args } => {
                        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                        writeln!(f, "call @{}({})", self.symbol_name(*callee), args.join(", "))?
                    }
                    Op::Print(v) => writeln!(f, "print {}", v)?,
                    Op::Return(Some(v)) => writeln!(f, "ret {}", v)?,
                    Op::Return(None) => writeln!(f, "ret")?,
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
