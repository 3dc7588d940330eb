// validate.rs — IR well-formedness checks
//
// Pure and stateless. Run at the PSI_TO_IR and LOWER checkpoints (and after
// SERIALIZER when `verify` is set). Reports every violation found; never
// repairs anything.
//
// Preconditions: none.
// Postconditions: `Ok(())` iff the module satisfies every structural rule.
// Failure modes: returns a `ValidationReport` listing the violations.
// Side effects: none.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::id::{SymbolId, ValueId};
use crate::ir::{IrModule, Op};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    DuplicateSymbol { name: String },
    UnknownCallee { function: String, callee: SymbolId },
    UnknownGlobal { function: String, global: SymbolId },
    ArityMismatch { function: String, callee: String, expected: u32, found: usize },
    UndefinedValue { function: String, value: ValueId },
    RedefinedValue { function: String, value: ValueId },
    ParamOutOfRange { function: String, index: u32 },
    ParentMismatch { name: String, parent: String },
    MissingTerminator { function: String },
    CallResultMismatch { function: String, callee: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateSymbol { name } => write!(f, "duplicate symbol `{}`", name),
            Violation::UnknownCallee { function, callee } => {
                write!(f, "`{}` calls undeclared symbol #{}", function, callee.0)
            }
            Violation::UnknownGlobal { function, global } => {
                write!(f, "`{}` loads undeclared global #{}", function, global.0)
            }
            Violation::ArityMismatch {
                function,
                callee,
                expected,
                found,
            } => write!(
                f,
                "`{}` calls `{}` with {} argument(s), expected {}",
                function, callee, found, expected
            ),
            Violation::UndefinedValue { function, value } => {
                write!(f, "`{}` uses {} before it is defined", function, value)
            }
            Violation::RedefinedValue { function, value } => {
                write!(f, "`{}` defines {} twice", function, value)
            }
            Violation::ParamOutOfRange { function, index } => {
                write!(f, "`{}` reads parameter {} out of range", function, index)
            }
            Violation::ParentMismatch { name, parent } => {
                write!(f, "`{}` belongs to module `{}`", name, parent)
            }
            Violation::MissingTerminator { function } => {
                write!(f, "`{}` does not end in `ret`", function)
            }
            Violation::CallResultMismatch { function, callee } => write!(
                f,
                "`{}` binds or omits the result of `{}` inconsistently with its return kind",
                function, callee
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

pub fn validate_module(module: &IrModule) -> Result<(), ValidationReport> {
    let mut violations = Vec::new();

    let mut seen_names = HashSet::new();
    let mut seen_symbols = HashSet::new();
    let mut globals = HashSet::new();
    // symbol -> (name, params, returns_value)
    let mut functions: HashMap<SymbolId, (&str, u32, bool)> = HashMap::new();

    for g in &module.globals {
        if !seen_names.insert(g.name.as_str()) || !seen_symbols.insert(g.symbol) {
            violations.push(Violation::DuplicateSymbol {
                name: g.name.clone(),
            });
        }
        if g.parent != module.name {
            violations.push(Violation::ParentMismatch {
                name: g.name.clone(),
                parent: g.parent.clone(),
            });
        }
        globals.insert(g.symbol);
    }
    for func in &module.functions {
        if !seen_names.insert(func.name.as_str()) || !seen_symbols.insert(func.symbol) {
            violations.push(Violation::DuplicateSymbol {
                name: func.name.clone(),
            });
        }
        if func.parent != module.name {
            violations.push(Violation::ParentMismatch {
                name: func.name.clone(),
                parent: func.parent.clone(),
            });
        }
        functions.insert(func.symbol, (func.name.as_str(), func.params, func.returns_value));
    }

    for func in &module.functions {
        let mut defined = HashSet::new();
        for instr in &func.body {
            for operand in instr.op.operands() {
                if !defined.contains(&operand) {
                    violations.push(Violation::UndefinedValue {
                        function: func.name.clone(),
                        value: operand,
                    });
                }
            }
            match &instr.op {
                Op::Param(index) if *index >= func.params => {
                    violations.push(Violation::ParamOutOfRange {
                        function: func.name.clone(),
                        index: *index,
                    });
                }
                Op::LoadGlobal(sym) if !globals.contains(sym) => {
                    violations.push(Violation::UnknownGlobal {
                        function: func.name.clone(),
                        global: *sym,
                    });
                }
                Op::Call { callee, args } => match functions.get(callee) {
                    None => violations.push(Violation::UnknownCallee {
                        function: func.name.clone(),
                        callee: *callee,
                    }),
                    Some(&(name, params, returns_value)) => {
                        if params as usize != args.len() {
                            violations.push(Violation::ArityMismatch {
                                function: func.name.clone(),
                                callee: name.to_string(),
                                expected: params,
                                found: args.len(),
                            });
                        }
                        if instr.result.is_some() && !returns_value {
                            violations.push(Violation::CallResultMismatch {
                                function: func.name.clone(),
                                callee: name.to_string(),
                            });
                        }
                    }
                },
                _ => {}
            }
            if let Some(result) = instr.result {
                if !defined.insert(result) {
                    violations.push(Violation::RedefinedValue {
                        function: func.name.clone(),
                        value: result,
                    });
                }
            }
        }
        if !func.body.last().is_some_and(|i| i.op.is_terminator()) {
            violations.push(Violation::MissingTerminator {
                function: func.name.clone(),
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport { violations })
    }
}
