// codegen.rs — Textual bitcode emission and verification
//
// Writes the lowered module as line-oriented "bitcode": a header naming the
// format, module and target, one line per global, one block per function,
// and a trailing SHA-256 checksum over everything before it.
//
// Preconditions: the module passes `validate_module`; the index is current.
// Postconditions: `<out_dir>/<module>.bc` exists and passes `verify_bitcode`.
// Failure modes: symbols missing from the index, I/O errors.
// Side effects: writes one file.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::ast::BinOp;
use crate::error::CollaboratorError;
use crate::id::SymbolId;
use crate::index::ModuleIndex;
use crate::ir::{IrModule, Op};
use crate::serialize::{bytes_to_hex, sha256};
use crate::target::Target;
use crate::toolchain::{CollabResult, Codegen};

pub const BITCODE_MAGIC: &str = "; ncc-bitcode 1";
pub const BITCODE_EXTENSION: &str = "bc";
const CHECKSUM_PREFIX: &str = "; checksum ";

/// An emitted bitcode file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedArtifact {
    pub path: PathBuf,
    pub module: String,
    pub target: String,
    /// Hex SHA-256 recorded in the file's trailer.
    pub checksum: String,
}

#[derive(Debug, Default)]
pub struct BitcodeEmitter;

impl Codegen for BitcodeEmitter {
    fn emit(
        &self,
        ir: &IrModule,
        index: &ModuleIndex,
        target: &Target,
        out_dir: &Path,
    ) -> CollabResult<EmittedArtifact> {
        let (text, checksum) = render_bitcode(ir, index, target)?;
        let path = out_dir.join(format!("{}.{}", ir.name, BITCODE_EXTENSION));
        std::fs::write(&path, &text)?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "wrote bitcode");
        Ok(EmittedArtifact {
            path,
            module: ir.name.clone(),
            target: target.name.to_string(),
            checksum,
        })
    }

    fn verify(&self, artifact: &EmittedArtifact) -> Result<(), String> {
        let text = std::fs::read_to_string(&artifact.path)
            .map_err(|e| format!("cannot read {}: {}", artifact.path.display(), e))?;
        let summary = verify_bitcode(&text)?;
        if summary.module != artifact.module {
            return Err(format!(
                "module header `{}` does not match `{}`",
                summary.module, artifact.module
            ));
        }
        if summary.target != artifact.target {
            return Err(format!(
                "target header `{}` does not match `{}`",
                summary.target, artifact.target
            ));
        }
        if summary.checksum != artifact.checksum {
            return Err("checksum differs from the one recorded at emission".into());
        }
        Ok(())
    }

    fn render(&self, artifact: &EmittedArtifact) -> CollabResult<String> {
        Ok(std::fs::read_to_string(&artifact.path)?)
    }
}

// ── Emission ────────────────────────────────────────────────────────────────

/// Render the bitcode text for `ir`; returns the text and its checksum.
pub fn render_bitcode(
    ir: &IrModule,
    index: &ModuleIndex,
    target: &Target,
) -> CollabResult<(String, String)> {
    let mut out = String::new();
    let _ = writeln!(out, "{}", BITCODE_MAGIC);
    let _ = writeln!(out, "; module {}", ir.name);
    let _ = writeln!(out, "; target {} {}", target.name, target.triple);

    for global in &ir.globals {
        let _ = writeln!(out, "global @{} {}", global.name, global.value);
    }

    let global_name = |sym: SymbolId| {
        index
            .global(ir, sym)
            .map(|g| g.name.as_str())
            .ok_or_else(|| CollaboratorError::Codegen(format!("unknown global #{}", sym.0)))
    };
    let function_name = |sym: SymbolId| {
        index
            .function(ir, sym)
            .map(|f| f.name.as_str())
            .ok_or_else(|| CollaboratorError::Codegen(format!("unknown function #{}", sym.0)))
    };

    for function in &ir.functions {
        let ordinal = index.ordinal(function.symbol).ok_or_else(|| {
            CollaboratorError::Codegen(format!("`{}` is missing from the module index", function.name))
        })?;
        let _ = writeln!(
            out,
            "func @{} {} {} #{} {{",
            function.name,
            function.params,
            if function.returns_value { "value" } else { "unit" },
            ordinal
        );
        for instr in &function.body {
            out.push_str("  ");
            if let Some(result) = instr.result {
                let _ = write!(out, "{} = ", result);
            }
            match &instr.op {
                Op::Const(n) => {
                    let _ = write!(out, "const {}", n);
                }
                Op::Param(i) => {
                    let _ = write!(out, "param {}", i);
                }
                Op::LoadGlobal(sym) => {
                    let _ = write!(out, "load @{}", global_name(*sym)?);
                }
                Op::Binary(op, l, r) => {
                    let _ = write!(out, "{} {} {}", op.mnemonic(), l, r);
                }
                Op::Call { callee, args } => {
                    let _ = write!(out, "call @{}", function_name(*callee)?);
                    for arg in args {
                        let _ = write!(out, " {}", arg);
                    }
                }
                Op::Print(v) => {
                    let _ = write!(out, "print {}", v);
                }
                Op::Return(Some(v)) => {
                    let _ = write!(out, "ret {}", v);
                }
                Op::Return(None) => out.push_str("ret"),
            }
            out.push('\n');
        }
        out.push_str("}\n");
    }

    let checksum = bytes_to_hex(&sha256(out.as_bytes()));
    let _ = writeln!(out, "{}{}", CHECKSUM_PREFIX, checksum);
    Ok((out, checksum))
}

// ── Verification ────────────────────────────────────────────────────────────

/// What a successful verification learned about the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcodeSummary {
    pub module: String,
    pub target: String,
    pub checksum: String,
    pub globals: usize,
    /// Function name, parameter count, in file order.
    pub functions: Vec<(String, u32)>,
}

impl BitcodeSummary {
    pub fn has_entry_point(&self) -> bool {
        self.functions
            .iter()
            .any(|(name, params)| name == crate::index::ENTRY_POINT && *params == 0)
    }
}

struct FuncDecl {
    params: u32,
    returns_value: bool,
}

/// Re-read bitcode text and check header, checksum, symbol references and
/// value numbering.
pub fn verify_bitcode(text: &str) -> Result<BitcodeSummary, String> {
    let trailer_start = text
        .trim_end_matches('\n')
        .rfind('\n')
        .map(|i| i + 1)
        .ok_or("truncated bitcode")?;
    let (body, trailer) = text.split_at(trailer_start);
    let checksum = trailer
        .trim_end()
        .strip_prefix(CHECKSUM_PREFIX)
        .ok_or("missing checksum trailer")?
        .to_string();
    if bytes_to_hex(&sha256(body.as_bytes())) != checksum {
        return Err("checksum mismatch".into());
    }

    let mut lines = body.lines().enumerate();
    let mut header = |expect: &str| -> Result<String, String> {
        let (n, line) = lines.next().ok_or("truncated header")?;
        line.strip_prefix(expect)
            .map(str::to_string)
            .ok_or_else(|| format!("line {}: expected `{}`", n + 1, expect.trim_end()))
    };
    header(BITCODE_MAGIC)?;
    let module = header("; module ")?;
    let target = header("; target ")?
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    let body_lines: Vec<(usize, &str)> = lines.collect();

    // Declarations first: calls may refer forward.
    let mut globals = HashSet::new();
    let mut funcs: HashMap<&str, FuncDecl> = HashMap::new();
    let mut order = Vec::new();
    for &(n, line) in &body_lines {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["global", name, value] => {
                let name = symbol_ref(name, n)?;
                value
                    .parse::<i64>()
                    .map_err(|_| format!("line {}: bad global value", n + 1))?;
                if !globals.insert(name) {
                    return Err(format!("line {}: duplicate global @{}", n + 1, name));
                }
            }
            ["func", name, params, kind, _ordinal, "{"] => {
                let name = symbol_ref(name, n)?;
                let params = params
                    .parse::<u32>()
                    .map_err(|_| format!("line {}: bad parameter count", n + 1))?;
                let returns_value = match *kind {
                    "value" => true,
                    "unit" => false,
                    _ => return Err(format!("line {}: bad return kind `{}`", n + 1, kind)),
                };
                if funcs.insert(name, FuncDecl { params, returns_value }).is_some() {
                    return Err(format!("line {}: duplicate function @{}", n + 1, name));
                }
                order.push((name.to_string(), params));
            }
            _ => {}
        }
    }

    let mut current: Option<(&str, u32, HashSet<u32>, bool)> = None;
    for &(n, line) in &body_lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("global ") {
            continue;
        }
        if trimmed.starts_with("func ") {
            if current.is_some() {
                return Err(format!("line {}: nested function", n + 1));
            }
            let name = trimmed
                .split_whitespace()
                .nth(1)
                .map(|s| s.trim_start_matches('@'))
                .unwrap_or_default();
            let params = funcs.get(name).map_or(0, |f| f.params);
            current = Some((name, params, HashSet::new(), false));
            continue;
        }
        let Some((name, params, defined, ended)) = current.as_mut() else {
            return Err(format!("line {}: instruction outside a function", n + 1));
        };
        if trimmed == "}" {
            if !*ended {
                return Err(format!("function @{} does not end in ret", name));
            }
            current = None;
            continue;
        }

        let (result, rest) = match trimmed.split_once(" = ") {
            Some((lhs, rhs)) => (Some(value_ref(lhs, n)?), rhs),
            None => (None, trimmed),
        };
        let words: Vec<&str> = rest.split_whitespace().collect();
        let mut uses = Vec::new();
        *ended = false;
        match words.as_slice() {
            ["const", v] => {
                v.parse::<i64>()
                    .map_err(|_| format!("line {}: bad constant", n + 1))?;
            }
            ["param", i] => {
                let i: u32 = i
                    .parse()
                    .map_err(|_| format!("line {}: bad parameter index", n + 1))?;
                if i >= *params {
                    return Err(format!("line {}: parameter {} out of range", n + 1, i));
                }
            }
            ["load", g] => {
                let g = symbol_ref(g, n)?;
                if !globals.contains(g) {
                    return Err(format!("line {}: load of undeclared global @{}", n + 1, g));
                }
            }
            ["call", callee, args @ ..] => {
                let callee = symbol_ref(callee, n)?;
                let decl = funcs
                    .get(callee)
                    .ok_or_else(|| format!("line {}: call to undeclared function @{}", n + 1, callee))?;
                if decl.params as usize != args.len() {
                    return Err(format!("line {}: arity mismatch calling @{}", n + 1, callee));
                }
                if result.is_some() && !decl.returns_value {
                    return Err(format!("line {}: @{} returns no value", n + 1, callee));
                }
                for a in args {
                    uses.push(value_ref(a, n)?);
                }
            }
            ["print", v] => uses.push(value_ref(v, n)?),
            ["ret"] => *ended = true,
            ["ret", v] => {
                uses.push(value_ref(v, n)?);
                *ended = true;
            }
            [op, l, r] if BinOp::from_mnemonic(op).is_some() => {
                uses.push(value_ref(l, n)?);
                uses.push(value_ref(r, n)?);
            }
            _ => return Err(format!("line {}: unrecognised instruction `{}`", n + 1, trimmed)),
        }
        for u in uses {
            if !defined.contains(&u) {
                return Err(format!("line {}: %{} used before definition", n + 1, u));
            }
        }
        if let Some(r) = result {
            if !defined.insert(r) {
                return Err(format!("line {}: %{} defined twice", n + 1, r));
            }
        }
    }
    if let Some((name, ..)) = current {
        return Err(format!("function @{} is not closed", name));
    }

    Ok(BitcodeSummary {
        module,
        target,
        checksum,
        globals: globals.len(),
        functions: order,
    })
}

fn symbol_ref(word: &str, line: usize) -> Result<&str, String> {
    word.strip_prefix('@')
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("line {}: expected symbol, found `{}`", line + 1, word))
}

fn value_ref(word: &str, line: usize) -> Result<u32, String> {
    word.strip_prefix('%')
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("line {}: expected value, found `{}`", line + 1, word))
}
