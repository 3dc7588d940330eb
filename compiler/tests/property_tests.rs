// Property-based tests for pipeline invariants.
//
// Two categories:
// 1. Lowering: generated programs translate to valid IR, stay valid after
//    lowering, and print the same constant values they would evaluate to.
// 2. Phase configuration: for any set of disabled phases, no disabled phase
//    (or child of one) executes, and a run never ends in an internal error.
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use ncc::ast::BinOp;
use ncc::config::Config;
use ncc::driver::run_top_level_phases;
use ncc::error::PipelineError;
use ncc::id::{FileId, ValueId};
use ncc::ir::{IrFunction, Op};
use ncc::lower::lower_module;
use ncc::phase::PhaseId;
use ncc::resolve::analyze_sources;
use ncc::source::SourceFile;
use ncc::symbols::SymbolTable;
use ncc::toolchain::Toolchain;
use ncc::translate::translate_module;
use ncc::validate::validate_module;
use proptest::prelude::*;

// ── Program generator ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum GenExpr {
    Lit(i64),
    Global(usize),
    Binary(BinOp, Box<GenExpr>, Box<GenExpr>),
}

impl GenExpr {
    fn render(&self) -> String {
        match self {
            GenExpr::Lit(n) => n.to_string(),
            GenExpr::Global(i) => format!("g{}", i),
            GenExpr::Binary(op, l, r) => format!("({} {} {})", l.render(), op.symbol(), r.render()),
        }
    }

    fn eval(&self, globals: &[i64]) -> i64 {
        match self {
            GenExpr::Lit(n) => *n,
            GenExpr::Global(i) => globals[*i],
            GenExpr::Binary(op, l, r) => op.eval(l.eval(globals), r.eval(globals)),
        }
    }
}

fn arb_expr(globals: usize) -> impl Strategy<Value = GenExpr> {
    let leaf = prop_oneof![
        (0i64..1000).prop_map(GenExpr::Lit),
        (0..globals).prop_map(GenExpr::Global),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        (
            prop_oneof![Just(BinOp::Add), Just(BinOp::Sub), Just(BinOp::Mul)],
            inner.clone(),
            inner,
        )
            .prop_map(|(op, l, r)| GenExpr::Binary(op, Box::new(l), Box::new(r)))
    })
}

/// Globals with their values plus a list of printed expressions.
fn arb_program() -> impl Strategy<Value = (Vec<i64>, Vec<GenExpr>)> {
    prop::collection::vec(0i64..10_000, 1..5).prop_flat_map(|globals| {
        let n = globals.len();
        (Just(globals), prop::collection::vec(arb_expr(n), 1..6))
    })
}

fn render_program(globals: &[i64], prints: &[GenExpr]) -> String {
    let mut src = String::new();
    for (i, v) in globals.iter().enumerate() {
        src.push_str(&format!("val g{}: Int = {};\n", i, v));
    }
    src.push_str("fun main() {\n");
    for e in prints {
        src.push_str(&format!("    print {};\n", e.render()));
    }
    src.push_str("}\n");
    src
}

fn printed_constants(main: &IrFunction) -> Vec<Option<i64>> {
    let const_of = |v: ValueId| {
        main.body.iter().find_map(|i| match i.op {
            Op::Const(n) if i.result == Some(v) => Some(n),
            _ => None,
        })
    };
    main.body
        .iter()
        .filter_map(|i| match i.op {
            Op::Print(v) => Some(const_of(v)),
            _ => None,
        })
        .collect()
}

// ── 1. Lowering ─────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn lowering_preserves_validity_and_values((globals, prints) in arb_program()) {
        let src = render_program(&globals, &prints);
        let analysis = analyze_sources(&[SourceFile::new(FileId(0), "p.src", src.clone())], "p");
        prop_assert!(analysis.module.is_some(), "analysis failed for:\n{}\n{:?}", src, analysis.diagnostics);

        let mut ir = translate_module(&analysis.module.unwrap(), &mut SymbolTable::new()).unwrap();
        prop_assert_eq!(validate_module(&ir), Ok(()));

        lower_module(&mut ir);
        prop_assert_eq!(validate_module(&ir), Ok(()));

        let main = ir.function_by_name("main").unwrap();
        prop_assert!(main.body.iter().all(|i| !matches!(i.op, Op::LoadGlobal(_) | Op::Binary(..))));
        let expected: Vec<Option<i64>> = prints.iter().map(|e| Some(e.eval(&globals))).collect();
        prop_assert_eq!(printed_constants(main), expected);
    }
}

// ── 2. Phase configuration ──────────────────────────────────────────────────

const PROGRAM: &str = "\
pub val base: Int = 1;
pub fun inc(x: Int): Int { return x + base; }
fun main() { print inc(41); }
";

const TOGGLEABLE: [&str; 7] = [
    "frontend",
    "psi_to_ir",
    "serializer",
    "backend",
    "lower",
    "bitcode",
    "link_stage",
];

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        max_shrink_iters: 50,
        .. ProptestConfig::default()
    })]

    #[test]
    fn disabled_phases_never_execute(
        disabled in prop::sample::subsequence(TOGGLEABLE.to_vec(), 0..=4)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("p.src");
        std::fs::write(&source, PROGRAM).unwrap();
        let config = Config {
            sources: vec![source],
            output: dir.path().join("out").join("p"),
            target: Some("linux_x64".into()),
            disabled_phases: disabled.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        };

        let mut listing = Vec::new();
        match run_top_level_phases(&config, &Toolchain::reference(), &mut listing) {
            Ok(report) => {
                for phase in report.executed_phases() {
                    prop_assert!(!disabled.contains(&phase.name()), "{} ran while disabled", phase);
                    if let Some(parent) = phase.parent() {
                        prop_assert!(!disabled.contains(&parent.name()));
                    }
                }
                let state = report.state.as_ref().unwrap();
                if disabled.contains(&"serializer") {
                    prop_assert!(state.serialized_metadata().is_none());
                }
                if disabled.contains(&"link_stage") {
                    prop_assert!(state.linked_output().is_none());
                    prop_assert!(!config.output.exists());
                }
                if report.executed_phases().contains(&PhaseId::LinkStage) {
                    prop_assert!(config.output.exists());
                }
            }
            Err(PipelineError::MissingInput { .. }) => {
                prop_assert!(!config.output.exists());
            }
            Err(other) => prop_assert!(false, "unexpected failure: {}", other),
        }
    }
}
