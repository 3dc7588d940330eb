use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ncc::config::Config;
use ncc::driver::run_top_level_phases;
use ncc::id::FileId;
use ncc::index::ModuleIndex;
use ncc::source::SourceFile;
use ncc::symbols::SymbolTable;
use ncc::toolchain::Toolchain;
use ncc::*;

// Latency scenarios. All scenarios compile cleanly as programs.

const SIMPLE_MODULE: &str = r#"
fun main() {
    print 1 + 2;
}
"#;

const LIBRARY_MODULE: &str = r#"
pub val scale: Int = 3;
val offset: Int = 7;

pub fun apply(x: Int): Int {
    return x * scale + offset;
}

pub fun twice(x: Int): Int {
    return apply(apply(x));
}

fun main() {
    print twice(5);
    print apply(scale) == 16;
}
"#;

const LOCALS_MODULE: &str = r#"
val limit: Int = 100;

fun over(x: Int): Bool {
    return limit < x;
}

fun main() {
    let a = 40 * 3;
    let b = a - limit;
    let c = over(a);
    print a - b;
    print c;
    print b == 20;
}
"#;

fn scenarios() -> [(&'static str, &'static str); 3] {
    [
        ("simple", SIMPLE_MODULE),
        ("library", LIBRARY_MODULE),
        ("locals", LOCALS_MODULE),
    ]
}

/// Module-scaling generator: `n` functions, each calling its predecessor.
fn generate_scaling_module(n_functions: usize) -> String {
    let mut src = String::from("pub val seed: Int = 1;\n\n");
    for i in 0..n_functions {
        if i == 0 {
            src.push_str("pub fun f0(x: Int): Int { return x + seed; }\n");
        } else {
            src.push_str(&format!(
                "pub fun f{}(x: Int): Int {{ return f{}(x) * 2 + {}; }}\n",
                i,
                i - 1,
                i
            ));
        }
    }
    src.push_str(&format!("\nfun main() {{ print f{}(3); }}\n", n_functions - 1));
    src
}

fn source_file(text: &str) -> Vec<SourceFile> {
    vec![SourceFile::new(FileId(0), "bench.src", text)]
}

fn lowered_ir(text: &str) -> ir::IrModule {
    let analysis = resolve::analyze_sources(&source_file(text), "bench");
    let module = analysis.module.expect("benchmark scenario must analyze");
    let mut ir = translate::translate_module(&module, &mut SymbolTable::new())
        .expect("benchmark scenario must translate");
    lower::lower_module(&mut ir);
    ir.mark_mutated();
    ir
}

// Parser latency for representative scenarios.
fn bench_parse_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/parse_latency");

    for (name, text) in scenarios() {
        let files = source_file(text);
        group.bench_with_input(BenchmarkId::from_parameter(name), &files, |b, files| {
            b.iter(|| {
                let result = parser::parse(black_box(&files[0]));
                black_box(&result.ast);
            });
        });
    }

    group.finish();
}

// Phase-level latency on the library scenario.
fn bench_phase_latency(c: &mut Criterion) {
    let text = LIBRARY_MODULE;
    let target = target::find_target("linux_x64").expect("linux_x64 is a known target");

    {
        let mut group = c.benchmark_group("kpi/phase_latency/frontend");
        let files = source_file(text);
        group.bench_function("library", |b| {
            b.iter(|| black_box(resolve::analyze_sources(black_box(&files), "bench")));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("kpi/phase_latency/psi_to_ir");
        let module = resolve::analyze_sources(&source_file(text), "bench")
            .module
            .expect("benchmark scenario must analyze");
        group.bench_function("library", |b| {
            b.iter(|| {
                let mut symbols = SymbolTable::new();
                black_box(translate::translate_module(black_box(&module), &mut symbols))
            });
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("kpi/phase_latency/lower");
        let module = resolve::analyze_sources(&source_file(text), "bench")
            .module
            .expect("benchmark scenario must analyze");
        group.bench_function("library", |b| {
            b.iter_batched(
                || {
                    translate::translate_module(&module, &mut SymbolTable::new())
                        .expect("benchmark scenario must translate")
                },
                |mut ir| black_box(lower::lower_module(&mut ir)),
                BatchSize::SmallInput,
            );
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("kpi/phase_latency/bitcode");
        let ir = lowered_ir(text);
        let index = ModuleIndex::build(&ir);
        group.bench_function("library", |b| {
            b.iter(|| black_box(codegen::render_bitcode(black_box(&ir), &index, target)));
        });
        group.finish();
    }
}

// Full driver run into a scratch directory, including staging and persistence.
fn bench_full_compile_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/full_compile_latency");
    let toolchain = Toolchain::reference();

    for (name, text) in scenarios() {
        let dir = tempfile::tempdir().expect("scratch directory");
        let source = dir.path().join(format!("{}.src", name));
        std::fs::write(&source, text).expect("write scenario");
        let config = Config {
            sources: vec![source],
            output: dir.path().join("out").join(name),
            target: Some("linux_x64".into()),
            ..Config::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| {
                let mut sink = Vec::new();
                let report = run_top_level_phases(black_box(config), &toolchain, &mut sink)
                    .expect("benchmark scenario must compile");
                black_box(report.persisted);
            });
        });
    }

    group.finish();
}

// Frontend plus lowering vs number of functions.
fn bench_module_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("kpi/module_scaling");

    for n_functions in [1_usize, 10, 50, 200] {
        let text = generate_scaling_module(n_functions);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}fns", n_functions)),
            &text,
            |b, text| {
                b.iter(|| black_box(lowered_ir(black_box(text))));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_latency,
    bench_phase_latency,
    bench_full_compile_latency,
    bench_module_scaling,
);
criterion_main!(benches);
