// End-to-end tests of the `ncc` binary.
//
// These lock the observable command-line contract: exit codes per error
// category, listings, output placement and diagnostic rendering.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn ncc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ncc"))
}

fn ncc(dir: &Path, args: &[&str]) -> Output {
    Command::new(ncc_binary())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run ncc")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const HELLO: &str = "\
pub val answer: Int = 42;
fun main() {
    print answer;
}
";

#[test]
fn no_sources_is_success_with_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = ncc(dir.path(), &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(!dir.path().join("a.out").exists());
}

#[test]
fn list_targets_and_phases() {
    let dir = tempfile::tempdir().unwrap();
    let output = ncc(dir.path(), &["--list-targets", "--list-phases", "--target", "wasm32"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Available targets:"));
    assert!(text.contains("wasm32-unknown-unknown"));
    assert!(text.contains("frontend:"));
    assert!(text.contains("  lower:"));
}

#[test]
fn compiles_program_to_default_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.src"), HELLO).unwrap();
    let output = ncc(dir.path(), &["hello.src", "--target", "linux_x64"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let image = std::fs::read_to_string(dir.path().join("a.out")).unwrap();
    assert!(image.contains("; entry @main"));
    assert!(dir.path().join("a.out.meta.json").exists());
}

#[test]
fn type_error_exits_with_one_and_renders_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.src"), "fun main() {\n    print 1 + true;\n}\n").unwrap();
    let output = ncc(dir.path(), &["bad.src", "-o", "app", "--target", "linux_x64"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("bad.src:2:11: error[E0102]"), "stderr: {err}");
    assert!(err.contains("compilation failed with 1 error(s)"));
    assert!(!dir.path().join("app").exists());
}

#[test]
fn warnings_are_printed_on_success() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("w.src"), "fun main() { let unused = 1; }\n").unwrap();
    let output = ncc(dir.path(), &["w.src", "--target", "linux_x64"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("warning[W0001]"));
}

#[test]
fn configuration_errors_exit_with_two() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.src"), HELLO).unwrap();

    let output = ncc(dir.path(), &["hello.src", "--target", "pdp11"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown target `pdp11`"));

    let output = ncc(dir.path(), &["hello.src", "--disable-phase", "optimise"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown phase `optimise`"));
}

#[test]
fn print_bitcode_and_disabled_link_stage() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.src"), HELLO).unwrap();
    let output = ncc(
        dir.path(),
        &[
            "hello.src",
            "-o",
            "out/hello",
            "--target",
            "linux_x64",
            "--print-bitcode",
            "--disable-phase",
            "link_stage",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("; ncc-bitcode 1\n; module hello\n"));
    assert!(dir.path().join("out/hello.bc").exists());
    assert!(!dir.path().join("out/hello").exists());
}

#[test]
fn config_file_is_layered_under_flags() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.src"), HELLO).unwrap();
    std::fs::write(
        dir.path().join("ncc.toml"),
        "sources = [\"hello.src\"]\noutput = \"from-file\"\ntarget = \"linux_x64\"\ndisabled_phases = [\"link_stage\"]\n",
    )
    .unwrap();
    let output = ncc(
        dir.path(),
        &["--config", "ncc.toml", "-o", "from-cli", "--enable-phase", "link_stage"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("from-cli").exists());
    assert!(!dir.path().join("from-file").exists());
}

#[test]
fn time_phases_reports_each_phase() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.src"), HELLO).unwrap();
    let output = ncc(dir.path(), &["hello.src", "--target", "linux_x64", "--time-phases"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    for phase in ["frontend", "psi_to_ir", "serializer", "lower", "bitcode", "backend", "link_stage"] {
        assert!(err.contains(&format!("ncc: {} complete", phase)), "missing {phase}: {err}");
    }
}
