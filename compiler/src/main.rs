use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ncc::config::{Config, OutputKind};
use ncc::driver::run_top_level_phases;
use ncc::error::PipelineError;
use ncc::toolchain::Toolchain;

#[derive(Parser, Debug)]
#[command(
    name = "ncc",
    version,
    about = "ncc — compiles .src modules through a phased pipeline to linked images or libraries"
)]
struct Cli {
    /// Input .src files or directories (searched recursively)
    sources: Vec<PathBuf>,

    /// Output file path [default: a.out]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Kind of output to produce [default: program]
    #[arg(long, value_enum)]
    kind: Option<OutputKind>,

    /// Module name (defaults to the output file stem)
    #[arg(long)]
    module_name: Option<String>,

    /// Compilation target (see --list-targets)
    #[arg(long)]
    target: Option<String>,

    /// Enable a phase (repeatable)
    #[arg(long = "enable-phase", value_name = "PHASE")]
    enable_phase: Vec<String>,

    /// Disable a phase (repeatable)
    #[arg(long = "disable-phase", value_name = "PHASE")]
    disable_phase: Vec<String>,

    /// Dump compilation state after a phase (repeatable)
    #[arg(long = "verbose-phase", value_name = "PHASE")]
    verbose_phase: Vec<String>,

    /// List known targets
    #[arg(long)]
    list_targets: bool,

    /// List compiler phases and whether they are enabled
    #[arg(long)]
    list_phases: bool,

    /// Print the emitted bitcode
    #[arg(long)]
    print_bitcode: bool,

    /// Also validate the IR after the serializer marks declarations
    #[arg(long)]
    verify: bool,

    /// Print phase timing
    #[arg(long)]
    time_phases: bool,

    /// TOML file with default options; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer the command line over `base`.
    fn merge_into(self, mut base: Config) -> Config {
        if !self.sources.is_empty() {
            base.sources = self.sources;
        }
        if let Some(output) = self.output {
            base.output = output;
        }
        if let Some(kind) = self.kind {
            base.output_kind = kind;
        }
        if self.module_name.is_some() {
            base.module_name = self.module_name;
        }
        if self.target.is_some() {
            base.target = self.target;
        }
        base.enabled_phases.extend(self.enable_phase);
        base.disabled_phases.extend(self.disable_phase);
        base.verbose_phases.extend(self.verbose_phase);
        base.list_targets |= self.list_targets;
        base.list_phases |= self.list_phases;
        base.print_bitcode |= self.print_bitcode;
        base.verify |= self.verify;
        base.time_phases |= self.time_phases;
        base
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ncc=debug" } else { "ncc=warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ncc: error: {}", e);
                return exit_code(&PipelineError::Config(e));
            }
        },
        None => Config::default(),
    };
    let config = cli.merge_into(base);
    tracing::debug!(?config, "effective configuration");

    let toolchain = Toolchain::reference();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = run_top_level_phases(&config, &toolchain, &mut out);
    let _ = out.flush();

    match result {
        Ok(report) => {
            for diag in report.diagnostics() {
                eprintln!("{}", diag);
            }
            if let Some(path) = report.persisted.first() {
                tracing::info!(output = %path.display(), "wrote output");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let PipelineError::UserSource { diagnostics } = &err {
                for diag in diagnostics {
                    eprintln!("{}", diag);
                }
            }
            eprintln!("ncc: error: {}", err);
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            exit_code(&err)
        }
    }
}

fn exit_code(err: &PipelineError) -> ExitCode {
    ExitCode::from(err.exit_code() as u8)
}
