// driver.rs — Top-level phase sequence for one compilation run
//
// Resolves the target and phase registry, answers the listing requests, then
// runs FRONTEND, PSI_TO_IR, SERIALIZER, BACKEND{LOWER, BITCODE} and
// LINK_STAGE through the PhaseManager. Each phase body delegates to a
// collaborator from the `Toolchain` and records its result in the state.
//
// Preconditions: `config` is fully merged (CLI over file).
// Postconditions: on success the linked output (or the bare bitcode when
//   LINK_STAGE is disabled) and the metadata sidecar are in place.
// Failure modes: the first failing phase aborts the run; see `PipelineError`.
// Side effects: listings, bitcode text and state dumps go to `out`; files
//   are written only through the staging area.

use std::io::Write;
use std::path::PathBuf;

use crate::config::Config;
use crate::diag::{has_errors, Diagnostic};
use crate::error::{CollaboratorError, InternalErrorKind, PipelineError};
use crate::index::ModuleIndex;
use crate::output::{sidecar_path, StagingArea, BITCODE_SIDECAR_SUFFIX, METADATA_SIDECAR_SUFFIX};
use crate::phase::{PhaseId, PhaseRegistry};
use crate::phase_manager::{PhaseEvent, PhaseManager, PhaseOutcome};
use crate::source::load_sources;
use crate::state::CompilationUnitState;
use crate::symbols::SymbolTable;
use crate::target::TargetManager;
use crate::toolchain::Toolchain;
use crate::validate::validate_module;

/// What a successful run produced.
#[derive(Debug, Default)]
pub struct CompilationReport {
    /// `None` when there was nothing to compile.
    pub state: Option<CompilationUnitState>,
    pub history: Vec<PhaseEvent>,
    /// Files moved into place, final output first.
    pub persisted: Vec<PathBuf>,
}

impl CompilationReport {
    /// Phases whose body ran, in start order.
    pub fn executed_phases(&self) -> Vec<PhaseId> {
        self.history
            .iter()
            .filter(|e| e.outcome != PhaseOutcome::Skipped)
            .map(|e| e.phase)
            .collect()
    }

    /// Non-fatal diagnostics (warnings) reported by the frontend.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.state {
            Some(state) => state.diagnostics(),
            None => &[],
        }
    }
}

/// Run one compilation described by `config`.
pub fn run_top_level_phases(
    config: &Config,
    toolchain: &Toolchain,
    out: &mut dyn Write,
) -> Result<CompilationReport, PipelineError> {
    let targets = TargetManager::new(config.target.as_deref())?;
    if config.list_targets {
        targets.list(out).map_err(PipelineError::Output)?;
    }

    let registry = PhaseRegistry::configure(config)?;
    if config.list_phases {
        registry.list(out).map_err(PipelineError::Output)?;
    }

    if config.sources.is_empty() {
        tracing::debug!("no sources given, nothing to compile");
        return Ok(CompilationReport::default());
    }

    let target = targets.current()?;
    let staging = StagingArea::new(&config.output).map_err(PipelineError::Output)?;
    let mut state = CompilationUnitState::new(config.clone(), target);
    let mut manager = PhaseManager::new(&registry);
    tracing::info!(
        target_name = target.name,
        output = %config.output.display(),
        "compilation started"
    );

    run_phases(&mut manager, &mut state, toolchain, &staging, out)?;
    let persisted = persist_outputs(&state, &staging)?;

    tracing::info!(persisted = persisted.len(), "compilation finished");
    Ok(CompilationReport {
        state: Some(state),
        history: manager.into_history(),
        persisted,
    })
}

fn run_phases(
    manager: &mut PhaseManager<'_>,
    state: &mut CompilationUnitState,
    toolchain: &Toolchain,
    staging: &StagingArea,
    out: &mut dyn Write,
) -> Result<(), PipelineError> {
    run_phase(manager, state, out, PhaseId::Frontend, |_, state, _| {
        frontend(state, toolchain)
    })?;
    run_phase(manager, state, out, PhaseId::PsiToIr, |_, state, _| {
        psi_to_ir(state, toolchain)
    })?;
    run_phase(manager, state, out, PhaseId::Serializer, |_, state, _| {
        serializer(state, toolchain)
    })?;
    run_phase(manager, state, out, PhaseId::Backend, |m, state, out| {
        run_phase(m, state, out, PhaseId::Lower, |_, state, _| lower(state, toolchain))?;
        run_phase(m, state, out, PhaseId::Bitcode, |_, state, _| {
            bitcode(state, toolchain, staging)
        })?;
        verify_bitcode_artifact(state, toolchain, out)
    })?;
    run_phase(manager, state, out, PhaseId::LinkStage, |_, state, _| {
        link_stage(state, toolchain, staging)
    })?;
    Ok(())
}

/// Run `body` as `phase`, then dump the state if the phase is verbose.
fn run_phase<'r, F>(
    manager: &mut PhaseManager<'r>,
    state: &mut CompilationUnitState,
    out: &mut dyn Write,
    phase: PhaseId,
    body: F,
) -> Result<PhaseOutcome, PipelineError>
where
    F: FnOnce(&mut PhaseManager<'r>, &mut CompilationUnitState, &mut dyn Write) -> Result<(), PipelineError>,
{
    let outcome = manager.run(phase, |m| body(m, &mut *state, &mut *out))?;
    if outcome == PhaseOutcome::Completed && manager.should_dump(phase) {
        out.write_all(state.dump(phase).as_bytes())
            .map_err(PipelineError::Output)?;
    }
    Ok(outcome)
}

// ── Phase bodies ────────────────────────────────────────────────────────────

fn frontend(state: &mut CompilationUnitState, toolchain: &Toolchain) -> Result<(), PipelineError> {
    const PHASE: PhaseId = PhaseId::Frontend;
    let sources = load_sources(&state.config().sources)
        .map_err(|e| PipelineError::collaborator(PHASE, e))?;
    tracing::debug!(files = sources.len(), "loaded sources");

    let analysis = toolchain.analyzer.analyze(&sources, state.config());
    state.set_sources(PHASE, sources)?;
    let failed = has_errors(&analysis.diagnostics);
    state.add_diagnostics(analysis.diagnostics);
    if failed {
        return Err(PipelineError::UserSource {
            diagnostics: state.diagnostics().to_vec(),
        });
    }
    let module = analysis.module.ok_or_else(|| {
        PipelineError::collaborator(
            PHASE,
            CollaboratorError::Other("analyzer reported no errors but produced no module".into()),
        )
    })?;
    state.set_resolved_module(PHASE, module)
}

fn psi_to_ir(state: &mut CompilationUnitState, toolchain: &Toolchain) -> Result<(), PipelineError> {
    const PHASE: PhaseId = PhaseId::PsiToIr;
    let mut symbols = SymbolTable::new();
    let ir = toolchain
        .translator
        .translate(state.require_resolved_module(PHASE)?, &mut symbols)
        .map_err(|e| PipelineError::collaborator(PHASE, e))?;
    tracing::debug!(symbols = symbols.len(), "declared IR symbols");
    state.set_symbols(PHASE, symbols)?;
    state.set_ir_module(PHASE, ir)?;
    check_ir(state, PHASE)
}

fn serializer(state: &mut CompilationUnitState, toolchain: &Toolchain) -> Result<(), PipelineError> {
    const PHASE: PhaseId = PhaseId::Serializer;
    let ir = state.require_ir_module_mut(PHASE)?;
    toolchain.serializer.mark_declarations(ir);
    ir.mark_mutated();

    let metadata = toolchain
        .serializer
        .serialize(
            state.require_resolved_module(PHASE)?,
            state.require_ir_module(PHASE)?,
            state.target(),
        )
        .map_err(|e| PipelineError::collaborator(PHASE, e))?;
    state.set_serialized_metadata(PHASE, metadata)?;

    if state.config().verify {
        check_ir(state, PHASE)?;
    }
    Ok(())
}

fn lower(state: &mut CompilationUnitState, toolchain: &Toolchain) -> Result<(), PipelineError> {
    const PHASE: PhaseId = PhaseId::Lower;
    state.invalidate_module_index();
    let ir = state.require_ir_module_mut(PHASE)?;
    toolchain
        .lowering
        .lower(ir)
        .map_err(|e| PipelineError::collaborator(PHASE, e))?;
    ir.mark_mutated();
    check_ir(state, PHASE)?;

    let index = ModuleIndex::build(state.require_ir_module(PHASE)?);
    state.set_module_index(PHASE, index)
}

fn bitcode(
    state: &mut CompilationUnitState,
    toolchain: &Toolchain,
    staging: &StagingArea,
) -> Result<(), PipelineError> {
    const PHASE: PhaseId = PhaseId::Bitcode;
    let artifact = toolchain
        .codegen
        .emit(
            state.require_ir_module(PHASE)?,
            state.require_module_index(PHASE)?,
            state.target(),
            staging.dir(),
        )
        .map_err(|e| PipelineError::collaborator(PHASE, e))?;
    state.set_artifact(PHASE, artifact)
}

/// Always runs once BITCODE produced an artifact, whatever `verify` says.
fn verify_bitcode_artifact(
    state: &CompilationUnitState,
    toolchain: &Toolchain,
    out: &mut dyn Write,
) -> Result<(), PipelineError> {
    const PHASE: PhaseId = PhaseId::Bitcode;
    let Some(artifact) = state.artifact() else {
        return Ok(());
    };
    toolchain.codegen.verify(artifact).map_err(|reason| {
        PipelineError::internal(PHASE, InternalErrorKind::BitcodeVerification, reason)
    })?;
    tracing::debug!(checksum = %artifact.checksum, "bitcode verified");

    if state.config().print_bitcode {
        let text = toolchain
            .codegen
            .render(artifact)
            .map_err(|e| PipelineError::collaborator(PHASE, e))?;
        out.write_all(text.as_bytes()).map_err(PipelineError::Output)?;
    }
    Ok(())
}

fn link_stage(
    state: &mut CompilationUnitState,
    toolchain: &Toolchain,
    staging: &StagingArea,
) -> Result<(), PipelineError> {
    const PHASE: PhaseId = PhaseId::LinkStage;
    let artifact = state.require_artifact(PHASE)?;
    let linked = toolchain
        .linker
        .link(
            std::slice::from_ref(artifact),
            state.serialized_metadata(),
            state.config(),
            staging.dir(),
        )
        .map_err(|e| PipelineError::collaborator(PHASE, e))?;
    state.set_linked_output(PHASE, linked)
}

fn check_ir(state: &CompilationUnitState, phase: PhaseId) -> Result<(), PipelineError> {
    validate_module(state.require_ir_module(phase)?)
        .map_err(|report| PipelineError::internal(phase, InternalErrorKind::IrValidation, report.to_string()))
}

// ── Persistence ─────────────────────────────────────────────────────────────

fn persist_outputs(
    state: &CompilationUnitState,
    staging: &StagingArea,
) -> Result<Vec<PathBuf>, PipelineError> {
    let output = &state.config().output;
    let mut persisted = Vec::new();
    if let Some(linked) = state.linked_output() {
        // Sidecars first: the final output only appears once nothing else can fail.
        if let Some(metadata) = state.serialized_metadata() {
            let path = sidecar_path(output, METADATA_SIDECAR_SUFFIX);
            staging
                .persist_bytes(&metadata.bytes, &path)
                .map_err(PipelineError::Output)?;
            persisted.push(path);
        }
        if let Err(e) = staging.persist(linked, output) {
            for path in &persisted {
                let _ = std::fs::remove_file(path);
            }
            return Err(PipelineError::Output(e));
        }
        persisted.insert(0, output.clone());
    } else if let Some(artifact) = state.artifact() {
        let path = sidecar_path(output, BITCODE_SIDECAR_SUFFIX);
        staging
            .persist(&artifact.path, &path)
            .map_err(PipelineError::Output)?;
        persisted.push(path);
    }
    Ok(persisted)
}
