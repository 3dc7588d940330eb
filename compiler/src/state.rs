// state.rs — Per-run compilation state
//
// Holds every artifact produced across phases. Each artifact is written at
// most once per run; reading one that was never produced reports which
// phase needed it. The IR module is the only artifact mutated after it is
// set, and each mutation must be followed by `IrModule::mark_mutated`.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::codegen::EmittedArtifact;
use crate::config::Config;
use crate::diag::Diagnostic;
use crate::error::{InternalErrorKind, PipelineError};
use crate::index::ModuleIndex;
use crate::ir::IrModule;
use crate::phase::PhaseId;
use crate::resolve::ResolvedModule;
use crate::serialize::SerializedMetadata;
use crate::source::SourceFile;
use crate::symbols::SymbolTable;
use crate::target::Target;

#[derive(Debug)]
pub struct CompilationUnitState {
    config: Config,
    target: &'static Target,
    sources: Option<Vec<SourceFile>>,
    diagnostics: Vec<Diagnostic>,
    resolved_module: Option<ResolvedModule>,
    symbols: Option<SymbolTable>,
    ir_module: Option<IrModule>,
    serialized_metadata: Option<SerializedMetadata>,
    module_index: Option<ModuleIndex>,
    artifact: Option<EmittedArtifact>,
    linked_output: Option<PathBuf>,
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    phase: PhaseId,
    what: &str,
) -> Result<(), PipelineError> {
    if slot.is_some() {
        return Err(PipelineError::internal(
            phase,
            InternalErrorKind::ArtifactRewritten,
            format!("{} was already produced in this run", what),
        ));
    }
    *slot = Some(value);
    Ok(())
}

fn missing(phase: PhaseId, artifact: &'static str) -> PipelineError {
    PipelineError::MissingInput { phase, artifact }
}

impl CompilationUnitState {
    pub fn new(config: Config, target: &'static Target) -> Self {
        Self {
            config,
            target,
            sources: None,
            diagnostics: Vec::new(),
            resolved_module: None,
            symbols: None,
            ir_module: None,
            serialized_metadata: None,
            module_index: None,
            artifact: None,
            linked_output: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self) -> &'static Target {
        self.target
    }

    // ── Setters (write-once) ──

    pub fn set_sources(&mut self, phase: PhaseId, sources: Vec<SourceFile>) -> Result<(), PipelineError> {
        set_once(&mut self.sources, sources, phase, "source set")
    }

    /// Diagnostics are append-only.
    pub fn add_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn set_resolved_module(
        &mut self,
        phase: PhaseId,
        module: ResolvedModule,
    ) -> Result<(), PipelineError> {
        set_once(&mut self.resolved_module, module, phase, "resolved module")
    }

    pub fn set_symbols(&mut self, phase: PhaseId, symbols: SymbolTable) -> Result<(), PipelineError> {
        set_once(&mut self.symbols, symbols, phase, "symbol table")
    }

    pub fn set_ir_module(&mut self, phase: PhaseId, ir: IrModule) -> Result<(), PipelineError> {
        set_once(&mut self.ir_module, ir, phase, "IR module")
    }

    pub fn set_serialized_metadata(
        &mut self,
        phase: PhaseId,
        metadata: SerializedMetadata,
    ) -> Result<(), PipelineError> {
        set_once(&mut self.serialized_metadata, metadata, phase, "serialized metadata")
    }

    pub fn set_module_index(&mut self, phase: PhaseId, index: ModuleIndex) -> Result<(), PipelineError> {
        set_once(&mut self.module_index, index, phase, "module index")
    }

    pub fn set_artifact(&mut self, phase: PhaseId, artifact: EmittedArtifact) -> Result<(), PipelineError> {
        set_once(&mut self.artifact, artifact, phase, "bitcode artifact")
    }

    pub fn set_linked_output(&mut self, phase: PhaseId, path: PathBuf) -> Result<(), PipelineError> {
        set_once(&mut self.linked_output, path, phase, "linked output")
    }

    /// Drop the derived index ahead of an IR mutation.
    pub fn invalidate_module_index(&mut self) {
        self.module_index = None;
    }

    // ── Required reads ──

    pub fn require_resolved_module(&self, phase: PhaseId) -> Result<&ResolvedModule, PipelineError> {
        self.resolved_module
            .as_ref()
            .ok_or_else(|| missing(phase, "resolved module"))
    }

    pub fn require_ir_module(&self, phase: PhaseId) -> Result<&IrModule, PipelineError> {
        self.ir_module.as_ref().ok_or_else(|| missing(phase, "IR module"))
    }

    pub fn require_ir_module_mut(&mut self, phase: PhaseId) -> Result<&mut IrModule, PipelineError> {
        self.ir_module.as_mut().ok_or_else(|| missing(phase, "IR module"))
    }

    /// The module index, checked against the current IR generation.
    pub fn require_module_index(&self, phase: PhaseId) -> Result<&ModuleIndex, PipelineError> {
        let index = self
            .module_index
            .as_ref()
            .ok_or_else(|| missing(phase, "module index"))?;
        let ir = self.require_ir_module(phase)?;
        if !index.is_current(ir) {
            return Err(PipelineError::internal(
                phase,
                InternalErrorKind::StaleIndex,
                format!(
                    "index built for IR generation {}, module is at generation {}",
                    index.generation(),
                    ir.generation()
                ),
            ));
        }
        Ok(index)
    }

    pub fn require_artifact(&self, phase: PhaseId) -> Result<&EmittedArtifact, PipelineError> {
        self.artifact
            .as_ref()
            .ok_or_else(|| missing(phase, "bitcode artifact"))
    }

    // ── Optional reads ──

    pub fn sources(&self) -> Option<&[SourceFile]> {
        self.sources.as_deref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn resolved_module(&self) -> Option<&ResolvedModule> {
        self.resolved_module.as_ref()
    }

    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_ref()
    }

    pub fn ir_module(&self) -> Option<&IrModule> {
        self.ir_module.as_ref()
    }

    pub fn serialized_metadata(&self) -> Option<&SerializedMetadata> {
        self.serialized_metadata.as_ref()
    }

    pub fn module_index(&self) -> Option<&ModuleIndex> {
        self.module_index.as_ref()
    }

    pub fn artifact(&self) -> Option<&EmittedArtifact> {
        self.artifact.as_ref()
    }

    pub fn linked_output(&self) -> Option<&PathBuf> {
        self.linked_output.as_ref()
    }

    /// Textual dump of the state relevant after `phase`.
    pub fn dump(&self, phase: PhaseId) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== after {} ===", phase);
        match phase {
            PhaseId::Frontend => {
                let files = self.sources.as_ref().map_or(0, |s| s.len());
                let _ = writeln!(out, "sources: {}", files);
                let _ = writeln!(out, "diagnostics: {}", self.diagnostics.len());
                if let Some(module) = &self.resolved_module {
                    for g in &module.globals {
                        let _ = writeln!(out, "val {}: {} = {}", g.name, g.ty, g.value);
                    }
                    for f in &module.functions {
                        let _ = writeln!(out, "{}", f.signature());
                    }
                }
            }
            PhaseId::PsiToIr | PhaseId::Lower | PhaseId::Backend => {
                if let Some(ir) = &self.ir_module {
                    let _ = write!(out, "{}", ir);
                }
            }
            PhaseId::Serializer => match &self.serialized_metadata {
                Some(m) => {
                    let _ = writeln!(out, "{}", String::from_utf8_lossy(&m.bytes));
                    let _ = writeln!(out, "hash: {}", m.content_hash_hex());
                }
                None => out.push_str("no metadata\n"),
            },
            PhaseId::Bitcode => match &self.artifact {
                Some(a) => {
                    let _ = writeln!(out, "artifact: {} ({})", a.path.display(), a.checksum);
                }
                None => out.push_str("no artifact\n"),
            },
            PhaseId::LinkStage => match &self.linked_output {
                Some(p) => {
                    let _ = writeln!(out, "linked: {}", p.display());
                }
                None => out.push_str("no linked output\n"),
            },
        }
        out
    }
}
