// toolchain.rs — Collaborator interfaces used by the phase bodies
//
// The driver only sequences phases; the actual work is delegated to these
// traits. `Toolchain::reference()` wires the built-in `.src` implementations,
// tests substitute recording or faulty ones.

use std::path::{Path, PathBuf};

use crate::codegen::{BitcodeEmitter, EmittedArtifact};
use crate::config::Config;
use crate::diag::Diagnostic;
use crate::error::CollaboratorError;
use crate::index::ModuleIndex;
use crate::ir::IrModule;
use crate::link::NativeLinker;
use crate::lower::Lowerer;
use crate::resolve::{ResolvedModule, SourceAnalyzer};
use crate::serialize::{JsonMetadataSerializer, SerializedMetadata};
use crate::source::SourceFile;
use crate::symbols::SymbolTable;
use crate::target::Target;
use crate::translate::IrGenerator;

pub type CollabResult<T> = Result<T, CollaboratorError>;

/// Result of frontend analysis. `module` is `None` whenever `diagnostics`
/// contains an error.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub module: Option<ResolvedModule>,
    pub diagnostics: Vec<Diagnostic>,
}

pub trait Analyzer {
    fn analyze(&self, sources: &[SourceFile], config: &Config) -> Analysis;
}

pub trait IrTranslator {
    fn translate(&self, module: &ResolvedModule, symbols: &mut SymbolTable) -> CollabResult<IrModule>;
}

pub trait MetadataSerializer {
    /// Flag the declarations that belong in the serialized metadata.
    fn mark_declarations(&self, ir: &mut IrModule);

    fn serialize(
        &self,
        module: &ResolvedModule,
        ir: &IrModule,
        target: &Target,
    ) -> CollabResult<SerializedMetadata>;
}

pub trait Lowering {
    fn lower(&self, ir: &mut IrModule) -> CollabResult<()>;
}

pub trait Codegen {
    /// Write the artifact for `ir` into `out_dir`.
    fn emit(
        &self,
        ir: &IrModule,
        index: &ModuleIndex,
        target: &Target,
        out_dir: &Path,
    ) -> CollabResult<EmittedArtifact>;

    /// Re-read and check an emitted artifact. `Err` carries the reason.
    fn verify(&self, artifact: &EmittedArtifact) -> Result<(), String>;

    /// Human-readable form of the artifact.
    fn render(&self, artifact: &EmittedArtifact) -> CollabResult<String>;
}

pub trait Linker {
    /// Link into `out_dir` and return the path of the linked output.
    fn link(
        &self,
        artifacts: &[EmittedArtifact],
        metadata: Option<&SerializedMetadata>,
        config: &Config,
        out_dir: &Path,
    ) -> CollabResult<PathBuf>;
}

/// The collaborators for one run.
pub struct Toolchain {
    pub analyzer: Box<dyn Analyzer>,
    pub translator: Box<dyn IrTranslator>,
    pub serializer: Box<dyn MetadataSerializer>,
    pub lowering: Box<dyn Lowering>,
    pub codegen: Box<dyn Codegen>,
    pub linker: Box<dyn Linker>,
}

impl Toolchain {
    /// Built-in implementations for the `.src` language.
    pub fn reference() -> Self {
        Self {
            analyzer: Box::new(SourceAnalyzer),
            translator: Box::new(IrGenerator),
            serializer: Box::new(JsonMetadataSerializer),
            lowering: Box::new(Lowerer),
            codegen: Box::new(BitcodeEmitter),
            linker: Box::new(NativeLinker),
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::reference()
    }
}
