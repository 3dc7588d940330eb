// serialize.rs — Exported declaration metadata
//
// Marks the declarations that belong to the module's public surface and
// serializes them to JSON together with a SHA-256 content hash.
//
// A global is part of the metadata when it is public, or when a public
// function loads it (its backing value must travel with the function).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ir::{IrModule, Op};
use crate::resolve::ResolvedModule;
use crate::target::Target;
use crate::toolchain::{CollabResult, MetadataSerializer};

pub const METADATA_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub format_version: u32,
    pub module: String,
    pub target: String,
    pub compiler_version: String,
    pub declarations: Vec<DeclarationMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationMetadata {
    pub name: String,
    pub kind: String,
    pub signature: String,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

/// Serialized metadata bytes; immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedMetadata {
    pub bytes: Vec<u8>,
    pub content_hash: [u8; 32],
}

impl SerializedMetadata {
    pub fn new(bytes: Vec<u8>) -> Self {
        let content_hash = sha256(&bytes);
        Self {
            bytes,
            content_hash,
        }
    }

    /// Hex string of the content hash (64 characters).
    pub fn content_hash_hex(&self) -> String {
        bytes_to_hex(&self.content_hash)
    }

    pub fn decode(&self) -> Result<ModuleMetadata, serde_json::Error> {
        serde_json::from_slice(&self.bytes)
    }
}

pub(crate) fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

pub(crate) fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

#[derive(Debug, Default)]
pub struct JsonMetadataSerializer;

impl MetadataSerializer for JsonMetadataSerializer {
    fn mark_declarations(&self, ir: &mut IrModule) {
        mark_declarations(ir);
    }

    fn serialize(
        &self,
        module: &ResolvedModule,
        ir: &IrModule,
        target: &Target,
    ) -> CollabResult<SerializedMetadata> {
        let metadata = build_metadata(module, ir, target);
        let bytes = serde_json::to_vec_pretty(&metadata)?;
        let serialized = SerializedMetadata::new(bytes);
        tracing::debug!(
            declarations = metadata.declarations.len(),
            hash = %serialized.content_hash_hex(),
            "serialized module metadata"
        );
        Ok(serialized)
    }
}

/// Set `in_metadata` on every declaration that belongs to the public surface.
pub fn mark_declarations(ir: &mut IrModule) {
    let mut backing = HashSet::new();
    for function in ir.functions.iter_mut() {
        function.in_metadata = function.exported;
        if !function.exported {
            continue;
        }
        for instr in &function.body {
            if let Op::LoadGlobal(symbol) = instr.op {
                backing.insert(symbol);
            }
        }
    }
    for global in ir.globals.iter_mut() {
        global.in_metadata = global.exported || backing.contains(&global.symbol);
    }
}

pub fn build_metadata(module: &ResolvedModule, ir: &IrModule, target: &Target) -> ModuleMetadata {
    let mut declarations = Vec::new();
    for global in ir.globals.iter().filter(|g| g.in_metadata) {
        let ty = module
            .globals
            .iter()
            .find(|g| g.name == global.name)
            .map_or_else(|| "Int".to_string(), |g| g.ty.to_string());
        declarations.push(DeclarationMetadata {
            name: global.name.clone(),
            kind: "val".into(),
            signature: format!("val {}: {}", global.name, ty),
            public: global.exported,
            value: Some(global.value),
        });
    }
    for function in ir.functions.iter().filter(|f| f.in_metadata) {
        let signature = module
            .functions
            .iter()
            .find(|f| f.name == function.name)
            .map_or_else(|| format!("fun {}", function.name), |f| f.signature());
        declarations.push(DeclarationMetadata {
            name: function.name.clone(),
            kind: "fun".into(),
            signature,
            public: function.exported,
            value: None,
        });
    }
    ModuleMetadata {
        format_version: METADATA_FORMAT_VERSION,
        module: ir.name.clone(),
        target: target.name.to_string(),
        compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        declarations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FileId;
    use crate::resolve::analyze_sources;
    use crate::source::SourceFile;
    use crate::symbols::SymbolTable;
    use crate::target::find_target;
    use crate::translate::translate_module;

    fn pipeline(text: &str) -> (ResolvedModule, IrModule) {
        let analysis = analyze_sources(&[SourceFile::new(FileId(0), "m.src", text)], "m");
        let module = analysis.module.unwrap();
        let ir = translate_module(&module, &mut SymbolTable::new()).unwrap();
        (module, ir)
    }

    #[test]
    fn backing_globals_of_exported_functions_are_marked() {
        let (_, mut ir) = pipeline(
            "val scale: Int = 3;\n\
             val unused: Int = 9;\n\
             pub val limit: Int = 10;\n\
             pub fun scaled(x: Int): Int { return x * scale; }\n\
             fun main() { print scaled(2); }\n",
        );
        mark_declarations(&mut ir);
        assert!(ir.global_by_name("scale").unwrap().in_metadata);
        assert!(!ir.global_by_name("unused").unwrap().in_metadata);
        assert!(ir.global_by_name("limit").unwrap().in_metadata);
        assert!(ir.function_by_name("scaled").unwrap().in_metadata);
        assert!(!ir.function_by_name("main").unwrap().in_metadata);
    }

    #[test]
    fn serialized_metadata_decodes_and_hashes() {
        let (module, mut ir) = pipeline("pub fun id(x: Int): Int { return x; }");
        mark_declarations(&mut ir);
        let target = find_target("linux_x64").unwrap();
        let serialized = JsonMetadataSerializer.serialize(&module, &ir, target).unwrap();
        assert_eq!(serialized.content_hash_hex().len(), 64);
        assert_eq!(serialized.content_hash, sha256(&serialized.bytes));
        let decoded = serialized.decode().unwrap();
        assert_eq!(decoded.module, "m");
        assert_eq!(decoded.target, "linux_x64");
        assert_eq!(decoded.declarations.len(), 1);
        assert_eq!(decoded.declarations[0].signature, "fun id(Int): Int");
    }
}
