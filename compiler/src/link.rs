// link.rs — Link stage: turn emitted artifacts into the final output
//
// `program` output is an image with an entry line followed by the bitcode of
// every artifact. `library` output is a JSON bundle of the artifacts and the
// serialized metadata.
//
// Preconditions: every artifact passes `verify_bitcode`.
// Postconditions: the linked output exists inside `out_dir`.
// Failure modes: no artifacts, missing `main` for programs, I/O errors.
// Side effects: writes one file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codegen::{verify_bitcode, EmittedArtifact};
use crate::config::{Config, OutputKind};
use crate::error::CollaboratorError;
use crate::index::ENTRY_POINT;
use crate::serialize::SerializedMetadata;
use crate::toolchain::{CollabResult, Linker};

pub const IMAGE_MAGIC: &str = "; ncc-image 1";
pub const LIBRARY_FORMAT: &str = "ncc-library";

#[derive(Debug, Serialize)]
struct LibraryBundle<'a> {
    format: &'static str,
    version: u32,
    module: &'a str,
    target: &'a str,
    artifacts: Vec<BundledArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata_hash: Option<String>,
}

#[derive(Debug, Serialize)]
struct BundledArtifact {
    module: String,
    checksum: String,
    bitcode: String,
}

#[derive(Debug, Default)]
pub struct NativeLinker;

impl Linker for NativeLinker {
    fn link(
        &self,
        artifacts: &[EmittedArtifact],
        metadata: Option<&SerializedMetadata>,
        config: &Config,
        out_dir: &Path,
    ) -> CollabResult<PathBuf> {
        let first = artifacts
            .first()
            .ok_or_else(|| CollaboratorError::Link("no artifacts to link".into()))?;
        let file_name = config
            .output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "a.out".into());
        let dest = out_dir.join(file_name);

        let mut texts = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            texts.push(std::fs::read_to_string(&artifact.path)?);
        }

        match config.output_kind {
            OutputKind::Program => {
                let mut has_entry = false;
                for (artifact, text) in artifacts.iter().zip(&texts) {
                    let summary = verify_bitcode(text).map_err(|e| {
                        CollaboratorError::Link(format!("{}: {}", artifact.path.display(), e))
                    })?;
                    has_entry |= summary.has_entry_point();
                }
                if !has_entry {
                    return Err(CollaboratorError::Link(format!(
                        "undefined entry point: a program needs `fun {}()` with no parameters",
                        ENTRY_POINT
                    )));
                }
                let mut image = format!(
                    "{}\n; target {}\n; entry @{}\n",
                    IMAGE_MAGIC, first.target, ENTRY_POINT
                );
                for text in &texts {
                    image.push_str(text);
                }
                std::fs::write(&dest, image)?;
            }
            OutputKind::Library => {
                let metadata_value = match metadata {
                    Some(m) => Some(serde_json::from_slice(&m.bytes)?),
                    None => None,
                };
                let bundle = LibraryBundle {
                    format: LIBRARY_FORMAT,
                    version: 1,
                    module: &first.module,
                    target: &first.target,
                    artifacts: artifacts
                        .iter()
                        .zip(texts)
                        .map(|(a, bitcode)| BundledArtifact {
                            module: a.module.clone(),
                            checksum: a.checksum.clone(),
                            bitcode,
                        })
                        .collect(),
                    metadata: metadata_value,
                    metadata_hash: metadata.map(|m| m.content_hash_hex()),
                };
                std::fs::write(&dest, serde_json::to_vec_pretty(&bundle)?)?;
            }
        }
        tracing::debug!(output = %dest.display(), kind = ?config.output_kind, "linked output");
        Ok(dest)
    }
}
