// ncc — phased compilation pipeline
//
// Library root. The driver sequences phases through the PhaseManager; the
// reference collaborators (lexer through linker) compile the `.src` language.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod diag;
pub mod driver;
pub mod error;
pub mod id;
pub mod index;
pub mod ir;
pub mod lexer;
pub mod link;
pub mod lower;
pub mod output;
pub mod parser;
pub mod phase;
pub mod phase_manager;
pub mod resolve;
pub mod serialize;
pub mod source;
pub mod state;
pub mod symbols;
pub mod target;
pub mod toolchain;
pub mod translate;
pub mod validate;
