// config.rs — Recognised options for one compilation run
//
// `Config` is built once (from the CLI, optionally layered over a TOML file)
// and never mutated afterwards. The phase registry and target manager are
// derived from it before the first phase runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Linked program image with an entry point.
    #[default]
    Program,
    /// Bundle of bitcode and exported metadata.
    Library,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Source roots: files, or directories searched for `*.src`.
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
    pub output_kind: OutputKind,
    /// Defaults to the output file stem.
    pub module_name: Option<String>,
    /// Target name; `None` or `host` selects the host target.
    pub target: Option<String>,
    pub enabled_phases: Vec<String>,
    pub disabled_phases: Vec<String>,
    /// Phases whose resulting state is dumped after they complete.
    pub verbose_phases: Vec<String>,
    pub list_targets: bool,
    pub list_phases: bool,
    pub print_bitcode: bool,
    /// Also re-validate the IR after SERIALIZER marks declarations; the
    /// checkpoints after PSI_TO_IR and LOWER run regardless.
    pub verify: bool,
    pub time_phases: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            output: PathBuf::from("a.out"),
            output_kind: OutputKind::default(),
            module_name: None,
            target: None,
            enabled_phases: Vec::new(),
            disabled_phases: Vec::new(),
            verbose_phases: Vec::new(),
            list_targets: false,
            list_phases: false,
            print_bitcode: false,
            verify: false,
            time_phases: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Module name used for IR, metadata and bitcode headers.
    pub fn effective_module_name(&self) -> String {
        if let Some(name) = &self.module_name {
            return name.clone();
        }
        self.output
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("main")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.sources.is_empty());
        assert_eq!(config.output, PathBuf::from("a.out"));
        assert_eq!(config.output_kind, OutputKind::Program);
        assert_eq!(config.effective_module_name(), "a");
    }

    #[test]
    fn toml_round_trip_of_recognised_options() {
        let config = Config::from_toml_str(
            r#"
            sources = ["src", "extra.src"]
            output = "build/libdemo.nlib"
            output_kind = "library"
            module_name = "demo"
            target = "wasm32"
            disabled_phases = ["serializer"]
            verbose_phases = ["lower"]
            print_bitcode = true
            verify = true
            "#,
        )
        .unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.output_kind, OutputKind::Library);
        assert_eq!(config.effective_module_name(), "demo");
        assert_eq!(config.target.as_deref(), Some("wasm32"));
        assert_eq!(config.disabled_phases, vec!["serializer"]);
        assert!(config.print_bitcode && config.verify);
        assert!(!config.list_phases);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("optimise = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load(Path::new("/no/such/ncc.toml")).unwrap_err();
        assert!(err.to_string().contains("/no/such/ncc.toml"));
    }
}
