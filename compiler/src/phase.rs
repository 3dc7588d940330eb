// phase.rs — Phase descriptors and the configured phase registry
//
// Declares the pipeline's phases, their nesting, and the per-run settings
// (enabled, verbose) resolved from `Config`. The registry is an explicit
// value handed to the PhaseManager; there is no process-wide phase state.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use crate::config::Config;
use crate::error::ConfigError;

// ── Phase identifiers ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhaseId {
    Frontend,
    PsiToIr,
    Serializer,
    Backend,
    Lower,
    Bitcode,
    LinkStage,
}

/// All phases in declared (execution) order; children follow their parent.
pub const ALL_PHASES: [PhaseId; 7] = [
    PhaseId::Frontend,
    PhaseId::PsiToIr,
    PhaseId::Serializer,
    PhaseId::Backend,
    PhaseId::Lower,
    PhaseId::Bitcode,
    PhaseId::LinkStage,
];

impl PhaseId {
    pub fn name(self) -> &'static str {
        descriptor(self).name
    }

    pub fn from_name(name: &str) -> Option<PhaseId> {
        ALL_PHASES
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn parent(self) -> Option<PhaseId> {
        descriptor(self).parent
    }

    /// Nesting depth: 0 for top-level phases.
    pub fn depth(self) -> usize {
        let mut depth = 0;
        let mut cur = self.parent();
        while let Some(p) = cur {
            depth += 1;
            cur = p.parent();
        }
        depth
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ── Phase descriptor ────────────────────────────────────────────────────────

/// Static metadata about a phase.
#[derive(Debug, Clone)]
pub struct PhaseDescriptor {
    pub id: PhaseId,
    /// Name accepted by `--enable-phase` and friends.
    pub name: &'static str,
    pub description: &'static str,
    /// A child only runs inside its parent's body.
    pub parent: Option<PhaseId>,
    pub enabled_by_default: bool,
}

/// Return the static descriptor for a given phase.
pub fn descriptor(id: PhaseId) -> PhaseDescriptor {
    match id {
        PhaseId::Frontend => PhaseDescriptor {
            id,
            name: "frontend",
            description: "Frontend analysis and type checking",
            parent: None,
            enabled_by_default: true,
        },
        PhaseId::PsiToIr => PhaseDescriptor {
            id,
            name: "psi_to_ir",
            description: "Translate the resolved syntax tree to IR",
            parent: None,
            enabled_by_default: true,
        },
        PhaseId::Serializer => PhaseDescriptor {
            id,
            name: "serializer",
            description: "Serialize exported declaration metadata",
            parent: None,
            enabled_by_default: true,
        },
        PhaseId::Backend => PhaseDescriptor {
            id,
            name: "backend",
            description: "All backend phases",
            parent: None,
            enabled_by_default: true,
        },
        PhaseId::Lower => PhaseDescriptor {
            id,
            name: "lower",
            description: "IR lowering and module indexing",
            parent: Some(PhaseId::Backend),
            enabled_by_default: true,
        },
        PhaseId::Bitcode => PhaseDescriptor {
            id,
            name: "bitcode",
            description: "Emit bitcode and write it to the output stage",
            parent: Some(PhaseId::Backend),
            enabled_by_default: true,
        },
        PhaseId::LinkStage => PhaseDescriptor {
            id,
            name: "link_stage",
            description: "Link the emitted artifacts into the final output",
            parent: None,
            enabled_by_default: true,
        },
    }
}

// ── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSettings {
    pub enabled: bool,
    pub verbose: bool,
}

/// Phase settings resolved once from configuration, read-only afterwards.
#[derive(Debug, Clone)]
pub struct PhaseRegistry {
    settings: BTreeMap<PhaseId, PhaseSettings>,
    time_phases: bool,
}

impl Default for PhaseRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PhaseRegistry {
    pub fn with_defaults() -> Self {
        let settings = ALL_PHASES
            .iter()
            .map(|&id| {
                (
                    id,
                    PhaseSettings {
                        enabled: descriptor(id).enabled_by_default,
                        verbose: false,
                    },
                )
            })
            .collect();
        Self {
            settings,
            time_phases: false,
        }
    }

    /// Resolve phase settings from `config`.
    ///
    /// Disabled phases are applied first and enabled phases second, so an
    /// explicit enable overrides a disable coming from a config file.
    pub fn configure(config: &Config) -> Result<Self, ConfigError> {
        let mut registry = Self::with_defaults();
        for name in &config.disabled_phases {
            registry.settings_mut(name)?.enabled = false;
        }
        for name in &config.enabled_phases {
            registry.settings_mut(name)?.enabled = true;
        }
        for name in &config.verbose_phases {
            registry.settings_mut(name)?.verbose = true;
        }
        registry.time_phases = config.time_phases;
        Ok(registry)
    }

    fn settings_mut(&mut self, name: &str) -> Result<&mut PhaseSettings, ConfigError> {
        let id = PhaseId::from_name(name).ok_or_else(|| ConfigError::UnknownPhase(name.to_string()))?;
        self.settings
            .get_mut(&id)
            .ok_or_else(|| ConfigError::UnknownPhase(name.to_string()))
    }

    pub fn settings(&self, id: PhaseId) -> PhaseSettings {
        self.settings.get(&id).copied().unwrap_or(PhaseSettings {
            enabled: descriptor(id).enabled_by_default,
            verbose: false,
        })
    }

    pub fn is_enabled(&self, id: PhaseId) -> bool {
        self.settings(id).enabled
    }

    pub fn is_verbose(&self, id: PhaseId) -> bool {
        self.settings(id).verbose
    }

    pub fn time_phases(&self) -> bool {
        self.time_phases
    }

    /// Print every phase with its description and state, children indented
    /// under their parent.
    pub fn list(&self, out: &mut dyn Write) -> io::Result<()> {
        for id in ALL_PHASES {
            let desc = descriptor(id);
            let indent = "  ".repeat(id.depth());
            let state = if self.is_enabled(id) {
                "(Enabled)"
            } else {
                "(Disabled)"
            };
            writeln!(
                out,
                "{:<20} {:<50} {}",
                format!("{}{}:", indent, desc.name),
                desc.description,
                state
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for id in ALL_PHASES {
            assert_eq!(PhaseId::from_name(id.name()), Some(id));
        }
        assert_eq!(PhaseId::from_name("LINK_STAGE"), Some(PhaseId::LinkStage));
        assert_eq!(PhaseId::from_name("optimize"), None);
    }

    #[test]
    fn children_follow_their_parent_in_declared_order() {
        for (pos, id) in ALL_PHASES.iter().enumerate() {
            if let Some(parent) = id.parent() {
                let parent_pos = ALL_PHASES.iter().position(|p| *p == parent).unwrap();
                assert!(parent_pos < pos, "{id} declared before its parent {parent}");
            }
        }
        assert_eq!(PhaseId::Lower.depth(), 1);
        assert_eq!(PhaseId::Backend.depth(), 0);
    }

    #[test]
    fn everything_is_enabled_by_default() {
        let registry = PhaseRegistry::with_defaults();
        assert!(ALL_PHASES.iter().all(|p| registry.is_enabled(*p)));
        assert!(!registry.time_phases());
    }

    #[test]
    fn configure_applies_enable_after_disable() {
        let config = Config {
            disabled_phases: vec!["serializer".into(), "link_stage".into()],
            enabled_phases: vec!["link_stage".into()],
            verbose_phases: vec!["lower".into()],
            ..Config::default()
        };
        let registry = PhaseRegistry::configure(&config).unwrap();
        assert!(!registry.is_enabled(PhaseId::Serializer));
        assert!(registry.is_enabled(PhaseId::LinkStage));
        assert!(registry.is_verbose(PhaseId::Lower));
        assert!(!registry.is_verbose(PhaseId::Bitcode));
    }

    #[test]
    fn unknown_phase_is_config_error() {
        let config = Config {
            disabled_phases: vec!["optimize".into()],
            ..Config::default()
        };
        let err = PhaseRegistry::configure(&config).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPhase(ref n) if n == "optimize"));
    }

    #[test]
    fn listing_indents_children_and_shows_state() {
        let config = Config {
            disabled_phases: vec!["bitcode".into()],
            ..Config::default()
        };
        let registry = PhaseRegistry::configure(&config).unwrap();
        let mut out = Vec::new();
        registry.list(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), ALL_PHASES.len());
        assert!(lines[0].starts_with("frontend:"));
        assert!(lines[4].starts_with("  lower:"));
        assert!(lines[5].starts_with("  bitcode:"));
        assert!(lines[5].ends_with("(Disabled)"));
        assert!(lines[6].ends_with("(Enabled)"));
    }
}
