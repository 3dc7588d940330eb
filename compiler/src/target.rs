// target.rs — Known compilation targets
//
// The target only affects artifact headers and metadata; the bitcode format
// itself is target-independent.

use std::io::{self, Write};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: &'static str,
    pub triple: &'static str,
}

pub const KNOWN_TARGETS: &[Target] = &[
    Target {
        name: "linux_x64",
        triple: "x86_64-unknown-linux-gnu",
    },
    Target {
        name: "linux_arm64",
        triple: "aarch64-unknown-linux-gnu",
    },
    Target {
        name: "macos_x64",
        triple: "x86_64-apple-darwin",
    },
    Target {
        name: "macos_arm64",
        triple: "aarch64-apple-darwin",
    },
    Target {
        name: "mingw_x64",
        triple: "x86_64-pc-windows-gnu",
    },
    Target {
        name: "wasm32",
        triple: "wasm32-unknown-unknown",
    },
];

/// Target matching the machine the compiler runs on, if it is a known one.
pub fn host_target() -> Option<&'static Target> {
    let name = match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => "linux_x64",
        ("linux", "aarch64") => "linux_arm64",
        ("macos", "x86_64") => "macos_x64",
        ("macos", "aarch64") => "macos_arm64",
        ("windows", "x86_64") => "mingw_x64",
        _ => return None,
    };
    find_target(name)
}

pub fn find_target(name: &str) -> Option<&'static Target> {
    KNOWN_TARGETS.iter().find(|t| t.name == name)
}

/// Resolves the configured target once and answers target listings.
///
/// An unrecognised host only fails when a compilation actually needs a
/// target; listings still work.
#[derive(Debug, Clone)]
pub struct TargetManager {
    current: Option<&'static Target>,
    host: Option<&'static Target>,
}

impl TargetManager {
    /// `None` or `"host"` selects the host target.
    pub fn new(requested: Option<&str>) -> Result<Self, ConfigError> {
        Self::with_host(requested, host_target())
    }

    fn with_host(requested: Option<&str>, host: Option<&'static Target>) -> Result<Self, ConfigError> {
        let current = match requested {
            None | Some("host") => host,
            Some(name) => Some(find_target(name).ok_or_else(|| ConfigError::UnknownTarget {
                name: name.to_string(),
                available: available_names(),
            })?),
        };
        Ok(Self { current, host })
    }

    /// The selected target; fails if the host was requested but is not a
    /// known target.
    pub fn current(&self) -> Result<&'static Target, ConfigError> {
        self.current.ok_or_else(|| ConfigError::UnknownTarget {
            name: format!("host ({}-{})", std::env::consts::OS, std::env::consts::ARCH),
            available: available_names(),
        })
    }

    pub fn list(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Available targets:")?;
        for target in KNOWN_TARGETS {
            let mut marks = Vec::new();
            if Some(target) == self.host {
                marks.push("host");
            }
            if Some(target) == self.current {
                marks.push("selected");
            }
            let marks = if marks.is_empty() {
                String::new()
            } else {
                format!(" ({})", marks.join(", "))
            };
            writeln!(out, "  {:<14}{}{}", target.name, target.triple, marks)?;
        }
        Ok(())
    }
}

fn available_names() -> String {
    KNOWN_TARGETS
        .iter()
        .map(|t| t.name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_target_is_selected() {
        let targets = TargetManager::new(Some("wasm32")).unwrap();
        assert_eq!(targets.current().unwrap().triple, "wasm32-unknown-unknown");
    }

    #[test]
    fn unknown_target_lists_alternatives() {
        let err = TargetManager::new(Some("pdp11")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("pdp11"));
        assert!(msg.contains("linux_x64"));
    }

    #[test]
    fn listing_marks_selected_target() {
        let targets = TargetManager::new(Some("mingw_x64")).unwrap();
        let mut out = Vec::new();
        targets.list(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Available targets:\n"));
        assert_eq!(text.lines().count(), KNOWN_TARGETS.len() + 1);
        let line = text.lines().find(|l| l.contains("mingw_x64")).unwrap();
        assert!(line.contains("selected"), "{line}");
    }

    #[test]
    fn unrecognised_host_still_lists() {
        let targets = TargetManager::with_host(None, None).unwrap();
        let mut out = Vec::new();
        targets.list(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("selected"), "{text}");
        assert_eq!(text.lines().count(), KNOWN_TARGETS.len() + 1);

        let err = targets.current().unwrap_err();
        assert!(err.to_string().contains("host ("), "{err}");
    }

    #[test]
    fn explicit_target_overrides_unrecognised_host() {
        let targets = TargetManager::with_host(Some("linux_arm64"), None).unwrap();
        assert_eq!(targets.current().unwrap().name, "linux_arm64");
    }
}
