// ABOUTME: Startup checks: the agent-deck version the backend found and which external tools are installed

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Oldest agent-deck release whose database layout orca understands.
pub const SUPPORTED_AGENT_DECK_VERSION: &str = "0.11.2";

fn default_supported() -> String {
    SUPPORTED_AGENT_DECK_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCheck {
    #[serde(default = "default_supported")]
    pub supported: String,
    pub installed: String,
}

impl VersionCheck {
    /// Installed version as reported by `agent-deck version`, without the banner.
    pub fn installed_version(&self) -> &str {
        let installed = self.installed.trim();
        installed
            .strip_prefix("Agent Deck v")
            .or_else(|| installed.strip_prefix('v'))
            .unwrap_or(installed)
    }

    /// Unparseable versions are treated as unsupported.
    pub fn is_supported(&self) -> bool {
        match (parse_version(self.installed_version()), parse_version(&self.supported)) {
            (Some(installed), Some(supported)) => installed.cmp(&supported) != Ordering::Less,
            _ => false,
        }
    }
}

fn parse_version(text: &str) -> Option<Vec<u64>> {
    let core = text.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next()?;
    core.split('.').map(|part| part.parse().ok()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub name: String,
    pub found: bool,
    /// Orca cannot manage sessions without required tools; optional ones
    /// only disable features (git for diffs, gh for issues and PRs).
    pub required: bool,
}

impl Prerequisite {
    pub fn is_blocking(&self) -> bool {
        self.required && !self.found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(installed: &str) -> VersionCheck {
        VersionCheck {
            supported: SUPPORTED_AGENT_DECK_VERSION.to_string(),
            installed: installed.to_string(),
        }
    }

    #[test]
    fn test_banner_is_stripped() {
        assert_eq!(check("Agent Deck v0.11.2").installed_version(), "0.11.2");
        assert_eq!(check("v0.12.0\n").installed_version(), "0.12.0");
        assert_eq!(check("0.11.2").installed_version(), "0.11.2");
    }

    #[test]
    fn test_version_comparison_is_numeric() {
        assert!(check("Agent Deck v0.11.2").is_supported());
        assert!(check("0.11.10").is_supported());
        assert!(check("1.0.0-beta").is_supported());
        assert!(!check("0.9.9").is_supported());
        assert!(!check("0.11.1").is_supported());
        assert!(!check("unknown").is_supported());
    }

    #[test]
    fn test_missing_supported_field_uses_builtin() {
        let parsed: VersionCheck = serde_json::from_str(r#"{"installed":"0.11.2"}"#).unwrap();
        assert_eq!(parsed.supported, SUPPORTED_AGENT_DECK_VERSION);
    }

    #[test]
    fn test_only_missing_required_tools_block() {
        let tmux = Prerequisite {
            name: "tmux".to_string(),
            found: false,
            required: true,
        };
        let gh = Prerequisite {
            name: "gh".to_string(),
            found: false,
            required: false,
        };
        assert!(tmux.is_blocking());
        assert!(!gh.is_blocking());
    }
}
