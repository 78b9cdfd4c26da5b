//! Cleanup lifecycle state of a tracked resource

use std::fmt;
use std::str::FromStr;

/// Where a resource is in the janitor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CleanupState {
    /// Discovered but not marked for cleanup
    #[default]
    Unmarked,
    /// Marked for cleanup, awaiting its expected termination time
    Marked,
    /// Terminated by the janitor
    JanitorTerminated,
    /// Terminated by its owner before the janitor acted
    UserTerminated,
}

impl CleanupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupState::Unmarked => "UNMARKED",
            CleanupState::Marked => "MARKED",
            CleanupState::JanitorTerminated => "JANITOR_TERMINATED",
            CleanupState::UserTerminated => "USER_TERMINATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNMARKED" => Some(CleanupState::Unmarked),
            "MARKED" => Some(CleanupState::Marked),
            "JANITOR_TERMINATED" => Some(CleanupState::JanitorTerminated),
            "USER_TERMINATED" => Some(CleanupState::UserTerminated),
            _ => None,
        }
    }

    /// Whether the resource no longer exists in the provider
    pub fn is_terminated(&self) -> bool {
        matches!(
            self,
            CleanupState::JanitorTerminated | CleanupState::UserTerminated
        )
    }
}

impl fmt::Display for CleanupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanupState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown cleanup state: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_names() {
        for state in [
            CleanupState::Unmarked,
            CleanupState::Marked,
            CleanupState::JanitorTerminated,
            CleanupState::UserTerminated,
        ] {
            assert_eq!(CleanupState::parse(state.as_str()), Some(state));
        }
    }

    #[test]
    fn test_terminated_states() {
        assert!(CleanupState::JanitorTerminated.is_terminated());
        assert!(CleanupState::UserTerminated.is_terminated());
        assert!(!CleanupState::Marked.is_terminated());
        assert!(!CleanupState::default().is_terminated());
    }
}
