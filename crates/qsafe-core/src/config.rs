//! Configuration types for the Q-SAFE guard.

use qsafe_allowlist::ContextHash;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the guard facade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Where the allowlist artifact comes from.
    pub allowlist: AllowlistSource,

    /// What happens when a checkpoint trips a violation.
    pub violation_policy: ViolationPolicy,

    /// Emit a debug-level trace event for every accepted checkpoint.
    ///
    /// Off by default: the checkpoint path runs inside every protected
    /// function and audit events on it are strictly opt-in.
    pub audit_logging: bool,
}

/// Source of the allowlist artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AllowlistSource {
    /// Load and parse the binary artifact from a file.
    File(PathBuf),

    /// Use context hashes already in memory (embedded blob, test
    /// fixtures, hashes computed from a known-good trace).
    Inline(Vec<ContextHash>),
}

impl Default for AllowlistSource {
    fn default() -> Self {
        Self::File(PathBuf::from("./allowlist.bin"))
    }
}

/// Host policy for handling a detected CFI violation.
///
/// Either way the violating context is terminally dead; the policy only
/// decides whether the process survives long enough for the host to
/// report the violation itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationPolicy {
    /// Abort the process before the protected body of the violating
    /// checkpoint can execute. The default: by the time a violation is
    /// observed, control has already been hijacked and no further code
    /// in the process can be trusted.
    #[default]
    Abort,

    /// Return the violation outcome to the caller and leave termination
    /// to the host. The context itself still refuses all further
    /// checkpoints.
    Report,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.violation_policy, ViolationPolicy::Abort);
        assert!(!config.audit_logging);
        assert!(matches!(config.allowlist, AllowlistSource::File(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = GuardConfig {
            allowlist: AllowlistSource::Inline(vec![0x1111, 0x2222]),
            violation_policy: ViolationPolicy::Report,
            audit_logging: true,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: GuardConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.violation_policy, ViolationPolicy::Report);
        assert!(parsed.audit_logging);
        assert!(matches!(
            parsed.allowlist,
            AllowlistSource::Inline(ref hashes) if hashes == &[0x1111, 0x2222]
        ));
    }
}
