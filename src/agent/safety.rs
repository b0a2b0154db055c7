//! Safety Gate
//!
//! Allowlist-based guard preventing unrestricted command execution.
//! Prefix matching is intentionally coarse: it blocks the most dangerous
//! unscoped invocations, it does not parse the command.

/// Verdict of the safety gate for one command string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
}

/// Stateless evaluator over a configured set of literal prefixes.
#[derive(Clone, Debug)]
pub struct SafetyGate {
    prefixes: Vec<String>,
}

impl SafetyGate {
    /// Build a gate from configured allowlist prefixes. Prefixes are
    /// normalized once so evaluation is a plain starts_with scan.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Allow iff the trimmed, lowercased command starts with any configured
    /// prefix. An empty command matches nothing and is denied.
    pub fn evaluate(&self, command: &str) -> Verdict {
        let normalized = command.trim().to_lowercase();
        if normalized.is_empty() {
            return Verdict::Deny;
        }
        if self.prefixes.iter().any(|p| normalized.starts_with(p)) {
            Verdict::Allow
        } else {
            Verdict::Deny
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SAFE_PREFIXES;

    fn default_gate() -> SafetyGate {
        SafetyGate::new(DEFAULT_SAFE_PREFIXES.iter().copied())
    }

    #[test]
    fn test_allows_configured_prefix() {
        assert_eq!(default_gate().evaluate("mkdir projects"), Verdict::Allow);
    }

    #[test]
    fn test_denies_unlisted_command() {
        assert_eq!(default_gate().evaluate("rm -rf /"), Verdict::Deny);
    }

    #[test]
    fn test_empty_command_denied() {
        assert_eq!(default_gate().evaluate(""), Verdict::Deny);
        assert_eq!(default_gate().evaluate("   "), Verdict::Deny);
    }

    #[test]
    fn test_exact_prefix_no_trailing_text_allowed() {
        assert_eq!(default_gate().evaluate("python"), Verdict::Allow);
    }

    #[test]
    fn test_prefix_mid_string_denied() {
        // The prefix must be at the start, not embedded.
        assert_eq!(default_gate().evaluate("sudo mkdir /etc/x"), Verdict::Deny);
    }

    #[test]
    fn test_normalization_trims_and_lowercases() {
        assert_eq!(default_gate().evaluate("  MKDIR out  "), Verdict::Allow);
        assert_eq!(default_gate().evaluate("Pip Install numpy"), Verdict::Allow);
    }

    #[test]
    fn test_empty_allowlist_denies_everything() {
        let gate = SafetyGate::new(Vec::<String>::new());
        assert_eq!(gate.evaluate("echo hi"), Verdict::Deny);
    }
}
