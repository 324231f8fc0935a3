use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a timer within one workflow.
///
/// Assigned at request time from a per-workflow counter: the ids form the
/// sequence `"0"`, `"1"`, `"2"`, … in the order the timers were started.
/// Stored as the wire string so ingress ids compare without parsing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(String);

impl TimerId {
    /// The id for the `seq`-th timer started by a workflow (0-based).
    pub fn from_seq(seq: u64) -> Self {
        Self(seq.to_string())
    }

    /// Wrap an id exactly as it appeared on the wire.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_render_as_decimal_strings() {
        assert_eq!(TimerId::from_seq(0).as_str(), "0");
        assert_eq!(TimerId::from_seq(1).as_str(), "1");
        assert_eq!(TimerId::from_seq(42).as_str(), "42");
    }

    #[test]
    fn wire_ids_compare_with_assigned_ids() {
        assert_eq!(TimerId::new("0"), TimerId::from_seq(0));
        assert_ne!(TimerId::new("00"), TimerId::from_seq(0));
    }
}
