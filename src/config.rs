//! Generation settings that are not part of the node catalog itself.
use std::collections::BTreeSet;

/// Node types the generator cannot handle yet.
pub const NOT_YET_IMPLEMENTED: &[&str] = &["ASM", "EndExcept", "EndReg"];

/// Node types whose import code is written by hand.
pub const CUSTOM_SERIALIZED: &[&str] = &["Anchor", "Block", "End", "Start", "SymConst"];

#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Skipped entirely, in addition to nodes flagged `not_yet_implemented`.
    pub not_yet_implemented: BTreeSet<String>,
    /// Left out of the import artifact, in addition to nodes flagged `custom_serializer`.
    pub custom_serialized: BTreeSet<String>,
    /// Fail the run when any attribute type has no codec.
    pub deny_unsupported: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            not_yet_implemented: NOT_YET_IMPLEMENTED.iter().map(|s| s.to_string()).collect(),
            custom_serialized: CUSTOM_SERIALIZED.iter().map(|s| s.to_string()).collect(),
            deny_unsupported: false,
        }
    }
}

impl GenConfig {
    /// A configuration with no built-in exclusions; only catalog flags apply.
    pub fn bare() -> Self {
        Self {
            not_yet_implemented: BTreeSet::new(),
            custom_serialized: BTreeSet::new(),
            deny_unsupported: false,
        }
    }

    pub fn skip(mut self, node: impl Into<String>) -> Self {
        self.not_yet_implemented.insert(node.into());
        self
    }

    pub fn custom(mut self, node: impl Into<String>) -> Self {
        self.custom_serialized.insert(node.into());
        self
    }

    pub fn deny_unsupported(mut self, deny: bool) -> Self {
        self.deny_unsupported = deny;
        self
    }
}
