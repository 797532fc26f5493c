//! Strongly-typed identifiers for ticks and engine instances.

use std::fmt;

/// Monotonically increasing tick counter within one engine instance.
///
/// `TickId(0)` marks the initial state published by a reset; each
/// completed update advances it by one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl TickId {
    /// The tick following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies one constructed simulation engine.
///
/// Incremented every time a reset builds a fresh engine. Every snapshot
/// carries the generation that produced it, so consumers can tell the
/// state of a discarded engine apart from the state of its replacement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineGeneration(pub u64);

impl EngineGeneration {
    /// The generation that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EngineGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EngineGeneration {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
