//! Immutable captures of entity positions.

use std::sync::Arc;

use crate::entity::{Entity, Position};
use crate::id::{EngineGeneration, TickId};

/// Positions of every entity at one completed tick.
///
/// The position list is shared behind an `Arc`, so cloning a snapshot
/// (for example when a pipe hands it to a consumer) never copies the
/// entity data. A snapshot is only ever built from a finished update,
/// never from an engine mid-step.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    generation: EngineGeneration,
    tick: TickId,
    positions: Arc<[Position]>,
}

impl Snapshot {
    /// Capture the positions of `entities` in order.
    pub fn capture(generation: EngineGeneration, tick: TickId, entities: &[Entity]) -> Self {
        Self {
            generation,
            tick,
            positions: entities.iter().map(Entity::position).collect(),
        }
    }

    /// Build a snapshot directly from a position list.
    pub fn from_positions(
        generation: EngineGeneration,
        tick: TickId,
        positions: impl Into<Arc<[Position]>>,
    ) -> Self {
        Self {
            generation,
            tick,
            positions: positions.into(),
        }
    }

    /// The engine instance that produced this snapshot.
    pub fn generation(&self) -> EngineGeneration {
        self.generation
    }

    /// The tick at which this snapshot was captured (0 = just reset).
    pub fn tick_id(&self) -> TickId {
        self.tick
    }

    /// Entity positions, in engine order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of entities captured.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the snapshot holds no entities.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// Compile-time assertion: snapshots cross thread boundaries via the pipe.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Snapshot>();
};
