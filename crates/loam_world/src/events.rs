//! # Block Change Events
//!
//! Every `add` and `remove` on the block store is published, in mutation
//! order, to each subscriber's channel.
//!
//! ```text
//! BlockStore ──publish──> EventHub ──┬──> NetworkRelay  (Local only)
//!                                    └──> LeafDecay     (removals)
//! ```

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use loam_core::{BlockPos, BlockType};

/// What happened to a coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockAction {
    /// A block was placed.
    Add,
    /// A block was removed.
    Remove,
}

/// Who caused a change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// Edits and simulation on this side. Relayed to peers.
    #[default]
    Local,
    /// Chunk loading. Never relayed.
    Generation,
    /// Applied from a peer. Never relayed back.
    Remote,
}

/// A single block change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockEvent {
    /// Coordinate that changed.
    pub pos: BlockPos,
    /// Block added or removed.
    pub block: BlockType,
    /// Add or remove.
    pub action: BlockAction,
    /// Cause of the change.
    pub origin: ChangeOrigin,
}

/// Fan-out of block events to any number of subscribers.
///
/// Dropped receivers are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: Vec<Sender<BlockEvent>>,
}

impl EventHub {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Opens a new subscription.
    pub fn subscribe(&mut self) -> Receiver<BlockEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers `event` to every subscriber.
    pub fn publish(&mut self, event: BlockEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
