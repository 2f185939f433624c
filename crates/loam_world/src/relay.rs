//! # Network Relay
//!
//! Translates between block events and the JSON messages peers exchange.
//! The transport itself is external: callers feed inbound text to
//! [`NetworkRelay::apply_remote`] and ship whatever
//! [`NetworkRelay::drain_outbound`] returns.
//!
//! ```json
//! { "x": 5, "y": 5, "z": 5, "type": "stone", "action": "add" }
//! ```
//!
//! Only `Local` changes go out, so a remote edit is never echoed back.
//! The outbound queue holds at most [`MAX_OUTBOUND`] messages; when nobody
//! drains it the oldest are discarded and counted.

use std::collections::VecDeque;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use loam_core::{BlockPos, BlockType};

use crate::error::{RelayError, RelayResult};
use crate::events::{BlockAction, BlockEvent, ChangeOrigin};
use crate::store::BlockStore;

/// Outbound messages kept between drains.
pub const MAX_OUTBOUND: usize = 4096;

/// One block change on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUpdateMessage {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
    /// Block type name; required for `add`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    /// Add or remove.
    pub action: BlockAction,
}

impl BlockUpdateMessage {
    /// Message describing `event`.
    #[must_use]
    pub fn from_event(event: &BlockEvent) -> Self {
        Self {
            x: event.pos.x,
            y: event.pos.y,
            z: event.pos.z,
            block: Some(event.block.name().to_owned()),
            action: event.action,
        }
    }

    /// Target coordinate.
    #[must_use]
    pub const fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}

/// Relay counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Inbound messages that changed the world.
    pub applied: u64,
    /// Inbound messages that were valid but changed nothing.
    pub ignored: u64,
    /// Inbound messages rejected as malformed.
    pub dropped: u64,
    /// Outbound messages produced.
    pub sent: u64,
    /// Outbound messages discarded because the queue was full.
    pub overflowed: u64,
}

/// Bridges the block store and an external transport.
#[derive(Debug)]
pub struct NetworkRelay {
    events: Receiver<BlockEvent>,
    outbound: VecDeque<BlockUpdateMessage>,
    limit: usize,
    stats: RelayStats,
}

impl NetworkRelay {
    /// Subscribes to `store`, queueing up to [`MAX_OUTBOUND`] messages.
    pub fn new(store: &mut BlockStore) -> Self {
        Self::with_outbound_limit(store, MAX_OUTBOUND)
    }

    /// Subscribes to `store`, queueing up to `limit` messages (at least 1).
    pub fn with_outbound_limit(store: &mut BlockStore, limit: usize) -> Self {
        Self {
            events: store.subscribe(),
            outbound: VecDeque::new(),
            limit: limit.max(1),
            stats: RelayStats::default(),
        }
    }

    /// Messages waiting for [`drain_outbound`](Self::drain_outbound).
    #[must_use]
    pub fn pending_outbound(&self) -> usize {
        self.outbound.len()
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Parses one inbound message.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, a coordinate outside the world,
    /// an `add` without a type, or an unknown type name.
    pub fn parse(text: &str) -> RelayResult<(BlockPos, BlockAction, Option<BlockType>)> {
        let message: BlockUpdateMessage =
            serde_json::from_str(text).map_err(|e| RelayError::Malformed(e.to_string()))?;
        if !message.pos().in_world() {
            return Err(RelayError::OutOfWorld {
                x: message.x,
                y: message.y,
                z: message.z,
            });
        }
        let block = message
            .block
            .as_deref()
            .map(str::parse::<BlockType>)
            .transpose()?;
        if message.action == BlockAction::Add && block.is_none() {
            return Err(RelayError::MissingType {
                x: message.x,
                y: message.y,
                z: message.z,
            });
        }
        Ok((message.pos(), message.action, block))
    }

    /// Applies an inbound message as a `Remote` change. Returns whether
    /// the world changed.
    ///
    /// # Errors
    ///
    /// Returns the parse error; the message is dropped and counted.
    pub fn apply_remote(&mut self, store: &mut BlockStore, text: &str) -> RelayResult<bool> {
        let (pos, action, block) = match Self::parse(text) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.stats.dropped += 1;
                tracing::warn!("Dropping block update: {}", e);
                return Err(e);
            }
        };
        let changed = store.with_origin(ChangeOrigin::Remote, |s| match (action, block) {
            (BlockAction::Add, Some(block)) => s.add(pos, block),
            (BlockAction::Remove, _) => s.remove(pos).is_some(),
            (BlockAction::Add, None) => false,
        });
        if changed {
            self.stats.applied += 1;
        } else {
            self.stats.ignored += 1;
        }
        Ok(changed)
    }

    /// Turns pending `Local` events into outbound messages, discarding the
    /// oldest once the queue is full.
    pub fn collect(&mut self) {
        let mut discarded = 0;
        while let Ok(event) = self.events.try_recv() {
            if event.origin != ChangeOrigin::Local {
                continue;
            }
            if self.outbound.len() >= self.limit {
                self.outbound.pop_front();
                discarded += 1;
            }
            self.outbound.push_back(BlockUpdateMessage::from_event(&event));
        }
        if discarded > 0 {
            if self.stats.overflowed == 0 {
                tracing::warn!("Outbound block updates are not being drained; discarding oldest");
            }
            self.stats.overflowed += discarded;
        }
    }

    /// Outbound messages as JSON, oldest first.
    pub fn drain_outbound(&mut self) -> Vec<String> {
        self.collect();
        let messages = std::mem::take(&mut self.outbound);
        let mut out = Vec::with_capacity(messages.len());
        for message in &messages {
            match serde_json::to_string(message) {
                Ok(text) => out.push(text),
                Err(e) => tracing::error!("Cannot encode block update: {}", e),
            }
        }
        self.stats.sent += out.len() as u64;
        out
    }
}
