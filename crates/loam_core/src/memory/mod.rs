//! # Memory Management
//!
//! Slot arenas that hand out small, stable integer handles.

mod slots;

pub use slots::{SlotArena, SlotId};
