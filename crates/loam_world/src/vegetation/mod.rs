//! # Vegetation
//!
//! Block rules that run over the live store between frames:
//!
//! - [`GrassSystem`]: sampled grass spread, revival and smothering
//! - [`LeafDecay`]: leaves without a nearby trunk fall away

pub mod grass;
pub mod leaf_decay;

pub use grass::{GrassConfig, GrassStats, GrassSystem};
pub use leaf_decay::{LeafDecay, LeafDecayConfig};
