//! Port traits (interfaces for adapters).
//!
//! These are the contracts that external collaborators implement.
//! The engine depends on these traits, never on a concrete network adapter.

mod settlement;

pub use settlement::{Settlement, SettlementResult};
