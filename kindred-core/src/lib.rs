//! # Kindred Core Library
//!
//! Adaptive emotional simulation for a single character in an ongoing
//! relationship. Every character owns one instance of each component:
//!
//! - **Affect**: bounded emotion channels that drift back to baseline
//! - **Trust**: slow-to-build, fast-to-erode trust and resentment scores,
//!   plus apology bookkeeping
//! - **Memory**: capacity-bounded emotional memories with age-derived weight
//! - **Patterns**: recurring partner behavior detected over a sliding window
//! - **Reaction**: weighted choice of a reaction mode behind a hard
//!   emotional gate
//!
//! Everything is synchronous and in-memory. Time is passed in by the caller
//! wherever determinism matters, and randomness comes from a caller-supplied
//! RNG, so a run can be replayed exactly.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod affect;
pub mod character;
pub mod config;
pub mod error;
pub mod memory;
pub mod pattern;
pub mod reaction;
pub mod trust;
pub mod types;

pub use affect::{AffectDeltas, AffectState, ChannelLevels};
pub use character::{Character, CharacterSnapshot};
pub use config::KindredConfig;
pub use error::KindredError;
pub use memory::{EmotionalMemoryRecord, EmotionalMemoryStore};
pub use pattern::{BehaviorAction, DetectedPattern, PatternTracker};
pub use reaction::{Perception, ReactionDecision, ReactionMode, ReactionSelector};
pub use trust::{ApologyKind, TrustDynamics, WithdrawalLevel};
pub use types::*;
