//! Per-character aggregate and its lossless snapshot.
//!
//! A [`Character`] exclusively owns one instance of every stateful
//! component. The components never reach into each other; the few
//! cross-influences (withdrawal and negative patterns shading the reaction
//! choice, active patterns tagging new memories) are wired here.
//!
//! Snapshots carry the full internal state of each component and can be
//! encoded as JSON or MessagePack. Decoding a malformed snapshot is an
//! error. Numbers outside their bounds are clamped back in as they decode.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::affect::AffectState;
use crate::config::{KindredConfig, ReactionConfig};
use crate::error::{KindredError, Result};
use crate::memory::EmotionalMemoryStore;
use crate::pattern::{BehaviorAction, PatternTracker};
use crate::reaction::{Perception, ReactionDecision, ReactionSelector, RelationshipSignals};
use crate::trust::TrustDynamics;
use crate::types::{ContextVisibility, EmotionalImpact, MemoryId, PatternKind};

/// Full persisted state of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    /// Emotion channels.
    pub affect: AffectState,
    /// Trust, resentment and apology records.
    pub trust: TrustDynamics,
    /// Emotional memories and category totals.
    pub memory: EmotionalMemoryStore,
    /// Action log and detected patterns.
    pub patterns: PatternTracker,
}

/// One simulated character.
#[derive(Debug, Clone)]
pub struct Character {
    state: CharacterSnapshot,
    selector: ReactionSelector,
}

impl Default for Character {
    fn default() -> Self {
        Self::new(&KindredConfig::default())
    }
}

impl Character {
    /// A fresh character tuned by `config`.
    #[must_use]
    pub fn new(config: &KindredConfig) -> Self {
        Self {
            state: CharacterSnapshot {
                affect: AffectState::new(config.affect.clone()),
                trust: TrustDynamics::new(config.trust.clone()),
                memory: EmotionalMemoryStore::new(config.memory.clone()),
                patterns: PatternTracker::new(config.patterns.clone()),
            },
            selector: ReactionSelector::new(config.reaction.clone()),
        }
    }

    /// Rebuild a character from a snapshot.
    #[must_use]
    pub fn restore(snapshot: CharacterSnapshot, reaction: ReactionConfig) -> Self {
        Self {
            state: snapshot,
            selector: ReactionSelector::new(reaction),
        }
    }

    /// Copy of the full state.
    #[must_use]
    pub fn snapshot(&self) -> CharacterSnapshot {
        self.state.clone()
    }

    /// Emotion channels.
    #[must_use]
    pub fn affect(&self) -> &AffectState {
        &self.state.affect
    }

    /// Mutable emotion channels.
    pub fn affect_mut(&mut self) -> &mut AffectState {
        &mut self.state.affect
    }

    /// Trust dynamics.
    #[must_use]
    pub fn trust(&self) -> &TrustDynamics {
        &self.state.trust
    }

    /// Mutable trust dynamics.
    pub fn trust_mut(&mut self) -> &mut TrustDynamics {
        &mut self.state.trust
    }

    /// Emotional memories.
    #[must_use]
    pub fn memory(&self) -> &EmotionalMemoryStore {
        &self.state.memory
    }

    /// Mutable emotional memories.
    pub fn memory_mut(&mut self) -> &mut EmotionalMemoryStore {
        &mut self.state.memory
    }

    /// Behavior patterns.
    #[must_use]
    pub fn patterns(&self) -> &PatternTracker {
        &self.state.patterns
    }

    /// Mutable behavior patterns.
    pub fn patterns_mut(&mut self) -> &mut PatternTracker {
        &mut self.state.patterns
    }

    // ------------------------------------------------------------------
    // Turn flow
    // ------------------------------------------------------------------

    /// Log a partner action for pattern tracking.
    pub fn observe_action(&mut self, action: BehaviorAction) {
        self.state.patterns.record_action(action);
    }

    /// Remember how an exchange felt, tagged with the patterns currently
    /// detected.
    pub fn remember(
        &mut self,
        impact: EmotionalImpact,
        visibility: ContextVisibility,
        at: DateTime<Utc>,
    ) -> MemoryId {
        let active: Vec<PatternKind> = self.state.patterns.patterns().map(|p| p.kind).collect();
        self.state.memory.store(impact, visibility, active, at)
    }

    /// Relationship signals condensed from trust and patterns.
    #[must_use]
    pub fn relationship_signals(&self) -> RelationshipSignals {
        RelationshipSignals {
            withdrawal: self.state.trust.withdrawal_level(),
            negative_pattern_weight: self
                .state
                .patterns
                .strongest_negative()
                .map_or(0.0, |p| p.weight),
        }
    }

    /// Choose a reaction to `perception` and apply its affect deltas.
    pub fn react<R: Rng + ?Sized>(
        &mut self,
        perception: &Perception,
        rng: &mut R,
        at: DateTime<Utc>,
    ) -> ReactionDecision {
        let signals = self.relationship_signals();
        let decision = self
            .selector
            .decide(&self.state.affect, perception, Some(&signals), rng);
        self.state
            .affect
            .apply(decision.deltas.iter().map(|(c, d)| (*c, *d)), at);
        debug!(
            mode = %decision.mode,
            intensity = decision.intensity,
            allowed = decision.allowed_by_gate,
            "Reaction chosen"
        );
        decision
    }

    /// End-of-turn upkeep: one affect decay step.
    pub fn end_turn(&mut self) {
        self.state.affect.decay_toward_baseline();
    }

    // ------------------------------------------------------------------
    // Encodings
    // ------------------------------------------------------------------

    /// Encode the snapshot as JSON.
    ///
    /// # Errors
    /// Returns `KindredError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state).map_err(|e| KindredError::Serialization(e.to_string()))
    }

    /// Decode a JSON snapshot.
    ///
    /// # Errors
    /// Returns `KindredError::Serialization` on unknown enum values, missing
    /// fields or invalid JSON.
    pub fn from_json(json: &str, reaction: ReactionConfig) -> Result<Self> {
        let snapshot: CharacterSnapshot =
            serde_json::from_str(json).map_err(|e| KindredError::Serialization(e.to_string()))?;
        Ok(Self::restore(snapshot, reaction))
    }

    /// Encode the snapshot as MessagePack with field names.
    ///
    /// # Errors
    /// Returns `KindredError::Serialization` if encoding fails.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(&self.state).map_err(|e| KindredError::Serialization(e.to_string()))
    }

    /// Decode a MessagePack snapshot.
    ///
    /// # Errors
    /// Returns `KindredError::Serialization` if the bytes are not a valid
    /// snapshot.
    pub fn from_msgpack(bytes: &[u8], reaction: ReactionConfig) -> Result<Self> {
        let snapshot: CharacterSnapshot =
            rmp_serde::from_slice(bytes).map_err(|e| KindredError::Serialization(e.to_string()))?;
        Ok(Self::restore(snapshot, reaction))
    }
}
