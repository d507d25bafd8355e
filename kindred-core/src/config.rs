//! Configuration for the kindred engine.
//!
//! Maps directly to `kindred.toml`. Every section is optional; missing keys
//! fall back to the tuning the engine shipped with.

use serde::{Deserialize, Serialize};

use crate::types::AffectChannel;

/// Top-level kindred configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindredConfig {
    /// Affect channel starting values, baselines and decay.
    #[serde(default)]
    pub affect: AffectConfig,
    /// Trust and resentment dynamics.
    #[serde(default)]
    pub trust: TrustConfig,
    /// Emotional memory capacity and decay.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Behavior pattern detection.
    #[serde(default)]
    pub patterns: PatternConfig,
    /// Reaction mode selection.
    #[serde(default)]
    pub reaction: ReactionConfig,
}

impl KindredConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `KindredError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::KindredError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Affect
// ---------------------------------------------------------------------------

/// Tuning for a single affect channel. All values in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Value a fresh character starts with.
    pub initial: f32,
    /// Resting value decay pulls toward.
    pub baseline: f32,
    /// Maximum movement toward baseline per decay step.
    pub decay_rate: f32,
}

impl ChannelConfig {
    const fn new(initial: f32, baseline: f32, decay_rate: f32) -> Self {
        Self {
            initial,
            baseline,
            decay_rate,
        }
    }
}

/// Per-channel affect tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectConfig {
    /// Anger fades moderately.
    #[serde(default = "default_anger")]
    pub anger: ChannelConfig,
    /// Stress fades slowly.
    #[serde(default = "default_stress")]
    pub stress: ChannelConfig,
    /// Fatigue fades very slowly.
    #[serde(default = "default_fatigue")]
    pub fatigue: ChannelConfig,
    /// Trust rebuilds very slowly.
    #[serde(default = "default_trust_channel")]
    pub trust: ChannelConfig,
    /// Empathy recovers slowly.
    #[serde(default = "default_empathy")]
    pub empathy: ChannelConfig,
    /// Hurt fades moderately.
    #[serde(default = "default_hurt")]
    pub hurt: ChannelConfig,
    /// Affection barely moves.
    #[serde(default = "default_affection")]
    pub affection: ChannelConfig,
    /// Composure returns at a steady pace.
    #[serde(default = "default_calm")]
    pub calm: ChannelConfig,
}

impl AffectConfig {
    /// Tuning for one channel.
    #[must_use]
    pub fn channel(&self, channel: AffectChannel) -> &ChannelConfig {
        match channel {
            AffectChannel::Anger => &self.anger,
            AffectChannel::Stress => &self.stress,
            AffectChannel::Fatigue => &self.fatigue,
            AffectChannel::Trust => &self.trust,
            AffectChannel::Empathy => &self.empathy,
            AffectChannel::Hurt => &self.hurt,
            AffectChannel::Affection => &self.affection,
            AffectChannel::Calm => &self.calm,
        }
    }
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self {
            anger: default_anger(),
            stress: default_stress(),
            fatigue: default_fatigue(),
            trust: default_trust_channel(),
            empathy: default_empathy(),
            hurt: default_hurt(),
            affection: default_affection(),
            calm: default_calm(),
        }
    }
}

// ---------------------------------------------------------------------------
// Trust
// ---------------------------------------------------------------------------

/// Trust / resentment dynamics. Scores live on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Starting trust score.
    #[serde(default = "default_60")]
    pub initial_trust: f32,
    /// Starting resentment score.
    #[serde(default = "default_10")]
    pub initial_resentment: f32,
    /// Multiplier applied to any delta that happened in public.
    #[serde(default = "default_2_0")]
    pub public_multiplier: f32,
    /// Multiplier applied to negative deltas (trust erodes faster than it builds).
    #[serde(default = "default_2_0")]
    pub erosion_multiplier: f32,
    /// Width of the diminishing-returns window in minutes.
    #[serde(default = "default_60_i64")]
    pub diminishing_window_minutes: i64,
    /// Per-repeat multiplier for positive deltas inside the window.
    #[serde(default = "default_0_5")]
    pub diminishing_multiplier: f32,
    /// Resentment above which positive deltas are damped.
    #[serde(default = "default_50")]
    pub resentment_impact_threshold: f32,
    /// Damping applied to positive deltas above that resentment.
    #[serde(default = "default_0_5")]
    pub resentment_impact_factor: f32,
    /// Trust above which negative deltas are softened.
    #[serde(default = "default_60")]
    pub high_trust_threshold: f32,
    /// Softening factor for negative deltas at high trust.
    #[serde(default = "default_0_7")]
    pub high_trust_resilience: f32,
    /// Fixed resentment increment for a repeated pattern.
    #[serde(default = "default_3_0")]
    pub pattern_resentment: f32,
    /// Fixed resentment increment for an isolated incident.
    #[serde(default = "default_0_5")]
    pub incident_resentment: f32,
    /// Resentment shed per day once goodwill has been shown.
    #[serde(default = "default_0_5")]
    pub resentment_decay_per_day: f32,
    /// Apology effectiveness lost per recurrence.
    #[serde(default = "default_0_2")]
    pub apology_decay_per_recurrence: f32,
    /// Floor for apology effectiveness.
    #[serde(default = "default_0_1")]
    pub apology_floor: f32,
    /// Effectiveness regained per full week without recurrence.
    #[serde(default = "default_0_1")]
    pub apology_recovery_per_week: f32,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            initial_trust: 60.0,
            initial_resentment: 10.0,
            public_multiplier: 2.0,
            erosion_multiplier: 2.0,
            diminishing_window_minutes: 60,
            diminishing_multiplier: 0.5,
            resentment_impact_threshold: 50.0,
            resentment_impact_factor: 0.5,
            high_trust_threshold: 60.0,
            high_trust_resilience: 0.7,
            pattern_resentment: 3.0,
            incident_resentment: 0.5,
            resentment_decay_per_day: 0.5,
            apology_decay_per_recurrence: 0.2,
            apology_floor: 0.1,
            apology_recovery_per_week: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Emotional memory store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum records retained; oldest are pruned first.
    #[serde(default = "default_1000")]
    pub capacity: usize,
    /// Per-day geometric decay applied to records older than 30 days.
    #[serde(default = "default_0_05")]
    pub decay_rate: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            decay_rate: 0.05,
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Behavior pattern detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Default sliding window in days.
    #[serde(default = "default_7_i64")]
    pub window_days: i64,
    /// Matching actions required in the window before a pattern exists.
    #[serde(default = "default_3_usize")]
    pub min_occurrences: usize,
    /// Per-day weight decay since a pattern's last occurrence.
    #[serde(default = "default_0_1")]
    pub decay_rate: f32,
    /// Consecutive positive actions that start wearing negative patterns down.
    #[serde(default = "default_5_u32")]
    pub break_threshold: u32,
    /// Valence an action must exceed to extend the positive streak.
    #[serde(default = "default_0_3")]
    pub positive_valence_threshold: f32,
    /// Weight multiplier applied to negative patterns by a positive streak.
    #[serde(default = "default_0_8")]
    pub streak_break_factor: f32,
    /// Weight multiplier applied by an explicit break.
    #[serde(default = "default_0_7")]
    pub explicit_break_factor: f32,
    /// Patterns whose weight falls below this are forgotten.
    #[serde(default = "default_0_1")]
    pub weight_floor: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            min_occurrences: 3,
            decay_rate: 0.1,
            break_threshold: 5,
            positive_valence_threshold: 0.3,
            streak_break_factor: 0.8,
            explicit_break_factor: 0.7,
            weight_floor: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Reaction
// ---------------------------------------------------------------------------

/// Reaction selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    /// Upper bound of the uniform noise added to each mode weight.
    #[serde(default = "default_0_1")]
    pub noise: f32,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self { noise: 0.1 }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_anger() -> ChannelConfig { ChannelConfig::new(0.2, 0.2, 0.1) }
fn default_stress() -> ChannelConfig { ChannelConfig::new(0.4, 0.3, 0.05) }
fn default_fatigue() -> ChannelConfig { ChannelConfig::new(0.3, 0.3, 0.02) }
fn default_trust_channel() -> ChannelConfig { ChannelConfig::new(0.6, 0.5, 0.02) }
fn default_empathy() -> ChannelConfig { ChannelConfig::new(0.5, 0.5, 0.05) }
fn default_hurt() -> ChannelConfig { ChannelConfig::new(0.2, 0.2, 0.08) }
fn default_affection() -> ChannelConfig { ChannelConfig::new(0.7, 0.6, 0.01) }
fn default_calm() -> ChannelConfig { ChannelConfig::new(0.5, 0.5, 0.05) }
fn default_0_05() -> f32 { 0.05 }
fn default_0_1() -> f32 { 0.1 }
fn default_0_2() -> f32 { 0.2 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_7() -> f32 { 0.7 }
fn default_0_8() -> f32 { 0.8 }
fn default_2_0() -> f32 { 2.0 }
fn default_3_0() -> f32 { 3.0 }
fn default_10() -> f32 { 10.0 }
fn default_50() -> f32 { 50.0 }
fn default_60() -> f32 { 60.0 }
fn default_3_usize() -> usize { 3 }
fn default_5_u32() -> u32 { 5 }
fn default_7_i64() -> i64 { 7 }
fn default_60_i64() -> i64 { 60 }
fn default_1000() -> usize { 1000 }
