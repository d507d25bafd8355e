//! Shared vocabulary for the kindred engine.
//!
//! Every closed set the components exchange (affect channels, visibility,
//! context categories, behavior and pattern kinds) is an explicit enum so
//! matches over them are checked for exhaustiveness.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique identifier for an emotional memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Affect channels
// ---------------------------------------------------------------------------

/// One bounded dimension of a character's emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectChannel {
    /// Resentment, frustration, rage.
    Anger,
    /// Overall pressure.
    Stress,
    /// Physical and emotional exhaustion.
    Fatigue,
    /// Momentary trust in the partner (distinct from long-run trust score).
    Trust,
    /// Willingness to take the partner's perspective.
    Empathy,
    /// Feeling wounded.
    Hurt,
    /// Underlying affection, slow to move.
    Affection,
    /// Composure. The neutral default when nothing else registers.
    Calm,
}

impl AffectChannel {
    /// Every channel, in storage order.
    pub const ALL: [Self; 8] = [
        Self::Anger,
        Self::Stress,
        Self::Fatigue,
        Self::Trust,
        Self::Empathy,
        Self::Hurt,
        Self::Affection,
        Self::Calm,
    ];

    /// Channels counted on the positive side of valence.
    pub const POSITIVE: [Self; 4] = [Self::Trust, Self::Empathy, Self::Affection, Self::Calm];

    /// Channels counted on the negative side of valence. Fatigue is neutral.
    pub const NEGATIVE: [Self; 3] = [Self::Anger, Self::Stress, Self::Hurt];

    /// Position of this channel in a dense channel array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Anger => 0,
            Self::Stress => 1,
            Self::Fatigue => 2,
            Self::Trust => 3,
            Self::Empathy => 4,
            Self::Hurt => 5,
            Self::Affection => 6,
            Self::Calm => 7,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Anger => "anger",
            Self::Stress => "stress",
            Self::Fatigue => "fatigue",
            Self::Trust => "trust",
            Self::Empathy => "empathy",
            Self::Hurt => "hurt",
            Self::Affection => "affection",
            Self::Calm => "calm",
        }
    }
}

impl fmt::Display for AffectChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Whether an exchange happened in front of others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextVisibility {
    /// Witnessed by others. Trust changes count double.
    Public,
    /// Between the two parties only.
    #[default]
    Private,
}

/// Category of situation an emotional impact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCategory {
    /// Being helped or helping.
    Support,
    /// Disagreement, argument, blame.
    Conflict,
    /// Shared care duties.
    Caregiving,
    /// Closeness and affection.
    Intimacy,
}

impl ContextCategory {
    /// Every category.
    pub const ALL: [Self; 4] = [Self::Support, Self::Conflict, Self::Caregiving, Self::Intimacy];
}

// ---------------------------------------------------------------------------
// Behavior vocabulary
// ---------------------------------------------------------------------------

/// A categorized behavior performed by the partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Showed up for shared care duties.
    CaregivingPresent,
    /// Missed shared care duties.
    CaregivingAbsent,
    /// Dodged a needed conversation.
    ConflictAvoid,
    /// Overrode a joint decision.
    ControlTaking,
    /// Acknowledged the character's feelings.
    EmpathyShown,
    /// Brushed the character's feelings aside.
    EmpathyLacking,
    /// Backed the character up in front of others.
    PublicSupport,
    /// Contradicted the character in front of others.
    PublicContradiction,
}

impl ActionKind {
    /// The recurring pattern this action feeds, if any.
    #[must_use]
    pub const fn pattern(self) -> Option<PatternKind> {
        match self {
            Self::CaregivingPresent => Some(PatternKind::ConsistentPresence),
            Self::CaregivingAbsent => Some(PatternKind::SporadicInvolvement),
            Self::ConflictAvoid => Some(PatternKind::RepeatedAvoidance),
            Self::ControlTaking => Some(PatternKind::ControlTaking),
            Self::EmpathyShown => Some(PatternKind::EmpatheticSupport),
            Self::PublicSupport => Some(PatternKind::PublicUnity),
            Self::PublicContradiction => Some(PatternKind::PublicUndermining),
            Self::EmpathyLacking => None,
        }
    }
}

/// A recurring behavior detected over a sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Reliably present for care duties.
    ConsistentPresence,
    /// Present only now and then.
    SporadicInvolvement,
    /// Keeps avoiding conflict.
    RepeatedAvoidance,
    /// Keeps taking control.
    ControlTaking,
    /// Keeps offering empathy.
    EmpatheticSupport,
    /// Keeps presenting a united front.
    PublicUnity,
    /// Keeps undermining in public.
    PublicUndermining,
}

impl PatternKind {
    /// Every pattern kind.
    pub const ALL: [Self; 7] = [
        Self::ConsistentPresence,
        Self::SporadicInvolvement,
        Self::RepeatedAvoidance,
        Self::ControlTaking,
        Self::EmpatheticSupport,
        Self::PublicUnity,
        Self::PublicUndermining,
    ];

    /// Whether a sustained positive streak wears this pattern down.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        match self {
            Self::SporadicInvolvement
            | Self::RepeatedAvoidance
            | Self::ControlTaking
            | Self::PublicUndermining => true,
            Self::ConsistentPresence | Self::EmpatheticSupport | Self::PublicUnity => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Emotional impact
// ---------------------------------------------------------------------------

/// How an exchange felt. Immutable once built; inputs are clamped, decoded
/// ones included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEmotionalImpact")]
pub struct EmotionalImpact {
    primary: AffectChannel,
    intensity: f32,
    valence: f32,
    category: ContextCategory,
}

#[derive(Deserialize)]
struct RawEmotionalImpact {
    primary: AffectChannel,
    intensity: f32,
    valence: f32,
    category: ContextCategory,
}

impl From<RawEmotionalImpact> for EmotionalImpact {
    fn from(raw: RawEmotionalImpact) -> Self {
        Self::new(raw.primary, raw.intensity, raw.valence, raw.category)
    }
}

impl EmotionalImpact {
    /// Build an impact, clamping intensity to [0, 1] and valence to [-1, 1].
    #[must_use]
    pub fn new(primary: AffectChannel, intensity: f32, valence: f32, category: ContextCategory) -> Self {
        Self {
            primary,
            intensity: sanitize(intensity).clamp(0.0, 1.0),
            valence: sanitize(valence).clamp(-1.0, 1.0),
            category,
        }
    }

    /// Channel the exchange mostly moved.
    #[must_use]
    pub fn primary(&self) -> AffectChannel {
        self.primary
    }

    /// Strength of the feeling, 0.0 to 1.0.
    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Pleasantness, -1.0 to 1.0.
    #[must_use]
    pub fn valence(&self) -> f32 {
        self.valence
    }

    /// Situation category.
    #[must_use]
    pub fn category(&self) -> ContextCategory {
        self.category
    }
}

// ---------------------------------------------------------------------------
// Numeric & time helpers
// ---------------------------------------------------------------------------

/// Replace a NaN input with 0.0. Infinities are left for the caller's clamp.
#[must_use]
pub fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        warn!("NaN input replaced with 0.0");
        0.0
    } else {
        value
    }
}

/// Fractional days from `earlier` to `later`, floored at zero.
#[must_use]
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let secs = (later - earlier).num_milliseconds() as f64 / 1000.0;
    (secs / 86_400.0).max(0.0)
}

/// `days` as a span, saturating at the longest one chrono can represent.
#[must_use]
pub fn saturating_days(days: i64) -> TimeDelta {
    TimeDelta::try_days(days).unwrap_or(if days < 0 { TimeDelta::MIN } else { TimeDelta::MAX })
}

/// `minutes` as a span, saturating at the longest one chrono can represent.
#[must_use]
pub fn saturating_minutes(minutes: i64) -> TimeDelta {
    TimeDelta::try_minutes(minutes).unwrap_or(if minutes < 0 { TimeDelta::MIN } else { TimeDelta::MAX })
}

/// The instant `window` before `now`, saturating at the ends of the
/// representable calendar.
#[must_use]
pub fn window_start(now: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(if window > TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Whole days from `earlier` to `later`, floored at zero.
#[must_use]
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_days().max(0)
}
