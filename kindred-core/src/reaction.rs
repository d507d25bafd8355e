//! Reaction selection: weighted choice behind a hard emotional gate.
//!
//! ```text
//! (sentiment, intent) ──▶ base row ──▶ + Σ channel × affinity ──▶ floor 0, normalize
//!                                                                     │
//!                                   noise + weighted sample ◀─────────┘
//!                                               │
//!                                   gate ──▶ allowed? keep : best allowed by weight
//! ```
//!
//! Scoring and gating are pure functions of their inputs. Only
//! [`sample_mode`] touches randomness, through a caller-supplied RNG, so a
//! seeded RNG or [`decide_with_candidate`] make every
//! decision reproducible.

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::affect::{AffectDeltas, AffectState, ChannelLevels};
use crate::config::ReactionConfig;
use crate::trust::WithdrawalLevel;
use crate::types::{AffectChannel, sanitize};

const MIN_INTENSITY: f32 = 0.2;
const MAX_INTENSITY: f32 = 1.0;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// How the character answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionMode {
    /// Warm, understanding, helpful.
    Supportive,
    /// Protecting self, justifying.
    Defensive,
    /// Challenging, fighting back.
    Confrontational,
    /// Distant, minimal engagement.
    Cold,
    /// Shutting down.
    Withdrawn,
    /// Working the problem together.
    Cooperative,
    /// Biting, passive-aggressive.
    Sarcastic,
    /// Open about the pain.
    Vulnerable,
    /// Not taking it seriously.
    Dismissive,
    /// Saying plainly that it hurt.
    Hurt,
}

impl ReactionMode {
    /// Every mode, in tie-break order.
    pub const ALL: [Self; 10] = [
        Self::Supportive,
        Self::Defensive,
        Self::Confrontational,
        Self::Cold,
        Self::Withdrawn,
        Self::Cooperative,
        Self::Sarcastic,
        Self::Vulnerable,
        Self::Dismissive,
        Self::Hurt,
    ];

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Supportive => "supportive",
            Self::Defensive => "defensive",
            Self::Confrontational => "confrontational",
            Self::Cold => "cold",
            Self::Withdrawn => "withdrawn",
            Self::Cooperative => "cooperative",
            Self::Sarcastic => "sarcastic",
            Self::Vulnerable => "vulnerable",
            Self::Dismissive => "dismissive",
            Self::Hurt => "hurt",
        }
    }
}

impl fmt::Display for ReactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Overall tone of what the partner said.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    /// Friendly.
    Positive,
    /// Flat.
    #[default]
    Neutral,
    /// Unfriendly.
    Negative,
    /// Openly aggressive.
    Hostile,
}

/// What the partner was trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Intent {
    Apologize,
    Attack,
    Dismiss,
    Deflect,
    Connect,
    Explain,
    Question,
    Joke,
    Withdraw,
    Blame,
    Support,
    #[default]
    Neutral,
}

/// Emotional trigger found in the partner's words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Trigger {
    Insult,
    Neglect,
    Avoidance,
    Empathy,
    Affection,
    Blame,
    Dismissal,
    Sarcasm,
    Threat,
    Appreciation,
}

/// Discrete summary of an utterance, produced by an upstream text
/// classifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Perception {
    /// Overall tone.
    pub sentiment: Sentiment,
    /// Speaker's aim.
    pub intent: Intent,
    /// How intense the message was, 0.0 to 1.0.
    pub severity: f32,
    /// Triggers present.
    pub triggers: BTreeSet<Trigger>,
}

impl Perception {
    /// Build a perception with no triggers, clamping severity to [0, 1].
    #[must_use]
    pub fn new(sentiment: Sentiment, intent: Intent, severity: f32) -> Self {
        Self {
            sentiment,
            intent,
            severity: sanitize(severity).clamp(0.0, 1.0),
            triggers: BTreeSet::new(),
        }
    }

    /// Add a trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.insert(trigger);
        self
    }

    /// Whether a trigger is present.
    #[must_use]
    pub fn has(&self, trigger: Trigger) -> bool {
        self.triggers.contains(&trigger)
    }
}

/// Relationship context the caller may pass in alongside affect.
///
/// Trust and pattern state never reach the selector directly; the caller
/// condenses them into these two signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSignals {
    /// Current withdrawal band.
    pub withdrawal: WithdrawalLevel,
    /// Weight of the strongest active negative pattern, 0.0 if none.
    pub negative_pattern_weight: f32,
}

/// Outcome of one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionDecision {
    /// Mode to answer in.
    pub mode: ReactionMode,
    /// How strongly, 0.2 to 1.0.
    pub intensity: f32,
    /// Whether the sampled mode passed the gate (false means it was replaced).
    pub allowed_by_gate: bool,
    /// Affect changes this exchange should cause.
    pub deltas: AffectDeltas,
    /// Short explanation, e.g. `"hostile input detected; high anger; reacting cold"`.
    pub reasoning: String,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Base weight row for a (sentiment, intent) pair, falling back to the
/// neutral/neutral row.
#[must_use]
pub fn base_row(sentiment: Sentiment, intent: Intent) -> &'static [(ReactionMode, f32)] {
    use ReactionMode::{
        Cold, Confrontational, Cooperative, Defensive, Dismissive, Hurt, Sarcastic, Supportive,
        Vulnerable, Withdrawn,
    };
    match (sentiment, intent) {
        (Sentiment::Hostile, Intent::Attack) => {
            &[(Confrontational, 0.4), (Hurt, 0.3), (Cold, 0.2), (Withdrawn, 0.1)]
        }
        (Sentiment::Negative, Intent::Blame) => {
            &[(Defensive, 0.4), (Confrontational, 0.3), (Hurt, 0.2), (Cold, 0.1)]
        }
        (Sentiment::Negative, Intent::Dismiss) => {
            &[(Hurt, 0.3), (Cold, 0.3), (Sarcastic, 0.2), (Withdrawn, 0.2)]
        }
        (Sentiment::Neutral, Intent::Withdraw) => {
            &[(Hurt, 0.3), (Cold, 0.3), (Dismissive, 0.2), (Vulnerable, 0.2)]
        }
        (Sentiment::Positive, Intent::Apologize) => {
            &[(Cold, 0.3), (Hurt, 0.3), (Cooperative, 0.2), (Supportive, 0.2)]
        }
        (Sentiment::Positive, Intent::Connect) => {
            &[(Cooperative, 0.4), (Supportive, 0.3), (Vulnerable, 0.2), (Cold, 0.1)]
        }
        (Sentiment::Neutral, Intent::Question) => {
            &[(Cooperative, 0.4), (Cold, 0.3), (Dismissive, 0.2), (Supportive, 0.1)]
        }
        _ => &[(Cold, 0.3), (Cooperative, 0.3), (Dismissive, 0.2), (Sarcastic, 0.2)],
    }
}

/// How strongly a channel pulls each mode. Channels not listed have no pull.
#[must_use]
pub fn affinities(channel: AffectChannel) -> &'static [(ReactionMode, f32)] {
    use ReactionMode::{
        Cold, Confrontational, Cooperative, Dismissive, Hurt, Sarcastic, Supportive, Vulnerable,
        Withdrawn,
    };
    match channel {
        AffectChannel::Anger => &[
            (Confrontational, 0.4),
            (Sarcastic, 0.3),
            (Cold, 0.2),
            (Supportive, -0.5),
        ],
        AffectChannel::Hurt => &[(Hurt, 0.5), (Vulnerable, 0.3), (Withdrawn, 0.3), (Cold, 0.2)],
        AffectChannel::Fatigue => &[
            (Withdrawn, 0.4),
            (Cold, 0.3),
            (Dismissive, 0.3),
            (Confrontational, -0.3),
        ],
        AffectChannel::Trust => &[(Supportive, 0.3), (Cooperative, 0.3), (Vulnerable, 0.2)],
        AffectChannel::Empathy => &[(Supportive, 0.4), (Cooperative, 0.3), (Vulnerable, 0.2)],
        AffectChannel::Stress | AffectChannel::Affection | AffectChannel::Calm => &[],
    }
}

/// The first gate rule that forbids `mode` at these levels, as a reason.
#[must_use]
pub fn gate_reason(levels: &ChannelLevels, mode: ReactionMode) -> Option<&'static str> {
    use ReactionMode::{Confrontational, Cooperative, Supportive, Vulnerable};
    let rules: [(bool, &[ReactionMode], &'static str); 5] = [
        (levels.anger > 0.7, &[Supportive, Cooperative], "too angry to be supportive"),
        (levels.hurt > 0.7, &[Supportive], "too hurt to be warm"),
        (levels.trust < 0.3, &[Vulnerable], "trust too low to be vulnerable"),
        (levels.fatigue > 0.8, &[Confrontational], "too exhausted to fight"),
        (levels.empathy < 0.2, &[Cooperative, Supportive], "empathy too low"),
    ];
    rules
        .into_iter()
        .find(|(active, blocked, _)| *active && blocked.contains(&mode))
        .map(|(_, _, reason)| reason)
}

/// Whether the gate lets `mode` through.
#[must_use]
pub fn is_allowed(levels: &ChannelLevels, mode: ReactionMode) -> bool {
    gate_reason(levels, mode).is_none()
}

/// Every mode the gate lets through, in [`ReactionMode::ALL`] order.
#[must_use]
pub fn allowed_modes(levels: &ChannelLevels) -> Vec<ReactionMode> {
    ReactionMode::ALL
        .into_iter()
        .filter(|m| is_allowed(levels, *m))
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring & choice
// ---------------------------------------------------------------------------

/// Normalized candidate weights: base row, relationship boosts, then channel
/// affinities, each floored at zero and scaled to sum to 1 (left as-is when
/// every score is zero).
#[must_use]
pub fn score_modes(
    levels: &ChannelLevels,
    perception: &Perception,
    signals: Option<&RelationshipSignals>,
) -> Vec<(ReactionMode, f32)> {
    let mut scores: Vec<(ReactionMode, f32)> =
        base_row(perception.sentiment, perception.intent).to_vec();

    if let Some(signals) = signals {
        let boost = match signals.withdrawal {
            WithdrawalLevel::None => 0.0,
            WithdrawalLevel::Mild => 0.05,
            WithdrawalLevel::Moderate => 0.1,
            WithdrawalLevel::Severe => 0.2,
        };
        let pattern = sanitize(signals.negative_pattern_weight).clamp(0.0, 1.0) * 0.1;
        bump(&mut scores, ReactionMode::Cold, boost + pattern);
        bump(&mut scores, ReactionMode::Withdrawn, boost);
        bump(&mut scores, ReactionMode::Hurt, pattern);
    }

    for (mode, score) in &mut scores {
        for channel in AffectChannel::ALL {
            let pull = affinities(channel)
                .iter()
                .find(|(m, _)| *m == *mode)
                .map_or(0.0, |(_, a)| *a);
            *score += levels.get(channel) * pull;
        }
        *score = score.max(0.0);
    }

    let total: f32 = scores.iter().map(|(_, s)| s).sum();
    if total > 0.0 {
        for (_, score) in &mut scores {
            *score /= total;
        }
    }
    scores
}

fn bump(scores: &mut Vec<(ReactionMode, f32)>, mode: ReactionMode, amount: f32) {
    if amount <= 0.0 {
        return;
    }
    match scores.iter_mut().find(|(m, _)| *m == mode) {
        Some((_, score)) => *score += amount,
        None => scores.push((mode, amount)),
    }
}

/// Perturb each weight with uniform noise in `[0, noise)` and draw one mode.
/// Falls back to the heaviest mode when no weight is positive.
pub fn sample_mode<R: Rng + ?Sized>(
    weights: &[(ReactionMode, f32)],
    noise: f32,
    rng: &mut R,
) -> ReactionMode {
    let noisy: Vec<f32> = weights
        .iter()
        .map(|(_, w)| if noise > 0.0 { w + rng.gen_range(0.0..noise) } else { *w })
        .collect();
    match WeightedIndex::new(&noisy) {
        Ok(dist) => weights[dist.sample(rng)].0,
        Err(_) => heaviest(weights, |_| true).unwrap_or(ReactionMode::Cold),
    }
}

/// Gate `candidate`. If it is forbidden, replace it with the allowed mode
/// of highest weight (modes absent from `weights` count as zero; ties go to
/// the earlier mode in [`ReactionMode::ALL`]). Returns the final mode and
/// whether the candidate was allowed.
#[must_use]
pub fn resolve_gate(
    levels: &ChannelLevels,
    weights: &[(ReactionMode, f32)],
    candidate: ReactionMode,
) -> (ReactionMode, bool) {
    if is_allowed(levels, candidate) {
        return (candidate, true);
    }
    let replacement = heaviest_allowed(levels, weights);
    debug!(
        vetoed = %candidate,
        replacement = %replacement,
        reason = gate_reason(levels, candidate).unwrap_or_default(),
        "Gate vetoed reaction"
    );
    (replacement, false)
}

fn heaviest_allowed(levels: &ChannelLevels, weights: &[(ReactionMode, f32)]) -> ReactionMode {
    let mut best: Option<(ReactionMode, f32)> = None;
    for mode in allowed_modes(levels) {
        let weight = weights
            .iter()
            .find(|(m, _)| *m == mode)
            .map_or(0.0, |(_, w)| *w);
        if best.is_none_or(|(_, b)| weight > b) {
            best = Some((mode, weight));
        }
    }
    // Defensive is never gated, so there is always an allowed mode.
    best.map_or(ReactionMode::Defensive, |(m, _)| m)
}

fn heaviest(
    weights: &[(ReactionMode, f32)],
    keep: impl Fn(ReactionMode) -> bool,
) -> Option<ReactionMode> {
    let mut best: Option<(ReactionMode, f32)> = None;
    for (mode, weight) in weights.iter().copied().filter(|(m, _)| keep(*m)) {
        if best.is_none_or(|(_, b)| weight > b) {
            best = Some((mode, weight));
        }
    }
    best.map(|(m, _)| m)
}

/// Reaction strength from message severity and how charged the character is.
#[must_use]
pub fn intensity(affect: &AffectState, perception: &Perception) -> f32 {
    let mut value = perception.severity;
    if affect.dominant().1 > 0.6 {
        value += 0.2;
    }
    if affect.get(AffectChannel::Anger) > 0.5 {
        value += 0.1;
    }
    if affect.get(AffectChannel::Fatigue) > 0.7 {
        value -= 0.2;
    }
    value.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

/// Affect changes caused by what was said and by answering in `mode`.
///
/// Trigger effects set their channels (a later trigger overrides an earlier
/// one on the same channel); mode effects add on top.
#[must_use]
pub fn reaction_deltas(perception: &Perception, mode: ReactionMode) -> AffectDeltas {
    use AffectChannel::{Affection, Anger, Empathy, Fatigue, Hurt, Stress, Trust};

    let mut deltas = AffectDeltas::new();
    let mut set = |pairs: &[(AffectChannel, f32)]| {
        for (channel, delta) in pairs {
            deltas.insert(*channel, *delta);
        }
    };

    if perception.has(Trigger::Insult) {
        set(&[(Anger, 0.2), (Hurt, 0.3), (Trust, -0.2)]);
    }
    if perception.has(Trigger::Blame) {
        set(&[(Anger, 0.15), (Hurt, 0.1), (Stress, 0.1)]);
    }
    if perception.has(Trigger::Affection) {
        set(&[(Hurt, -0.1), (Trust, 0.05), (Affection, 0.05)]);
    }
    if perception.has(Trigger::Empathy) {
        set(&[(Stress, -0.1), (Trust, 0.1), (Empathy, 0.1)]);
    }
    if perception.has(Trigger::Dismissal) {
        set(&[(Hurt, 0.15), (Anger, 0.1), (Empathy, -0.1)]);
    }
    if perception.intent == Intent::Apologize {
        set(&[(Anger, -0.1), (Hurt, -0.05)]);
    }

    let mut add = |channel: AffectChannel, delta: f32| {
        *deltas.entry(channel).or_insert(0.0) += delta;
    };
    match mode {
        ReactionMode::Confrontational => {
            add(Stress, 0.1);
            add(Fatigue, 0.1);
        }
        ReactionMode::Withdrawn => add(Empathy, -0.05),
        ReactionMode::Supportive => add(Empathy, 0.05),
        _ => {}
    }
    deltas
}

fn reasoning(affect: &AffectState, perception: &Perception, mode: ReactionMode) -> String {
    let mut parts = Vec::new();
    if perception.sentiment == Sentiment::Hostile {
        parts.push("hostile input detected".to_owned());
    } else if perception.intent == Intent::Apologize {
        parts.push("apology received".to_owned());
    } else if perception.intent == Intent::Dismiss {
        parts.push("feeling dismissed".to_owned());
    }
    let (channel, value) = affect.dominant();
    if value > 0.5 {
        parts.push(format!("high {channel}"));
    }
    parts.push(format!("reacting {mode}"));
    parts.join("; ")
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Stateless reaction policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionSelector {
    config: ReactionConfig,
}

impl ReactionSelector {
    /// Create a selector with the given tuning.
    #[must_use]
    pub fn new(config: ReactionConfig) -> Self {
        Self { config }
    }

    /// Score, sample with `rng`, gate and package a decision.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        affect: &AffectState,
        perception: &Perception,
        signals: Option<&RelationshipSignals>,
        rng: &mut R,
    ) -> ReactionDecision {
        let weights = score_modes(affect.levels(), perception, signals);
        let candidate = sample_mode(&weights, self.config.noise, rng);
        package(affect, perception, &weights, candidate)
    }
}

/// Like [`ReactionSelector::decide`] with the sampled mode supplied by the
/// caller. Fully deterministic.
#[must_use]
pub fn decide_with_candidate(
    affect: &AffectState,
    perception: &Perception,
    signals: Option<&RelationshipSignals>,
    candidate: ReactionMode,
) -> ReactionDecision {
    let weights = score_modes(affect.levels(), perception, signals);
    package(affect, perception, &weights, candidate)
}

fn package(
    affect: &AffectState,
    perception: &Perception,
    weights: &[(ReactionMode, f32)],
    candidate: ReactionMode,
) -> ReactionDecision {
    let (mode, allowed_by_gate) = resolve_gate(affect.levels(), weights, candidate);
    ReactionDecision {
        mode,
        intensity: intensity(affect, perception),
        allowed_by_gate,
        deltas: reaction_deltas(perception, mode),
        reasoning: reasoning(affect, perception, mode),
    }
}
