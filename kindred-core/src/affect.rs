//! Affect state: a character's bounded, decaying emotion vector.
//!
//! Every channel lives in [0, 1]. Channels drift back toward their own
//! baseline one decay step per turn, and a fixed set of cross-channel rules
//! runs after every mutation (high anger suppresses empathy, strong affection
//! takes the edge off anger, and so on).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AffectConfig;
use crate::types::{AffectChannel, sanitize};

/// Per-channel changes, ordered by channel for deterministic application.
pub type AffectDeltas = BTreeMap<AffectChannel, f32>;

/// Current value of every affect channel.
///
/// Decoding clamps every channel, so a stored snapshot can never carry an
/// out-of-range level back in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChannelLevels")]
pub struct ChannelLevels {
    /// Anger level.
    pub anger: f32,
    /// Stress level.
    pub stress: f32,
    /// Fatigue level.
    pub fatigue: f32,
    /// Trust level.
    pub trust: f32,
    /// Empathy level.
    pub empathy: f32,
    /// Hurt level.
    pub hurt: f32,
    /// Affection level.
    pub affection: f32,
    /// Calm level.
    pub calm: f32,
}

#[derive(Deserialize)]
struct RawChannelLevels {
    anger: f32,
    stress: f32,
    fatigue: f32,
    trust: f32,
    empathy: f32,
    hurt: f32,
    affection: f32,
    calm: f32,
}

impl From<RawChannelLevels> for ChannelLevels {
    fn from(raw: RawChannelLevels) -> Self {
        let mut levels = Self {
            anger: raw.anger,
            stress: raw.stress,
            fatigue: raw.fatigue,
            trust: raw.trust,
            empathy: raw.empathy,
            hurt: raw.hurt,
            affection: raw.affection,
            calm: raw.calm,
        };
        levels.clamp_all();
        levels
    }
}

impl ChannelLevels {
    /// Read one channel.
    #[must_use]
    pub fn get(&self, channel: AffectChannel) -> f32 {
        match channel {
            AffectChannel::Anger => self.anger,
            AffectChannel::Stress => self.stress,
            AffectChannel::Fatigue => self.fatigue,
            AffectChannel::Trust => self.trust,
            AffectChannel::Empathy => self.empathy,
            AffectChannel::Hurt => self.hurt,
            AffectChannel::Affection => self.affection,
            AffectChannel::Calm => self.calm,
        }
    }

    fn slot(&mut self, channel: AffectChannel) -> &mut f32 {
        match channel {
            AffectChannel::Anger => &mut self.anger,
            AffectChannel::Stress => &mut self.stress,
            AffectChannel::Fatigue => &mut self.fatigue,
            AffectChannel::Trust => &mut self.trust,
            AffectChannel::Empathy => &mut self.empathy,
            AffectChannel::Hurt => &mut self.hurt,
            AffectChannel::Affection => &mut self.affection,
            AffectChannel::Calm => &mut self.calm,
        }
    }

    /// Write one channel, clamped to [0, 1].
    pub fn set(&mut self, channel: AffectChannel, value: f32) {
        *self.slot(channel) = sanitize(value).clamp(0.0, 1.0);
    }

    fn shift(&mut self, channel: AffectChannel, delta: f32) {
        let current = self.get(channel);
        self.set(channel, current + sanitize(delta));
    }

    fn clamp_all(&mut self) {
        for channel in AffectChannel::ALL {
            let value = self.get(channel);
            self.set(channel, value);
        }
    }
}

/// A character's emotional state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectState {
    levels: ChannelLevels,
    tuning: AffectConfig,
    last_updated: DateTime<Utc>,
}

impl Default for AffectState {
    fn default() -> Self {
        Self::new(AffectConfig::default())
    }
}

impl AffectState {
    /// Fresh state at each channel's configured initial value.
    #[must_use]
    pub fn new(tuning: AffectConfig) -> Self {
        let mut levels = ChannelLevels {
            anger: 0.0,
            stress: 0.0,
            fatigue: 0.0,
            trust: 0.0,
            empathy: 0.0,
            hurt: 0.0,
            affection: 0.0,
            calm: 0.0,
        };
        for channel in AffectChannel::ALL {
            levels.set(channel, tuning.channel(channel).initial);
        }
        Self {
            levels,
            tuning,
            last_updated: Utc::now(),
        }
    }

    /// State with explicit channel values (clamped) and the given tuning.
    #[must_use]
    pub fn with_levels(mut levels: ChannelLevels, tuning: AffectConfig) -> Self {
        levels.clamp_all();
        Self {
            levels,
            tuning,
            last_updated: Utc::now(),
        }
    }

    /// Current value of a channel.
    #[must_use]
    pub fn get(&self, channel: AffectChannel) -> f32 {
        self.levels.get(channel)
    }

    /// All channel values.
    #[must_use]
    pub fn levels(&self) -> &ChannelLevels {
        &self.levels
    }

    /// Per-channel baseline and decay tuning.
    #[must_use]
    pub fn tuning(&self) -> &AffectConfig {
        &self.tuning
    }

    /// When the state last changed through an adjustment.
    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Shift one channel by `delta` (clamped), then run the interaction rules.
    pub fn adjust(&mut self, channel: AffectChannel, delta: f32) {
        self.adjust_at(channel, delta, Utc::now());
    }

    /// [`adjust`](Self::adjust) with an explicit timestamp.
    pub fn adjust_at(&mut self, channel: AffectChannel, delta: f32, at: DateTime<Utc>) {
        self.levels.shift(channel, delta);
        self.last_updated = at;
        self.apply_interactions();
    }

    /// Apply a batch of deltas, then run the interaction rules once.
    pub fn apply<I>(&mut self, deltas: I, at: DateTime<Utc>)
    where
        I: IntoIterator<Item = (AffectChannel, f32)>,
    {
        for (channel, delta) in deltas {
            self.levels.shift(channel, delta);
        }
        self.last_updated = at;
        self.apply_interactions();
    }

    /// The strongest channel and its value. Calm at 0.0 when every channel
    /// is empty. Ties go to the earlier channel in [`AffectChannel::ALL`].
    #[must_use]
    pub fn dominant(&self) -> (AffectChannel, f32) {
        let mut best = (AffectChannel::Calm, 0.0_f32);
        for channel in AffectChannel::ALL {
            let value = self.levels.get(channel);
            if value > best.1 {
                best = (channel, value);
            }
        }
        best
    }

    /// Positive minus negative channel mass, normalized by the larger group.
    /// Zero when both groups are empty.
    #[must_use]
    pub fn valence(&self) -> f32 {
        let positive: f32 = AffectChannel::POSITIVE.iter().map(|&c| self.get(c)).sum();
        let negative: f32 = AffectChannel::NEGATIVE.iter().map(|&c| self.get(c)).sum();
        if positive == 0.0 && negative == 0.0 {
            return 0.0;
        }
        let groups = AffectChannel::POSITIVE.len().max(AffectChannel::NEGATIVE.len());
        (positive - negative) / groups as f32
    }

    /// Move every channel one decay step toward its baseline without
    /// overshooting, then run the interaction rules.
    pub fn decay_toward_baseline(&mut self) {
        for channel in AffectChannel::ALL {
            let tuning = self.tuning.channel(channel);
            let current = self.levels.get(channel);
            let next = if current > tuning.baseline {
                (current - tuning.decay_rate).max(tuning.baseline)
            } else {
                (current + tuning.decay_rate).min(tuning.baseline)
            };
            self.levels.set(channel, next);
        }
        self.apply_interactions();
    }

    fn apply_interactions(&mut self) {
        let l = &mut self.levels;
        if l.anger > 0.7 {
            l.shift(AffectChannel::Empathy, -0.1);
        }
        if l.fatigue > 0.7 {
            l.shift(AffectChannel::Stress, 0.05);
        }
        if l.hurt > 0.6 {
            l.shift(AffectChannel::Trust, -0.05);
        }
        if l.trust < 0.3 {
            l.shift(AffectChannel::Empathy, -0.05);
        }
        if l.affection > 0.7 && l.anger > 0.5 {
            l.shift(AffectChannel::Anger, -0.05);
        }
        if l.stress > 0.7 {
            l.shift(AffectChannel::Calm, -0.05);
        }
        debug!(
            anger = l.anger,
            empathy = l.empathy,
            trust = l.trust,
            "Affect interactions applied"
        );
    }

    /// Short mood labels, e.g. `"furious, exhausted"`.
    #[must_use]
    pub fn describe(&self) -> String {
        let l = &self.levels;
        let mut labels = Vec::new();

        match l.anger {
            a if a > 0.7 => labels.push("furious"),
            a if a > 0.5 => labels.push("angry"),
            a if a > 0.3 => labels.push("irritated"),
            _ => {}
        }
        match l.stress {
            s if s > 0.7 => labels.push("overwhelmed"),
            s if s > 0.5 => labels.push("stressed"),
            _ => {}
        }
        match l.fatigue {
            f if f > 0.7 => labels.push("exhausted"),
            f if f > 0.5 => labels.push("tired"),
            _ => {}
        }
        match l.hurt {
            h if h > 0.7 => labels.push("deeply hurt"),
            h if h > 0.5 => labels.push("hurt"),
            _ => {}
        }
        if l.trust < 0.3 {
            labels.push("distrustful");
        }
        if l.empathy < 0.3 {
            labels.push("closed off");
        }

        if labels.is_empty() {
            labels.push(if self.valence() > 0.2 { "okay" } else { "neutral" });
        }
        labels.join(", ")
    }

    // ------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------

    /// Settled and warm.
    #[must_use]
    pub fn calm() -> Self {
        Self::preset([0.1, 0.2, 0.2, 0.7, 0.7, 0.1, 0.8, 0.8])
    }

    /// Worn down by sustained pressure.
    #[must_use]
    pub fn strained() -> Self {
        Self::preset([0.3, 0.6, 0.7, 0.5, 0.4, 0.3, 0.7, 0.3])
    }

    /// Freshly let down.
    #[must_use]
    pub fn betrayed() -> Self {
        Self::preset([0.7, 0.6, 0.5, 0.2, 0.2, 0.8, 0.4, 0.1])
    }

    /// Running on empty.
    #[must_use]
    pub fn exhausted() -> Self {
        Self::preset([0.4, 0.7, 0.9, 0.4, 0.3, 0.4, 0.5, 0.2])
    }

    /// Open and loving.
    #[must_use]
    pub fn affectionate() -> Self {
        Self::preset([0.1, 0.3, 0.3, 0.8, 0.8, 0.1, 0.9, 0.7])
    }

    fn preset(values: [f32; 8]) -> Self {
        let [anger, stress, fatigue, trust, empathy, hurt, affection, calm] = values;
        Self::with_levels(
            ChannelLevels {
                anger,
                stress,
                fatigue,
                trust,
                empathy,
                hurt,
                affection,
                calm,
            },
            AffectConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed() -> AffectState {
        let mut state = AffectState::default();
        for channel in AffectChannel::ALL {
            state.levels.set(channel, 0.0);
        }
        state
    }

    #[test]
    fn adjust_clamps_into_unit_range() {
        let mut state = AffectState::default();
        state.adjust(AffectChannel::Hurt, 5.0);
        assert_eq!(state.get(AffectChannel::Hurt), 1.0);
        state.adjust(AffectChannel::Calm, -5.0);
        assert_eq!(state.get(AffectChannel::Calm), 0.0);
    }

    #[test]
    fn adjust_stamps_time() {
        let mut state = AffectState::default();
        let at = Utc::now() + chrono::Duration::days(2);
        state.adjust_at(AffectChannel::Stress, 0.1, at);
        assert_eq!(state.last_updated(), at);
    }

    #[test]
    fn high_anger_suppresses_empathy_on_adjust() {
        let mut state = AffectState::default();
        let before = state.get(AffectChannel::Empathy);
        state.adjust(AffectChannel::Anger, 0.6);
        assert!(state.get(AffectChannel::Empathy) < before);
    }

    #[test]
    fn affection_takes_edge_off_anger() {
        let mut state = AffectState::calm();
        state.adjust(AffectChannel::Anger, 0.5);
        // 0.1 + 0.5 = 0.6, then affection 0.8 pulls 0.05 off.
        assert!((state.get(AffectChannel::Anger) - 0.55).abs() < 1e-5);
    }

    #[test]
    fn dominant_defaults_to_calm_when_empty() {
        let state = zeroed();
        assert_eq!(state.dominant(), (AffectChannel::Calm, 0.0));
    }

    #[test]
    fn dominant_picks_maximum() {
        let state = AffectState::exhausted();
        assert_eq!(state.dominant(), (AffectChannel::Fatigue, 0.9));
    }

    #[test]
    fn valence_is_zero_when_empty_and_signed_otherwise() {
        assert_eq!(zeroed().valence(), 0.0);
        assert!(AffectState::affectionate().valence() > 0.0);
        assert!(AffectState::betrayed().valence() < 0.0);
    }

    #[test]
    fn decay_moves_toward_baseline_without_overshoot() {
        let mut state = AffectState::default();
        state.levels.set(AffectChannel::Hurt, 0.25);
        state.levels.set(AffectChannel::Anger, 0.0);
        state.decay_toward_baseline();
        // Hurt baseline 0.2, rate 0.08: stops at the baseline.
        assert!((state.get(AffectChannel::Hurt) - 0.2).abs() < 1e-6);
        // Anger baseline 0.2, rate 0.1: climbs one step.
        assert!((state.get(AffectChannel::Anger) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn repeated_decay_converges_to_baselines() {
        let mut state = AffectState::betrayed();
        for _ in 0..200 {
            state.decay_toward_baseline();
        }
        let tuning = AffectConfig::default();
        for channel in AffectChannel::ALL {
            let baseline = tuning.channel(channel).baseline;
            assert!(
                (state.get(channel) - baseline).abs() < 1e-5,
                "{channel} settled at {} not {baseline}",
                state.get(channel)
            );
        }
    }

    #[test]
    fn batch_apply_runs_interactions_once() {
        let mut state = AffectState::default();
        let deltas: AffectDeltas = [(AffectChannel::Anger, 0.6), (AffectChannel::Empathy, 0.2)]
            .into_iter()
            .collect();
        state.apply(deltas, Utc::now());
        // 0.5 + 0.2 = 0.7, minus a single 0.1 anger suppression.
        assert!((state.get(AffectChannel::Empathy) - 0.6).abs() < 1e-5);
    }

    #[test]
    fn describe_labels_extremes() {
        assert!(AffectState::betrayed().describe().contains("deeply hurt"));
        assert!(AffectState::exhausted().describe().contains("exhausted"));
        assert_eq!(AffectState::calm().describe(), "okay");
    }

    #[test]
    fn decoding_clamps_out_of_range_levels() {
        let mut value = serde_json::to_value(AffectState::default()).expect("encodes");
        value["levels"]["anger"] = serde_json::json!(5.0);
        value["levels"]["calm"] = serde_json::json!(-2.0);

        let state: AffectState = serde_json::from_value(value).expect("decodes");
        assert_eq!(state.get(AffectChannel::Anger), 1.0);
        assert_eq!(state.get(AffectChannel::Calm), 0.0);
    }
}
