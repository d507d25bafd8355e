//! Behavior pattern tracking.
//!
//! The tracker keeps an append-only log of the partner's actions and turns
//! repeated behavior into weighted patterns:
//!
//! - **Detection**: an action kind that maps to a pattern and occurs at
//!   least `min_occurrences` times inside the window becomes a detected
//!   pattern with `frequency = occurrences / window_days`.
//! - **Temporal decay**: a detected pattern's weight is its base weight
//!   scaled by `(1 − decay_rate)^(days since last seen)`. The base weight is
//!   never overwritten by decay, so re-running detection at the same `now`
//!   gives the same answer.
//! - **Breaking**: a streak of clearly positive actions, or an explicit
//!   [`PatternTracker::break_pattern`], multiplies the base weight down.
//!
//! A pattern whose weight falls below the floor is forgotten: it leaves the
//! detected set, and the actions that built it no longer count toward it.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PatternConfig;
use crate::types::{
    ActionKind, ContextVisibility, PatternKind, sanitize, saturating_days, whole_days_between,
    window_start,
};

const FRESH_WEIGHT: f32 = 1.0;

// ---------------------------------------------------------------------------
// Actions & patterns
// ---------------------------------------------------------------------------

/// One categorized thing the partner did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBehaviorAction")]
pub struct BehaviorAction {
    /// What kind of behavior it was.
    pub kind: ActionKind,
    /// Whether others saw it.
    pub visibility: ContextVisibility,
    /// How it felt, -1.0 to 1.0.
    pub valence: f32,
    /// When it happened.
    pub at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawBehaviorAction {
    kind: ActionKind,
    visibility: ContextVisibility,
    valence: f32,
    at: DateTime<Utc>,
}

impl From<RawBehaviorAction> for BehaviorAction {
    fn from(raw: RawBehaviorAction) -> Self {
        Self::new(raw.kind, raw.visibility, raw.valence, raw.at)
    }
}

impl BehaviorAction {
    /// Build an action, clamping valence to [-1, 1].
    #[must_use]
    pub fn new(
        kind: ActionKind,
        visibility: ContextVisibility,
        valence: f32,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            visibility,
            valence: sanitize(valence).clamp(-1.0, 1.0),
            at,
        }
    }
}

/// A recurring behavior the tracker has recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    /// Which pattern.
    pub kind: PatternKind,
    /// Matching actions from the most recent detection window.
    pub actions: Vec<BehaviorAction>,
    /// Occurrences per day over that window.
    pub frequency: f32,
    /// Effective weight after decay, in [floor, 1].
    pub weight: f32,
    /// Earliest occurrence seen since the pattern was recognized.
    pub first_seen: DateTime<Utc>,
    /// Latest occurrence.
    pub last_seen: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Action log plus the patterns derived from it.
///
/// Decoding clamps every stored weight to [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPatternTracker")]
pub struct PatternTracker {
    actions: Vec<BehaviorAction>,
    base_weights: BTreeMap<PatternKind, f32>,
    detected: BTreeMap<PatternKind, DetectedPattern>,
    /// Actions at or before this instant no longer count toward the pattern.
    forgotten: BTreeMap<PatternKind, DateTime<Utc>>,
    positive_streak: u32,
    config: PatternConfig,
}

#[derive(Deserialize)]
struct RawPatternTracker {
    actions: Vec<BehaviorAction>,
    base_weights: BTreeMap<PatternKind, f32>,
    detected: BTreeMap<PatternKind, DetectedPattern>,
    forgotten: BTreeMap<PatternKind, DateTime<Utc>>,
    positive_streak: u32,
    config: PatternConfig,
}

impl From<RawPatternTracker> for PatternTracker {
    fn from(raw: RawPatternTracker) -> Self {
        let mut base_weights = raw.base_weights;
        for weight in base_weights.values_mut() {
            *weight = clamp_weight(*weight);
        }
        let mut detected = raw.detected;
        for pattern in detected.values_mut() {
            pattern.weight = clamp_weight(pattern.weight);
        }
        Self {
            actions: raw.actions,
            base_weights,
            detected,
            forgotten: raw.forgotten,
            positive_streak: raw.positive_streak,
            config: raw.config,
        }
    }
}

fn clamp_weight(weight: f32) -> f32 {
    sanitize(weight).clamp(0.0, FRESH_WEIGHT)
}

impl PatternTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Every recorded action, in recording order.
    #[must_use]
    pub fn actions(&self) -> &[BehaviorAction] {
        &self.actions
    }

    /// Consecutive clearly-positive actions so far.
    #[must_use]
    pub fn positive_streak(&self) -> u32 {
        self.positive_streak
    }

    /// Tuning in effect.
    #[must_use]
    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Log an action and update the positive streak. Once the streak reaches
    /// the break threshold, every clearly-positive action wears all negative
    /// patterns down.
    pub fn record_action(&mut self, action: BehaviorAction) {
        let positive = action.valence > self.config.positive_valence_threshold;
        self.actions.push(action);

        if !positive {
            self.positive_streak = 0;
            return;
        }

        self.positive_streak += 1;
        if self.positive_streak >= self.config.break_threshold {
            let factor = self.config.streak_break_factor;
            let negatives: Vec<PatternKind> = self
                .base_weights
                .keys()
                .copied()
                .filter(|k| k.is_negative())
                .collect();
            for kind in &negatives {
                self.scale_base_weight(*kind, factor);
            }
            if !negatives.is_empty() {
                info!(
                    streak = self.positive_streak,
                    patterns = negatives.len(),
                    "Positive streak wearing down negative patterns"
                );
            }
        }
    }

    /// Find patterns among actions from the last `window` (the configured
    /// window when `None`), then decay every detected pattern's weight to
    /// `now`. Returns the patterns found in this window that survived decay.
    pub fn detect_patterns(
        &mut self,
        window: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Vec<DetectedPattern> {
        let window = window.unwrap_or_else(|| saturating_days(self.config.window_days));
        let cutoff = window_start(now, window);
        #[allow(clippy::cast_precision_loss)]
        let window_days = window.num_days().max(1) as f32;

        let mut grouped: BTreeMap<PatternKind, Vec<BehaviorAction>> = BTreeMap::new();
        for action in self.actions.iter().filter(|a| a.at >= cutoff) {
            let Some(kind) = action.kind.pattern() else {
                continue;
            };
            if self.forgotten.get(&kind).is_some_and(|&f| action.at <= f) {
                continue;
            }
            grouped.entry(kind).or_default().push(action.clone());
        }

        let mut found = Vec::new();
        for (kind, actions) in grouped {
            if actions.len() < self.config.min_occurrences {
                continue;
            }
            let (Some(first), Some(last)) = (
                actions.iter().map(|a| a.at).min(),
                actions.iter().map(|a| a.at).max(),
            ) else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let frequency = actions.len() as f32 / window_days;
            let base = *self.base_weights.entry(kind).or_insert(FRESH_WEIGHT);

            self.detected
                .entry(kind)
                .and_modify(|p| {
                    p.frequency = frequency;
                    p.first_seen = p.first_seen.min(first);
                    p.last_seen = last;
                    p.actions.clone_from(&actions);
                })
                .or_insert_with(|| DetectedPattern {
                    kind,
                    actions,
                    frequency,
                    weight: base,
                    first_seen: first,
                    last_seen: last,
                });
            found.push(kind);
        }

        self.apply_temporal_decay(now);

        debug!(found = found.len(), tracked = self.detected.len(), "Pattern detection");
        found
            .into_iter()
            .filter_map(|k| self.detected.get(&k).cloned())
            .collect()
    }

    fn apply_temporal_decay(&mut self, now: DateTime<Utc>) {
        let retention = 1.0 - self.config.decay_rate.clamp(0.0, 1.0);
        let mut expired = Vec::new();
        for (kind, pattern) in &mut self.detected {
            let base = self.base_weights.get(kind).copied().unwrap_or(FRESH_WEIGHT);
            let days = whole_days_between(pattern.last_seen, now).min(i64::from(i32::MAX));
            let exponent = i32::try_from(days).unwrap_or(i32::MAX);
            pattern.weight = base * retention.powi(exponent);
            if pattern.weight < self.config.weight_floor {
                expired.push(*kind);
            }
        }
        for kind in expired {
            self.forget(kind);
        }
    }

    /// Explicitly weaken a pattern, e.g. after the partner visibly changed.
    /// Unknown patterns are ignored.
    pub fn break_pattern(&mut self, kind: PatternKind) {
        self.scale_base_weight(kind, self.config.explicit_break_factor);
    }

    fn scale_base_weight(&mut self, kind: PatternKind, factor: f32) {
        let Some(base) = self.base_weights.get_mut(&kind) else {
            return;
        };
        *base *= factor;
        let floor = self.config.weight_floor;
        let mut expired = *base < floor;
        if let Some(pattern) = self.detected.get_mut(&kind) {
            pattern.weight *= factor;
            expired |= pattern.weight < floor;
        }
        if expired {
            self.forget(kind);
        }
    }

    fn forget(&mut self, kind: PatternKind) {
        self.base_weights.remove(&kind);
        self.detected.remove(&kind);
        let latest = self
            .actions
            .iter()
            .filter(|a| a.kind.pattern() == Some(kind))
            .map(|a| a.at)
            .max();
        if let Some(latest) = latest {
            self.forgotten.insert(kind, latest);
        }
        debug!(?kind, "Pattern forgotten");
    }

    /// Current weight of a pattern: its effective weight while detected,
    /// its base weight if known but not currently detected, else 0.0.
    #[must_use]
    pub fn pattern_weight(&self, kind: PatternKind) -> f32 {
        self.detected
            .get(&kind)
            .map(|p| p.weight)
            .or_else(|| self.base_weights.get(&kind).copied())
            .unwrap_or(0.0)
    }

    /// Occurrences per day of a detected pattern, 0.0 when not detected.
    #[must_use]
    pub fn pattern_frequency(&self, kind: PatternKind) -> f32 {
        self.detected.get(&kind).map_or(0.0, |p| p.frequency)
    }

    /// Every currently detected pattern.
    pub fn patterns(&self) -> impl Iterator<Item = &DetectedPattern> {
        self.detected.values()
    }

    /// Heaviest currently detected negative pattern, if any.
    #[must_use]
    pub fn strongest_negative(&self) -> Option<&DetectedPattern> {
        self.detected
            .values()
            .filter(|p| p.kind.is_negative())
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
    }

    /// Drop logged actions before `before`. With `None`, reset the tracker
    /// entirely (actions, patterns, weights and streak).
    pub fn clear_history(&mut self, before: Option<DateTime<Utc>>) {
        match before {
            Some(cutoff) => self.actions.retain(|a| a.at >= cutoff),
            None => {
                self.actions.clear();
                self.base_weights.clear();
                self.detected.clear();
                self.forgotten.clear();
                self.positive_streak = 0;
            }
        }
    }
}
