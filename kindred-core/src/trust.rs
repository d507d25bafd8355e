//! Trust & resentment dynamics (0–100 scale).
//!
//! Trust builds slowly and erodes fast:
//!
//! ```text
//! applied = delta
//!         × public_multiplier            (public context)
//!         × diminishing^(n-1)            (n-th positive inside the window)
//!         × resentment_impact_factor     (positive, resentment above threshold)
//!         × erosion × resilience         (negative, resilience only at high trust)
//! ```
//!
//! Resentment grows categorically: a recurring pattern adds a fixed large
//! increment, an isolated incident a fixed small one, whatever magnitude the
//! caller asked for. It only drains once goodwill has been shown at least once.
//!
//! Apology bookkeeping tracks, per behavior kind, how much an apology is
//! still worth. Each recurrence of the behavior erodes it; weeks without a
//! recurrence restore it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TrustConfig;
use crate::types::{ActionKind, ContextVisibility, days_between, sanitize, saturating_minutes};

const MAX_SCORE: f32 = 100.0;
/// Trust above which the character always starts exchanges.
const EAGER_INITIATION_TRUST: f32 = 70.0;
/// Trust at or below which the character only rarely starts exchanges.
const RELUCTANT_INITIATION_TRUST: f32 = 40.0;
const RELUCTANT_INITIATION_PROBABILITY: f32 = 0.1;
const FULL_EFFECTIVENESS: f32 = 1.0;

/// How far a character has pulled back from the relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalLevel {
    /// Trust ≥ 50: fully engaged.
    None,
    /// Trust in [40, 50): a little guarded.
    Mild,
    /// Trust in [30, 40): noticeably distant.
    Moderate,
    /// Trust < 30: shut down.
    Severe,
}

impl WithdrawalLevel {
    /// Classify a trust score.
    #[must_use]
    pub fn from_trust(trust: f32) -> Self {
        match trust {
            t if t >= 50.0 => Self::None,
            t if t >= 40.0 => Self::Mild,
            t if t >= 30.0 => Self::Moderate,
            _ => Self::Severe,
        }
    }

    /// Multiplier for how long responses should be.
    #[must_use]
    pub fn response_length_multiplier(self) -> f32 {
        match self {
            Self::None => 1.0,
            Self::Mild => 0.7,
            Self::Moderate => 0.5,
            Self::Severe => 0.3,
        }
    }
}

/// The register an apology was delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApologyKind {
    /// "I'm sorry you feel that way."
    Defensive,
    /// A bare "sorry".
    Generic,
    /// Owns the harm.
    #[default]
    Genuine,
    /// Owns the harm and commits to a concrete change.
    ActionOriented,
}

impl ApologyKind {
    /// How much this register is worth relative to a genuine apology.
    #[must_use]
    pub fn multiplier(self) -> f32 {
        match self {
            Self::Defensive => 0.3,
            Self::Generic => 0.5,
            Self::Genuine => 1.0,
            Self::ActionOriented => 1.5,
        }
    }

    /// Whether the apology counts as sincere.
    #[must_use]
    pub fn is_genuine(self) -> bool {
        matches!(self, Self::Genuine | Self::ActionOriented)
    }
}

/// Apology history for one behavior kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApologyRecord {
    /// Behavior apologized for.
    pub behavior: ActionKind,
    /// When the latest apology was made.
    pub last_apology: DateTime<Utc>,
    /// Whether the latest apology was sincere.
    pub genuine: bool,
    /// Stored effectiveness, never below the configured floor.
    pub effectiveness: f32,
    /// Times the behavior came back after an apology.
    pub recurrences: u32,
    /// Most recent recurrence.
    pub last_recurrence: Option<DateTime<Utc>>,
}

/// Trust and resentment scores plus the bookkeeping that drives them.
///
/// Decoding clamps both scores to 0–100 and every apology effectiveness to
/// [floor, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTrustDynamics")]
pub struct TrustDynamics {
    trust: f32,
    resentment: f32,
    last_positive_action: Option<DateTime<Utc>>,
    window_start: Option<DateTime<Utc>>,
    positives_in_window: u32,
    apologies: BTreeMap<ActionKind, ApologyRecord>,
    config: TrustConfig,
}

#[derive(Deserialize)]
struct RawTrustDynamics {
    trust: f32,
    resentment: f32,
    last_positive_action: Option<DateTime<Utc>>,
    window_start: Option<DateTime<Utc>>,
    positives_in_window: u32,
    apologies: BTreeMap<ActionKind, ApologyRecord>,
    config: TrustConfig,
}

impl From<RawTrustDynamics> for TrustDynamics {
    fn from(raw: RawTrustDynamics) -> Self {
        let floor = raw.config.apology_floor;
        let mut apologies = raw.apologies;
        for record in apologies.values_mut() {
            record.effectiveness = sanitize(record.effectiveness)
                .min(FULL_EFFECTIVENESS)
                .max(floor);
        }
        Self {
            trust: clamp_score(raw.trust),
            resentment: clamp_score(raw.resentment),
            last_positive_action: raw.last_positive_action,
            window_start: raw.window_start,
            positives_in_window: raw.positives_in_window,
            apologies,
            config: raw.config,
        }
    }
}

impl Default for TrustDynamics {
    fn default() -> Self {
        Self::new(TrustConfig::default())
    }
}

impl TrustDynamics {
    /// Start at the configured initial scores (clamped).
    #[must_use]
    pub fn new(config: TrustConfig) -> Self {
        Self {
            trust: clamp_score(config.initial_trust),
            resentment: clamp_score(config.initial_resentment),
            last_positive_action: None,
            window_start: None,
            positives_in_window: 0,
            apologies: BTreeMap::new(),
            config,
        }
    }

    /// Start at explicit scores with default tuning.
    #[must_use]
    pub fn with_scores(trust: f32, resentment: f32) -> Self {
        Self::new(TrustConfig {
            initial_trust: trust,
            initial_resentment: resentment,
            ..TrustConfig::default()
        })
    }

    /// Current trust, 0–100.
    #[must_use]
    pub fn trust(&self) -> f32 {
        self.trust
    }

    /// Current resentment, 0–100.
    #[must_use]
    pub fn resentment(&self) -> f32 {
        self.resentment
    }

    /// Most recent positive trust change, if any was ever recorded.
    #[must_use]
    pub fn last_positive_action(&self) -> Option<DateTime<Utc>> {
        self.last_positive_action
    }

    /// Tuning in effect.
    #[must_use]
    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Trust
    // ------------------------------------------------------------------

    /// Apply a trust change and return the change actually applied after
    /// every modifier and the [0, 100] clamp.
    pub fn update_trust(
        &mut self,
        delta: f32,
        visibility: ContextVisibility,
        at: DateTime<Utc>,
    ) -> f32 {
        let mut delta = sanitize(delta);
        if visibility == ContextVisibility::Public {
            delta *= self.config.public_multiplier;
        }

        if delta > 0.0 {
            if self.within_diminishing_window(at) {
                self.positives_in_window += 1;
                let repeats = self.positives_in_window.saturating_sub(1);
                delta *= self
                    .config
                    .diminishing_multiplier
                    .powi(i32::try_from(repeats).unwrap_or(i32::MAX));
            } else {
                self.window_start = Some(at);
                self.positives_in_window = 1;
            }

            if self.resentment > self.config.resentment_impact_threshold {
                delta *= self.config.resentment_impact_factor;
            }
            self.last_positive_action = Some(at);
        } else if delta < 0.0 {
            delta *= self.config.erosion_multiplier;
            if self.trust > self.config.high_trust_threshold {
                delta *= self.config.high_trust_resilience;
            }
        }

        let before = self.trust;
        let level_before = self.withdrawal_level();
        self.trust = clamp_score(before + delta);
        let level_after = self.withdrawal_level();

        if level_before != level_after {
            info!(
                from = ?level_before,
                to = ?level_after,
                trust = self.trust,
                "Withdrawal level changed"
            );
        }
        debug!(requested = delta, applied = self.trust - before, "Trust updated");

        self.trust - before
    }

    fn within_diminishing_window(&self, at: DateTime<Utc>) -> bool {
        let window = saturating_minutes(self.config.diminishing_window_minutes);
        self.window_start
            .is_some_and(|start| at >= start && at - start < window)
    }

    // ------------------------------------------------------------------
    // Resentment
    // ------------------------------------------------------------------

    /// Apply a resentment change and return the change actually applied.
    ///
    /// Any positive `delta` is replaced by the fixed pattern or incident
    /// increment; only its sign matters. Negative deltas apply as given.
    pub fn update_resentment(&mut self, delta: f32, is_pattern: bool) -> f32 {
        let mut delta = sanitize(delta);
        if delta > 0.0 {
            delta = if is_pattern {
                self.config.pattern_resentment
            } else {
                self.config.incident_resentment
            };
        }

        let before = self.resentment;
        self.resentment = clamp_score(before + delta);
        self.resentment - before
    }

    /// Drain resentment linearly over `days_elapsed`. Does nothing until at
    /// least one positive trust change has been recorded. Returns the amount
    /// removed.
    pub fn apply_resentment_decay(&mut self, days_elapsed: f32) -> f32 {
        if self.last_positive_action.is_none() {
            return 0.0;
        }
        let decay = self.config.resentment_decay_per_day * sanitize(days_elapsed).max(0.0);
        let before = self.resentment;
        self.resentment = clamp_score(before - decay);
        debug!(removed = before - self.resentment, "Resentment decayed");
        before - self.resentment
    }

    // ------------------------------------------------------------------
    // Derived states
    // ------------------------------------------------------------------

    /// Whether trust has fallen below the withdrawal threshold.
    #[must_use]
    pub fn is_in_withdrawal(&self) -> bool {
        self.withdrawal_level() != WithdrawalLevel::None
    }

    /// Current withdrawal band.
    #[must_use]
    pub fn withdrawal_level(&self) -> WithdrawalLevel {
        WithdrawalLevel::from_trust(self.trust)
    }

    /// Multiplier for response length, 0.3 (severe) to 1.0 (none).
    #[must_use]
    pub fn response_length_multiplier(&self) -> f32 {
        self.withdrawal_level().response_length_multiplier()
    }

    /// Probability of the character starting an exchange on their own.
    #[must_use]
    pub fn initiation_probability(&self) -> f32 {
        match self.trust {
            t if t > EAGER_INITIATION_TRUST => 1.0,
            t if t > RELUCTANT_INITIATION_TRUST => {
                (t - RELUCTANT_INITIATION_TRUST)
                    / (EAGER_INITIATION_TRUST - RELUCTANT_INITIATION_TRUST)
            }
            _ => RELUCTANT_INITIATION_PROBABILITY,
        }
    }

    /// Willingness to cooperate given current resentment.
    #[must_use]
    pub fn cooperation_level(&self) -> f32 {
        match self.resentment {
            r if r < 30.0 => 1.0,
            r if r < 50.0 => 0.7,
            r if r < 70.0 => 0.4,
            _ => 0.2,
        }
    }

    // ------------------------------------------------------------------
    // Apologies
    // ------------------------------------------------------------------

    /// Record an apology for `behavior`, creating its record at full
    /// effectiveness on first use.
    pub fn record_apology(&mut self, behavior: ActionKind, kind: ApologyKind, at: DateTime<Utc>) {
        self.apologies
            .entry(behavior)
            .and_modify(|record| {
                record.last_apology = at;
                record.genuine = kind.is_genuine();
            })
            .or_insert_with(|| ApologyRecord {
                behavior,
                last_apology: at,
                genuine: kind.is_genuine(),
                effectiveness: FULL_EFFECTIVENESS,
                recurrences: 0,
                last_recurrence: None,
            });
    }

    /// Record that an apologized-for behavior happened again. Any recovery
    /// earned since the previous recurrence is banked first, then the fixed
    /// per-recurrence penalty is taken, bounded by the floor. Behaviors never
    /// apologized for are ignored.
    pub fn record_behavior_recurrence(&mut self, behavior: ActionKind, at: DateTime<Utc>) {
        let recovery = self.config.apology_recovery_per_week;
        let penalty = self.config.apology_decay_per_recurrence;
        let floor = self.config.apology_floor;

        let Some(record) = self.apologies.get_mut(&behavior) else {
            debug!(?behavior, "Recurrence without a prior apology ignored");
            return;
        };

        let banked = recovered_effectiveness(record, recovery, at);
        record.effectiveness = (banked - penalty).max(floor);
        record.recurrences += 1;
        record.last_recurrence = Some(at);
    }

    /// What an apology of `kind` for `behavior` is worth at `now`.
    ///
    /// With no history this is just the kind's multiplier. Otherwise the
    /// stored effectiveness, plus recovery for each full week since the last
    /// recurrence (capped at full effectiveness), times the multiplier.
    #[must_use]
    pub fn apology_effectiveness(
        &self,
        behavior: ActionKind,
        kind: ApologyKind,
        now: DateTime<Utc>,
    ) -> f32 {
        match self.apologies.get(&behavior) {
            None => kind.multiplier(),
            Some(record) => {
                recovered_effectiveness(record, self.config.apology_recovery_per_week, now)
                    * kind.multiplier()
            }
        }
    }

    /// Apology record for a behavior, if one exists.
    #[must_use]
    pub fn apology_record(&self, behavior: ActionKind) -> Option<&ApologyRecord> {
        self.apologies.get(&behavior)
    }
}

fn recovered_effectiveness(record: &ApologyRecord, per_week: f32, now: DateTime<Utc>) -> f32 {
    let Some(last) = record.last_recurrence else {
        return record.effectiveness;
    };
    let weeks = (days_between(last, now) / 7.0).floor();
    if weeks < 1.0 {
        return record.effectiveness;
    }
    (record.effectiveness + per_week * weeks as f32).min(FULL_EFFECTIVENESS)
}

fn clamp_score(value: f32) -> f32 {
    sanitize(value).clamp(0.0, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn initial_scores_are_clamped() {
        let dynamics = TrustDynamics::with_scores(150.0, -20.0);
        assert_eq!(dynamics.trust(), 100.0);
        assert_eq!(dynamics.resentment(), 0.0);
    }

    #[test]
    fn public_context_doubles_delta() {
        let mut dynamics = TrustDynamics::default();
        let applied = dynamics.update_trust(2.0, ContextVisibility::Public, t0());
        assert!((applied - 4.0).abs() < 1e-5);
    }

    #[test]
    fn trust_never_leaves_range() {
        let mut dynamics = TrustDynamics::with_scores(98.0, 0.0);
        let applied = dynamics.update_trust(50.0, ContextVisibility::Private, t0());
        assert_eq!(dynamics.trust(), 100.0);
        assert!((applied - 2.0).abs() < 1e-5);

        let mut dynamics = TrustDynamics::with_scores(3.0, 0.0);
        dynamics.update_trust(-50.0, ContextVisibility::Public, t0());
        assert_eq!(dynamics.trust(), 0.0);
    }

    #[test]
    fn rapid_positives_diminish_geometrically() {
        let mut dynamics = TrustDynamics::default();
        let first = dynamics.update_trust(2.0, ContextVisibility::Private, t0());
        let second =
            dynamics.update_trust(2.0, ContextVisibility::Private, t0() + Duration::minutes(10));
        let third =
            dynamics.update_trust(2.0, ContextVisibility::Private, t0() + Duration::minutes(20));
        assert!((first - 2.0).abs() < 1e-5);
        assert!((second - 1.0).abs() < 1e-5);
        assert!((third - 0.5).abs() < 1e-5);
    }

    #[test]
    fn positives_outside_window_are_full_strength() {
        let mut dynamics = TrustDynamics::default();
        dynamics.update_trust(2.0, ContextVisibility::Private, t0());
        let later =
            dynamics.update_trust(2.0, ContextVisibility::Private, t0() + Duration::hours(2));
        assert!((later - 2.0).abs() < 1e-5);
    }

    #[test]
    fn high_resentment_halves_recovery() {
        let mut dynamics = TrustDynamics::with_scores(40.0, 60.0);
        let applied = dynamics.update_trust(2.0, ContextVisibility::Private, t0());
        assert!((applied - 1.0).abs() < 1e-5);
    }

    #[test]
    fn erosion_is_double_and_softened_at_high_trust() {
        let mut mid = TrustDynamics::with_scores(50.0, 0.0);
        let mut high = TrustDynamics::with_scores(80.0, 0.0);
        let mid_change = mid.update_trust(-4.0, ContextVisibility::Private, t0());
        let high_change = high.update_trust(-4.0, ContextVisibility::Private, t0());
        assert!((mid_change + 8.0).abs() < 1e-5);
        assert!((high_change + 5.6).abs() < 1e-4);
    }

    #[test]
    fn resentment_increments_are_categorical() {
        let mut dynamics = TrustDynamics::with_scores(60.0, 0.0);
        assert!((dynamics.update_resentment(0.01, true) - 3.0).abs() < 1e-5);
        assert!((dynamics.update_resentment(40.0, false) - 0.5).abs() < 1e-5);
        assert!((dynamics.update_resentment(-1.5, false) + 1.5).abs() < 1e-5);
        assert_eq!(dynamics.update_resentment(0.0, true), 0.0);
    }

    #[test]
    fn resentment_decay_requires_goodwill() {
        let mut dynamics = TrustDynamics::with_scores(60.0, 20.0);
        assert_eq!(dynamics.apply_resentment_decay(10.0), 0.0);
        assert_eq!(dynamics.resentment(), 20.0);

        dynamics.update_trust(1.0, ContextVisibility::Private, t0());
        let removed = dynamics.apply_resentment_decay(4.0);
        assert!((removed - 2.0).abs() < 1e-5);
        assert!((dynamics.resentment() - 18.0).abs() < 1e-5);

        dynamics.apply_resentment_decay(1_000.0);
        assert_eq!(dynamics.resentment(), 0.0);
    }

    #[test]
    fn withdrawal_bands_at_boundaries() {
        assert_eq!(WithdrawalLevel::from_trust(50.0), WithdrawalLevel::None);
        assert_eq!(WithdrawalLevel::from_trust(49.99), WithdrawalLevel::Mild);
        assert_eq!(WithdrawalLevel::from_trust(40.0), WithdrawalLevel::Mild);
        assert_eq!(WithdrawalLevel::from_trust(39.99), WithdrawalLevel::Moderate);
        assert_eq!(WithdrawalLevel::from_trust(30.0), WithdrawalLevel::Moderate);
        assert_eq!(WithdrawalLevel::from_trust(29.99), WithdrawalLevel::Severe);
        assert_eq!(WithdrawalLevel::from_trust(0.0), WithdrawalLevel::Severe);
    }

    #[test]
    fn derived_levels_follow_scores() {
        let engaged = TrustDynamics::with_scores(80.0, 10.0);
        assert_eq!(engaged.response_length_multiplier(), 1.0);
        assert_eq!(engaged.initiation_probability(), 1.0);
        assert_eq!(engaged.cooperation_level(), 1.0);

        let strained = TrustDynamics::with_scores(55.0, 55.0);
        assert!((strained.initiation_probability() - 0.5).abs() < 1e-5);
        assert_eq!(strained.cooperation_level(), 0.4);

        let shut = TrustDynamics::with_scores(20.0, 90.0);
        assert!(shut.is_in_withdrawal());
        assert_eq!(shut.response_length_multiplier(), 0.3);
        assert_eq!(shut.initiation_probability(), 0.1);
        assert_eq!(shut.cooperation_level(), 0.2);
    }

    #[test]
    fn initiation_probability_band_edges() {
        assert_eq!(TrustDynamics::with_scores(70.0, 0.0).initiation_probability(), 1.0);
        assert_eq!(TrustDynamics::with_scores(70.1, 0.0).initiation_probability(), 1.0);
        assert_eq!(TrustDynamics::with_scores(40.0, 0.0).initiation_probability(), 0.1);
        let just_above = TrustDynamics::with_scores(41.0, 0.0).initiation_probability();
        assert!((just_above - 1.0 / 30.0).abs() < 1e-5);
    }

    #[test]
    fn apology_without_record_is_type_multiplier() {
        let dynamics = TrustDynamics::default();
        let value =
            dynamics.apology_effectiveness(ActionKind::ControlTaking, ApologyKind::Defensive, t0());
        assert!((value - 0.3).abs() < 1e-6);
    }

    #[test]
    fn recurrences_erode_down_to_floor() {
        let mut dynamics = TrustDynamics::default();
        let behavior = ActionKind::ConflictAvoid;
        dynamics.record_apology(behavior, ApologyKind::Genuine, t0());

        let mut previous =
            dynamics.apology_effectiveness(behavior, ApologyKind::Genuine, t0());
        for _ in 0..4 {
            dynamics.record_behavior_recurrence(behavior, t0());
            let now = dynamics.apology_effectiveness(behavior, ApologyKind::Genuine, t0());
            assert!(now < previous);
            previous = now;
        }
        for _ in 0..10 {
            dynamics.record_behavior_recurrence(behavior, t0());
        }
        let floored = dynamics.apology_effectiveness(behavior, ApologyKind::Genuine, t0());
        assert!((floored - 0.1).abs() < 1e-5);
        assert_eq!(
            dynamics.apology_record(behavior).map(|r| r.recurrences),
            Some(14)
        );
    }

    #[test]
    fn weeks_without_recurrence_restore_effectiveness() {
        let mut dynamics = TrustDynamics::default();
        let behavior = ActionKind::CaregivingAbsent;
        dynamics.record_apology(behavior, ApologyKind::Genuine, t0());
        dynamics.record_behavior_recurrence(behavior, t0());
        dynamics.record_behavior_recurrence(behavior, t0());

        let reduced = dynamics.apology_effectiveness(behavior, ApologyKind::Genuine, t0());
        let six_days =
            dynamics.apology_effectiveness(behavior, ApologyKind::Genuine, t0() + Duration::days(6));
        let three_weeks = dynamics.apology_effectiveness(
            behavior,
            ApologyKind::Genuine,
            t0() + Duration::weeks(3),
        );
        assert!((reduced - 0.6).abs() < 1e-5);
        assert_eq!(six_days, reduced);
        assert!((three_weeks - 0.9).abs() < 1e-5);

        // Reading is side-effect free.
        let again = dynamics.apology_effectiveness(
            behavior,
            ApologyKind::Genuine,
            t0() + Duration::weeks(3),
        );
        assert_eq!(again, three_weeks);
    }

    #[test]
    fn apology_kinds_rank_as_expected() {
        let ranks: Vec<f32> = [
            ApologyKind::Defensive,
            ApologyKind::Generic,
            ApologyKind::Genuine,
            ApologyKind::ActionOriented,
        ]
        .iter()
        .map(|k| k.multiplier())
        .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        assert!(ApologyKind::ActionOriented.is_genuine());
        assert!(!ApologyKind::Generic.is_genuine());
    }

    #[test]
    fn recurrence_without_apology_is_ignored() {
        let mut dynamics = TrustDynamics::default();
        dynamics.record_behavior_recurrence(ActionKind::ControlTaking, t0());
        assert!(dynamics.apology_record(ActionKind::ControlTaking).is_none());
    }

    #[test]
    fn decoding_clamps_scores_and_apology_effectiveness() {
        let mut dynamics = TrustDynamics::default();
        dynamics.record_apology(ActionKind::ConflictAvoid, ApologyKind::Genuine, t0());
        let mut value = serde_json::to_value(&dynamics).expect("encodes");
        value["trust"] = serde_json::json!(500.0);
        value["resentment"] = serde_json::json!(-3.0);
        value["apologies"]["conflict_avoid"]["effectiveness"] = serde_json::json!(12.0);

        let decoded: TrustDynamics = serde_json::from_value(value).expect("decodes");
        assert_eq!(decoded.trust(), 100.0);
        assert_eq!(decoded.resentment(), 0.0);
        let record = decoded
            .apology_record(ActionKind::ConflictAvoid)
            .expect("record survives");
        assert_eq!(record.effectiveness, 1.0);
    }

    #[test]
    fn extreme_diminishing_window_saturates() {
        let mut dynamics = TrustDynamics::new(TrustConfig {
            diminishing_window_minutes: i64::MAX,
            ..TrustConfig::default()
        });
        dynamics.update_trust(2.0, ContextVisibility::Private, t0());
        let second =
            dynamics.update_trust(2.0, ContextVisibility::Private, t0() + Duration::days(400));
        assert!((second - 1.0).abs() < 1e-5);
    }
}
