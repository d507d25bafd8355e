//! Emotional memory store.
//!
//! Every meaningful exchange leaves a record of how it felt. Records are
//! kept in creation order up to a fixed capacity; once full, the oldest are
//! dropped first. Each record carries a weight that is *derived* from its
//! age and must be refreshed with [`EmotionalMemoryStore::apply_temporal_decay`]
//! before it is trusted. The read methods that sort by weight do this
//! themselves.
//!
//! ```text
//! age  < 24h  → 1.0
//! age  < 7d   → 0.8
//! age  < 30d  → 0.5
//! age ≥ 30d   → 0.3 × (1 − decay_rate)^(whole days past 30)
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MemoryConfig;
use crate::types::{
    AffectChannel, ContextCategory, ContextVisibility, EmotionalImpact, MemoryId, PatternKind,
    days_between, sanitize,
};

const RECENT_WEIGHT: f32 = 1.0;
const WEEK_WEIGHT: f32 = 0.8;
const MONTH_WEIGHT: f32 = 0.5;
const OLD_WEIGHT: f32 = 0.3;

/// Weight of a record `age_days` old.
///
/// Non-increasing in age: every later bucket weighs no more than an
/// earlier one.
#[must_use]
pub fn weight_for_age(age_days: f64, decay_rate: f32) -> f32 {
    let age_days = age_days.max(0.0);
    if age_days < 1.0 {
        RECENT_WEIGHT
    } else if age_days < 7.0 {
        WEEK_WEIGHT
    } else if age_days < 30.0 {
        MONTH_WEIGHT
    } else {
        let days_past = (age_days - 30.0).floor().min(f64::from(i32::MAX));
        #[allow(clippy::cast_possible_truncation)]
        let exponent = days_past as i32;
        OLD_WEIGHT * (1.0 - decay_rate.clamp(0.0, 1.0)).powi(exponent)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One remembered exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMemoryRecord")]
pub struct EmotionalMemoryRecord {
    /// Unique identifier.
    pub id: MemoryId,
    /// How the exchange felt.
    pub impact: EmotionalImpact,
    /// When it happened.
    pub created_at: DateTime<Utc>,
    /// Whether others witnessed it.
    pub visibility: ContextVisibility,
    /// Age-derived weight in [0, 1]. Stale until decay is reapplied.
    pub weight: f32,
    /// Patterns that were active when the record was made.
    pub patterns: Vec<PatternKind>,
}

#[derive(Deserialize)]
struct RawMemoryRecord {
    id: MemoryId,
    impact: EmotionalImpact,
    created_at: DateTime<Utc>,
    visibility: ContextVisibility,
    weight: f32,
    patterns: Vec<PatternKind>,
}

impl From<RawMemoryRecord> for EmotionalMemoryRecord {
    fn from(raw: RawMemoryRecord) -> Self {
        Self {
            id: raw.id,
            impact: raw.impact,
            created_at: raw.created_at,
            visibility: raw.visibility,
            weight: sanitize(raw.weight).clamp(0.0, RECENT_WEIGHT),
            patterns: raw.patterns,
        }
    }
}

impl EmotionalMemoryRecord {
    /// Fractional days between creation and `now`.
    #[must_use]
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        days_between(self.created_at, now)
    }
}

/// Summary of what the store currently holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Records held.
    pub count: usize,
    /// Mean valence across all records, 0.0 when empty.
    pub mean_valence: f32,
    /// Age of the oldest record in days.
    pub oldest_age_days: Option<f64>,
    /// Age of the newest record in days.
    pub newest_age_days: Option<f64>,
    /// Record count per context category.
    pub per_category: BTreeMap<ContextCategory, usize>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Bounded, chronologically ordered store of emotional memories.
///
/// Decoding re-applies the capacity bound, so an oversized snapshot keeps
/// only its newest records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMemoryStore")]
pub struct EmotionalMemoryStore {
    records: Vec<EmotionalMemoryRecord>,
    associations: BTreeMap<ContextCategory, f32>,
    config: MemoryConfig,
}

#[derive(Deserialize)]
struct RawMemoryStore {
    records: Vec<EmotionalMemoryRecord>,
    associations: BTreeMap<ContextCategory, f32>,
    config: MemoryConfig,
}

impl From<RawMemoryStore> for EmotionalMemoryStore {
    fn from(raw: RawMemoryStore) -> Self {
        let mut associations = raw.associations;
        for total in associations.values_mut() {
            *total = sanitize(*total);
        }
        let mut store = Self {
            records: raw.records,
            associations,
            config: raw.config,
        };
        store.prune();
        store
    }
}

impl EmotionalMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            records: Vec::new(),
            associations: BTreeMap::new(),
            config,
        }
    }

    /// Create an empty store with the given capacity and default decay.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(MemoryConfig {
            capacity,
            ..MemoryConfig::default()
        })
    }

    /// Records held, in chronological order.
    #[must_use]
    pub fn records(&self) -> &[EmotionalMemoryRecord] {
        &self.records
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum records retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Remember an exchange. Returns the new record's ID.
    ///
    /// The impact's valence is added to the running total for its category.
    /// If the store is now over capacity, the oldest records are dropped.
    pub fn store(
        &mut self,
        impact: EmotionalImpact,
        visibility: ContextVisibility,
        patterns: impl IntoIterator<Item = PatternKind>,
        at: DateTime<Utc>,
    ) -> MemoryId {
        let id = MemoryId::new();
        *self.associations.entry(impact.category()).or_insert(0.0) += impact.valence();
        self.records.push(EmotionalMemoryRecord {
            id,
            impact,
            created_at: at,
            visibility,
            weight: RECENT_WEIGHT,
            patterns: patterns.into_iter().collect(),
        });
        self.prune();
        id
    }

    fn prune(&mut self) {
        let capacity = self.config.capacity;
        if self.records.len() <= capacity {
            return;
        }
        // Stable: equal timestamps keep insertion order.
        self.records.sort_by_key(|r| r.created_at);
        let excess = self.records.len() - capacity;
        self.records.drain(..excess);
        debug!(removed = excess, capacity, "Pruned oldest emotional memories");
    }

    /// Recompute every record's weight from its age at `now`. Idempotent.
    pub fn apply_temporal_decay(&mut self, now: DateTime<Utc>) {
        let rate = self.config.decay_rate;
        for record in &mut self.records {
            record.weight = weight_for_age(record.age_days(now), rate);
        }
    }

    /// Records matching the optional filters, heaviest first, at most `limit`.
    /// Weights are refreshed at `now` first.
    pub fn recall(
        &mut self,
        visibility: Option<ContextVisibility>,
        category: Option<ContextCategory>,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<&EmotionalMemoryRecord> {
        self.apply_temporal_decay(now);
        let mut hits: Vec<&EmotionalMemoryRecord> = self
            .records
            .iter()
            .filter(|r| visibility.is_none_or(|v| r.visibility == v))
            .filter(|r| category.is_none_or(|c| r.impact.category() == c))
            .collect();
        hits.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.weight)));
        hits.truncate(limit);
        hits
    }

    /// Mean valence of records from the last `days` days, optionally limited
    /// to one category. 0.0 when nothing matches.
    #[must_use]
    pub fn average_valence(
        &self,
        category: Option<ContextCategory>,
        days: f64,
        now: DateTime<Utc>,
    ) -> f32 {
        let valences: Vec<f32> = self
            .records
            .iter()
            .filter(|r| r.created_at <= now && r.age_days(now) <= days)
            .filter(|r| category.is_none_or(|c| r.impact.category() == c))
            .map(|r| r.impact.valence())
            .collect();
        mean(&valences)
    }

    /// Running valence total for a category since the store was created.
    /// Pruning does not subtract from it.
    #[must_use]
    pub fn emotional_association(&self, category: ContextCategory) -> f32 {
        self.associations.get(&category).copied().unwrap_or(0.0)
    }

    /// Records from the last `hours` hours, newest first.
    #[must_use]
    pub fn recent(&self, hours: f64, limit: usize, now: DateTime<Utc>) -> Vec<&EmotionalMemoryRecord> {
        let days = hours / 24.0;
        newest_first(
            self.records
                .iter()
                .filter(|r| r.created_at <= now && r.age_days(now) <= days),
            limit,
        )
    }

    /// Records whose primary channel is `channel`, newest first.
    #[must_use]
    pub fn by_channel(&self, channel: AffectChannel, limit: usize) -> Vec<&EmotionalMemoryRecord> {
        newest_first(
            self.records.iter().filter(|r| r.impact.primary() == channel),
            limit,
        )
    }

    /// Records tagged with `kind`, newest first.
    #[must_use]
    pub fn by_pattern(&self, kind: PatternKind, limit: usize) -> Vec<&EmotionalMemoryRecord> {
        newest_first(
            self.records.iter().filter(|r| r.patterns.contains(&kind)),
            limit,
        )
    }

    /// Drop records older than `days` days. Returns how many were removed.
    pub fn clear_older_than(&mut self, days: f64, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.age_days(now) <= days);
        let removed = before - self.records.len();
        if removed > 0 {
            debug!(removed, days, "Cleared old emotional memories");
        }
        removed
    }

    /// Summary of the store at `now`.
    #[must_use]
    pub fn stats(&self, now: DateTime<Utc>) -> MemoryStats {
        let valences: Vec<f32> = self.records.iter().map(|r| r.impact.valence()).collect();
        let ages = self.records.iter().map(|r| r.age_days(now));

        let mut per_category = BTreeMap::new();
        for record in &self.records {
            *per_category.entry(record.impact.category()).or_insert(0) += 1;
        }

        MemoryStats {
            count: self.records.len(),
            mean_valence: mean(&valences),
            oldest_age_days: ages.clone().max_by_key(|a| OrderedFloat(*a)),
            newest_age_days: ages.min_by_key(|a| OrderedFloat(*a)),
            per_category,
        }
    }
}

fn newest_first<'a>(
    records: impl Iterator<Item = &'a EmotionalMemoryRecord>,
    limit: usize,
) -> Vec<&'a EmotionalMemoryRecord> {
    let mut hits: Vec<_> = records.collect();
    hits.sort_by_key(|r| std::cmp::Reverse(r.created_at));
    hits.truncate(limit);
    hits
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
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

    fn impact(valence: f32, category: ContextCategory) -> EmotionalImpact {
        EmotionalImpact::new(AffectChannel::Hurt, 0.5, valence, category)
    }

    #[test]
    fn store_accumulates_category_totals() {
        let mut store = EmotionalMemoryStore::default();
        store.store(impact(-0.5, ContextCategory::Conflict), ContextVisibility::Private, [], t0());
        store.store(impact(-0.25, ContextCategory::Conflict), ContextVisibility::Public, [], t0());
        store.store(impact(0.75, ContextCategory::Support), ContextVisibility::Private, [], t0());

        assert_eq!(store.len(), 3);
        assert!((store.emotional_association(ContextCategory::Conflict) + 0.75).abs() < 1e-6);
        assert!((store.emotional_association(ContextCategory::Support) - 0.75).abs() < 1e-6);
        assert_eq!(store.emotional_association(ContextCategory::Intimacy), 0.0);
    }

    #[test]
    fn overflow_drops_oldest_first() {
        let mut store = EmotionalMemoryStore::with_capacity(3);
        for day in 0..5 {
            store.store(
                impact(0.1, ContextCategory::Support),
                ContextVisibility::Private,
                [],
                t0() + Duration::days(day),
            );
        }
        assert_eq!(store.len(), 3);
        let first = store.records().first().map(|r| r.created_at);
        assert_eq!(first, Some(t0() + Duration::days(2)));
    }

    #[test]
    fn out_of_order_inserts_still_keep_newest() {
        let mut store = EmotionalMemoryStore::with_capacity(2);
        for day in [5, 1, 3] {
            store.store(
                impact(0.1, ContextCategory::Support),
                ContextVisibility::Private,
                [],
                t0() + Duration::days(day),
            );
        }
        let kept: Vec<_> = store.records().iter().map(|r| r.created_at).collect();
        assert_eq!(kept, vec![t0() + Duration::days(3), t0() + Duration::days(5)]);
    }

    #[test]
    fn age_buckets() {
        assert_eq!(weight_for_age(0.5, 0.05), 1.0);
        assert_eq!(weight_for_age(3.0, 0.05), 0.8);
        assert_eq!(weight_for_age(20.0, 0.05), 0.5);
        assert!((weight_for_age(30.0, 0.05) - 0.3).abs() < 1e-6);
        assert!((weight_for_age(32.5, 0.05) - 0.3 * 0.95 * 0.95).abs() < 1e-6);
    }

    #[test]
    fn decay_is_idempotent() {
        let mut store = EmotionalMemoryStore::default();
        store.store(impact(0.2, ContextCategory::Support), ContextVisibility::Private, [], t0());
        let now = t0() + Duration::days(40);
        store.apply_temporal_decay(now);
        let once = store.records()[0].weight;
        store.apply_temporal_decay(now);
        assert_eq!(store.records()[0].weight, once);
        assert!(once < OLD_WEIGHT);
    }

    #[test]
    fn recall_filters_and_sorts_by_weight() {
        let mut store = EmotionalMemoryStore::default();
        let now = t0() + Duration::days(10);
        store.store(impact(-0.8, ContextCategory::Conflict), ContextVisibility::Public, [], t0());
        store.store(
            impact(-0.3, ContextCategory::Conflict),
            ContextVisibility::Public,
            [],
            now - Duration::hours(2),
        );
        store.store(impact(0.6, ContextCategory::Support), ContextVisibility::Private, [], now);

        let conflict = store.recall(None, Some(ContextCategory::Conflict), 10, now);
        assert_eq!(conflict.len(), 2);
        assert_eq!(conflict[0].weight, 1.0);
        assert_eq!(conflict[1].weight, 0.5);

        let private = store.recall(Some(ContextVisibility::Private), None, 10, now);
        assert_eq!(private.len(), 1);

        assert_eq!(store.recall(None, None, 1, now).len(), 1);
    }

    #[test]
    fn average_valence_respects_window_and_empty() {
        let mut store = EmotionalMemoryStore::default();
        let now = t0() + Duration::days(10);
        assert_eq!(store.average_valence(None, 7.0, now), 0.0);

        store.store(impact(-1.0, ContextCategory::Conflict), ContextVisibility::Private, [], t0());
        store.store(impact(0.4, ContextCategory::Support), ContextVisibility::Private, [], now);
        store.store(impact(0.2, ContextCategory::Conflict), ContextVisibility::Private, [], now);

        assert!((store.average_valence(None, 7.0, now) - 0.3).abs() < 1e-6);
        assert!((store.average_valence(Some(ContextCategory::Conflict), 30.0, now) + 0.4).abs() < 1e-6);
        assert_eq!(store.average_valence(Some(ContextCategory::Intimacy), 30.0, now), 0.0);
    }

    #[test]
    fn lookups_are_newest_first() {
        let mut store = EmotionalMemoryStore::default();
        for hour in 0..4 {
            store.store(
                impact(0.1, ContextCategory::Caregiving),
                ContextVisibility::Private,
                [PatternKind::ConsistentPresence],
                t0() + Duration::hours(hour),
            );
        }
        let now = t0() + Duration::hours(3);
        let recent = store.recent(1.5, 10, now);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].created_at > recent[1].created_at);

        assert_eq!(store.by_channel(AffectChannel::Hurt, 3).len(), 3);
        assert!(store.by_channel(AffectChannel::Anger, 3).is_empty());

        let tagged = store.by_pattern(PatternKind::ConsistentPresence, 10);
        assert_eq!(tagged.len(), 4);
        assert_eq!(tagged[0].created_at, now);
    }

    #[test]
    fn clear_and_stats() {
        let mut store = EmotionalMemoryStore::default();
        let now = t0() + Duration::days(60);
        store.store(impact(-0.5, ContextCategory::Conflict), ContextVisibility::Private, [], t0());
        store.store(impact(0.5, ContextCategory::Intimacy), ContextVisibility::Private, [], now);

        let stats = store.stats(now);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_valence, 0.0);
        assert_eq!(stats.newest_age_days, Some(0.0));
        assert!((stats.oldest_age_days.unwrap_or_default() - 60.0).abs() < 1e-9);
        assert_eq!(stats.per_category.get(&ContextCategory::Conflict), Some(&1));

        assert_eq!(store.clear_older_than(30.0, now), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats(now).oldest_age_days, Some(0.0));
    }

    #[test]
    fn decoding_clamps_weights_and_reapplies_capacity() {
        let mut store = EmotionalMemoryStore::with_capacity(3);
        for day in 0..3 {
            store.store(
                impact(0.2, ContextCategory::Support),
                ContextVisibility::Private,
                [],
                t0() + Duration::days(day),
            );
        }
        let mut value = serde_json::to_value(&store).expect("encodes");
        value["config"]["capacity"] = serde_json::json!(2);
        value["records"][0]["weight"] = serde_json::json!(7.5);
        value["records"][2]["weight"] = serde_json::json!(-1.0);

        let decoded: EmotionalMemoryStore = serde_json::from_value(value).expect("decodes");
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.records()[0].created_at, t0() + Duration::days(1));
        for record in decoded.records() {
            assert!((0.0..=1.0).contains(&record.weight));
        }
    }
}
